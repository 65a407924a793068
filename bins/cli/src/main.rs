//! CLI binary entrypoint.

mod commands;
mod error;
mod format;

use clap::{Parser, Subcommand};
use commands::{
    CheckCommandInput, ConfigShowFormat, run_check, run_config_check, run_config_show,
    run_format_phone, run_info,
};
use error::{CliError, ExitCode};
use format::{OutputArgs, OutputMode};
use quick_evac_infra::InfraError;
use quick_evac_shared::{ErrorKind, is_secret_key, redact_if_secret};
use std::collections::BTreeMap;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

const TRACE_ENV: &str = "QEVAC_TRACE";

#[derive(Debug, Parser)]
#[command(
    name = "qevac",
    version,
    about = "Check whether your location is inside an evacuation zone",
    long_about = None
)]
struct Cli {
    #[command(flatten)]
    output: OutputArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Show build and version details.
    Info,
    /// Run one location check.
    Check {
        /// Phone number in any common format.
        #[arg(long)]
        phone: String,
        /// Device latitude.
        #[arg(long, allow_negative_numbers = true)]
        lat: Option<f64>,
        /// Device longitude.
        #[arg(long, allow_negative_numbers = true)]
        lon: Option<f64>,
        /// Behave as if the location permission was refused.
        #[arg(long, conflicts_with_all = ["lat", "lon"])]
        deny_location: bool,
        /// Optional config file path (JSON/TOML).
        #[arg(long)]
        config: Option<PathBuf>,
        /// Optional JSON overrides (partial config).
        #[arg(long)]
        overrides_json: Option<String>,
        /// Zone-check service base URL override.
        #[arg(long)]
        api_base_url: Option<String>,
    },
    /// Normalize a phone number and print its display forms.
    FormatPhone {
        /// Phone number in any common format.
        #[arg(value_name = "PHONE")]
        phone: String,
    },
    /// Config-related commands.
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Debug, Subcommand)]
enum ConfigCommands {
    /// Validate config loading, merging, and normalization.
    Check {
        /// Optional config file path (JSON/TOML).
        #[arg(long)]
        path: Option<PathBuf>,
        /// Optional JSON overrides (partial config).
        #[arg(long)]
        overrides_json: Option<String>,
    },
    /// Show the effective config after applying overrides.
    Show {
        /// Optional config file path (JSON/TOML).
        #[arg(long)]
        path: Option<PathBuf>,
        /// Optional JSON overrides (partial config).
        #[arg(long)]
        overrides_json: Option<String>,
        /// Serialization of the printed config.
        #[arg(long, value_enum, default_value = "json")]
        format: ConfigShowFormat,
    },
}

pub(crate) struct CliOutput {
    stdout: String,
    stderr: String,
    exit_code: ExitCode,
}

fn main() -> std::process::ExitCode {
    init_tracing();
    let cli = Cli::parse();
    let mode = OutputMode::from_args(&cli.output);
    tracing::debug!(format = ?mode.format, "dispatching command");

    match run(&cli.command, mode) {
        Ok(output) => match write_output(&output) {
            Ok(()) => std::process::ExitCode::from(output.exit_code.as_u8()),
            Err(error) => exit_with_error(&error),
        },
        Err(error) => exit_with_error(&error),
    }
}

fn init_tracing() {
    let Ok(directives) = std::env::var(TRACE_ENV) else {
        return;
    };
    let filter = EnvFilter::try_new(directives).unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(io::stderr),
        )
        .try_init();
}

fn exit_with_error(error: &CliError) -> std::process::ExitCode {
    let _ = writeln!(io::stderr(), "error: {error}");
    std::process::ExitCode::from(error.exit_code().as_u8())
}

fn run(command: &Commands, mode: OutputMode) -> Result<CliOutput, CliError> {
    match command {
        Commands::Info => run_info(mode),
        Commands::Check {
            phone,
            lat,
            lon,
            deny_location,
            config,
            overrides_json,
            api_base_url,
        } => {
            let overrides =
                build_overrides_json(overrides_json.as_deref(), api_base_url.as_deref())?;
            run_check(
                mode,
                CheckCommandInput {
                    phone,
                    latitude: *lat,
                    longitude: *lon,
                    deny_location: *deny_location,
                    config_path: config.as_deref(),
                    overrides_json: overrides.as_deref(),
                },
            )
        },
        Commands::FormatPhone { phone } => run_format_phone(mode, phone),
        Commands::Config { command } => match command {
            ConfigCommands::Check {
                path,
                overrides_json,
            } => run_config_check(mode, path.as_deref(), overrides_json.as_deref()),
            ConfigCommands::Show {
                path,
                overrides_json,
                format,
            } => run_config_show(mode, path.as_deref(), overrides_json.as_deref(), *format),
        },
    }
}

fn build_overrides_json(
    base: Option<&str>,
    api_base_url: Option<&str>,
) -> Result<Option<String>, CliError> {
    let Some(api_base_url) = api_base_url else {
        return Ok(base.map(str::to_owned));
    };

    let mut root = match base {
        Some(input) => serde_json::from_str::<serde_json::Value>(input)
            .map_err(|error| CliError::InvalidInput(format!("invalid overrides JSON: {error}")))?,
        None => serde_json::json!({}),
    };
    let Some(root_map) = root.as_object_mut() else {
        return Err(CliError::InvalidInput(
            "overrides JSON must be an object".to_owned(),
        ));
    };
    let api = root_map
        .entry("api")
        .or_insert_with(|| serde_json::json!({}));
    let Some(api_map) = api.as_object_mut() else {
        return Err(CliError::InvalidInput(
            "overrides JSON `api` must be an object".to_owned(),
        ));
    };
    api_map.insert(
        "baseUrl".to_owned(),
        serde_json::Value::String(api_base_url.to_owned()),
    );
    Ok(Some(serde_json::to_string(&root)?))
}

pub(crate) fn format_error_output(
    mode: OutputMode,
    error: &InfraError,
    exit_code: ExitCode,
) -> CliOutput {
    let metadata: BTreeMap<&str, String> = error
        .metadata
        .iter()
        .map(|(key, value)| (key.as_str(), redact_if_secret(key, value)))
        .collect();
    let payload = serde_json::json!({
        "code": error.code.to_string(),
        "message": error.message,
        "kind": error.kind,
        "metadata": metadata,
    });

    let mut stderr = String::new();
    log_info(&mut stderr, "command failed", mode.no_progress);

    let stdout = if mode.is_ndjson() {
        let line = serde_json::json!({
            "type": "error",
            "status": "error",
            "error": payload,
        });
        let mut out = serde_json::to_string(&line).unwrap_or_else(|_| {
            "{\"type\":\"error\",\"status\":\"error\"}".to_string()
        });
        out.push('\n');
        out
    } else if mode.is_json() {
        let line = serde_json::json!({
            "status": "error",
            "error": payload,
        });
        // This is a CLI boundary, so JSON serialization errors are internal.
        let mut out = serde_json::to_string_pretty(&line)
            .unwrap_or_else(|_| "{\"status\":\"error\"}".to_string());
        out.push('\n');
        out
    } else {
        let mut out = format!(
            "status: error\ncode: {}\nmessage: {}\n",
            error.code, error.message
        );
        for (key, value) in &metadata {
            if !is_secret_key(key) {
                out.push_str(&format!("{key}: {value}\n"));
            }
        }
        out
    };

    CliOutput {
        stdout,
        stderr,
        exit_code,
    }
}

pub(crate) const fn infra_exit_code(error: &InfraError) -> ExitCode {
    match error.kind {
        ErrorKind::Expected => ExitCode::InvalidInput,
        ErrorKind::Invariant | ErrorKind::Unexpected => ExitCode::Internal,
    }
}

pub(crate) fn log_info(stderr: &mut String, message: &str, no_progress: bool) {
    if no_progress {
        return;
    }
    stderr.push_str("info: ");
    stderr.push_str(message);
    stderr.push('\n');
}

fn write_output(output: &CliOutput) -> Result<(), CliError> {
    let mut stdout = io::stdout();
    stdout.write_all(output.stdout.as_bytes())?;

    if !output.stderr.is_empty() {
        let mut stderr = io::stderr();
        stderr.write_all(output.stderr.as_bytes())?;
        stderr.flush()?;
    }

    Ok(())
}

pub(crate) fn collect_scoped_env(prefix: &str) -> BTreeMap<String, String> {
    std::env::vars()
        .filter(|(key, _)| key.starts_with(prefix))
        .collect()
}
