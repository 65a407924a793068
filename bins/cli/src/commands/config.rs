//! Config command handlers.

use crate::error::{CliError, ExitCode};
use crate::format::OutputMode;
use crate::{CliOutput, collect_scoped_env, format_error_output, log_info};
use quick_evac_infra::{
    load_effective_config, load_effective_config_json, load_effective_config_toml,
};
use std::path::Path;

/// Serialization used by `config show`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ConfigShowFormat {
    /// Pretty JSON.
    Json,
    /// Pretty TOML.
    Toml,
}

/// Validate config loading, merging, and normalization.
pub fn run_config_check(
    mode: OutputMode,
    path: Option<&Path>,
    overrides_json: Option<&str>,
) -> Result<CliOutput, CliError> {
    let env = collect_scoped_env("QEVAC_");
    let config = match load_effective_config(&env, path, overrides_json) {
        Ok(config) => config,
        Err(error) => return Ok(format_error_output(mode, &error, ExitCode::InvalidInput)),
    };

    let mut stderr = String::new();
    log_info(&mut stderr, "config check completed", mode.no_progress);

    let payload = serde_json::json!({
        "status": "ok",
        "configPath": path.map(|value| value.to_string_lossy().to_string()),
        "apiBaseUrl": config.api_base_url(),
    });
    let stdout = mode
        .render_payload("config", payload)?
        .unwrap_or_else(|| format!("status: ok\napi: {}\n", config.api_base_url()));

    Ok(CliOutput {
        stdout,
        stderr,
        exit_code: ExitCode::Ok,
    })
}

/// Show the effective config after applying overrides.
pub fn run_config_show(
    mode: OutputMode,
    path: Option<&Path>,
    overrides_json: Option<&str>,
    format: ConfigShowFormat,
) -> Result<CliOutput, CliError> {
    let env = collect_scoped_env("QEVAC_");
    let rendered = match format {
        ConfigShowFormat::Json => load_effective_config_json(&env, path, overrides_json),
        ConfigShowFormat::Toml => load_effective_config_toml(&env, path, overrides_json),
    };
    let config_text = match rendered {
        Ok(config) => config,
        Err(error) => return Ok(format_error_output(mode, &error, ExitCode::InvalidInput)),
    };

    let mut stderr = String::new();
    log_info(&mut stderr, "config show completed", mode.no_progress);

    let stdout = if mode.is_json() && format == ConfigShowFormat::Json {
        let config_value: serde_json::Value = serde_json::from_str(config_text.trim())?;
        let payload = serde_json::json!({
            "status": "ok",
            "configPath": path.map(|value| value.to_string_lossy().to_string()),
            "effectiveConfig": config_value,
        });
        let mut output = serde_json::to_string_pretty(&payload)?;
        output.push('\n');
        output
    } else {
        let mut out = String::new();
        out.push_str("status: ok\nconfig:\n");
        out.push_str(&config_text);
        out
    };

    Ok(CliOutput {
        stdout,
        stderr,
        exit_code: ExitCode::Ok,
    })
}
