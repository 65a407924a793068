//! Config loading helpers (env + file + overrides).
//!
//! The loader is responsible for deterministic merge order and surfacing
//! user-facing errors as typed `ErrorEnvelope`s.

use crate::{ClientConfig, ClientEnv, ValidatedClientConfig, apply_env_overrides};
use quick_evac_shared::{ErrorClass, ErrorCode, ErrorEnvelope};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConfigFormat {
    Json,
    Toml,
}

/// Load the client config from sources using a deterministic precedence order.
///
/// Precedence (highest wins):
/// - env overrides (`ClientEnv`)
/// - overrides JSON (partial config)
/// - config JSON (file content)
/// - defaults (`ClientConfig::default()`)
pub fn load_client_config_from_sources(
    config_json: Option<&str>,
    overrides_json: Option<&str>,
    env: &ClientEnv,
) -> Result<ValidatedClientConfig, ErrorEnvelope> {
    let mut config = match config_json {
        None => ClientConfig::default(),
        Some(input) => parse_config_unvalidated(input, ConfigFormat::Json)?,
    };

    if let Some(input) = overrides_json {
        let overrides = parse_overrides_json(input)?;
        overrides.apply(&mut config);
    }

    // env is applied last and also validates/normalizes the resulting config.
    apply_env_overrides(config, env)
}

/// Load the client config from an optional file path (`.json` or `.toml`).
pub fn load_client_config_from_path(
    config_path: Option<&Path>,
    overrides_json: Option<&str>,
    env: &ClientEnv,
) -> Result<ValidatedClientConfig, ErrorEnvelope> {
    let mut config = match config_path {
        None => ClientConfig::default(),
        Some(path) => {
            let config_text = read_config_file(path)?;
            let format = detect_config_format(path)?;
            parse_config_unvalidated(&config_text, format)?
        },
    };

    if let Some(input) = overrides_json {
        let overrides = parse_overrides_json(input)?;
        overrides.apply(&mut config);
    }

    apply_env_overrides(config, env)
}

/// Load the client config from std env and an optional file path.
pub fn load_client_config_std_env(
    config_path: Option<&Path>,
    overrides_json: Option<&str>,
) -> Result<ValidatedClientConfig, ErrorEnvelope> {
    let env = ClientEnv::from_std_env().map_err(ErrorEnvelope::from)?;
    load_client_config_from_path(config_path, overrides_json, &env)
}

/// Serialize the config as deterministic pretty JSON (with trailing newline).
pub fn to_pretty_json(config: &ClientConfig) -> Result<String, ErrorEnvelope> {
    let mut output = serde_json::to_string_pretty(config).map_err(|error| {
        ErrorEnvelope::unexpected(
            ErrorCode::internal(),
            format!("failed to serialize config: {error}"),
            ErrorClass::NonRetriable,
        )
    })?;
    output.push('\n');
    Ok(output)
}

/// Serialize the config as deterministic pretty TOML (with trailing newline).
pub fn to_pretty_toml(config: &ClientConfig) -> Result<String, ErrorEnvelope> {
    let mut output = toml::to_string_pretty(config).map_err(|error| {
        ErrorEnvelope::unexpected(
            ErrorCode::new("config", "serialize_toml"),
            format!("failed to serialize config TOML: {error}"),
            ErrorClass::NonRetriable,
        )
    })?;
    if !output.ends_with('\n') {
        output.push('\n');
    }
    Ok(output)
}

fn parse_config_unvalidated(
    input: &str,
    format: ConfigFormat,
) -> Result<ClientConfig, ErrorEnvelope> {
    match format {
        ConfigFormat::Json => serde_json::from_str(input).map_err(|error| {
            ErrorEnvelope::expected(
                ErrorCode::new("config", "invalid_json"),
                format!("invalid config JSON: {error}"),
            )
            .with_metadata("source", "config")
        }),
        ConfigFormat::Toml => toml::from_str(input).map_err(|error| {
            ErrorEnvelope::expected(
                ErrorCode::new("config", "invalid_toml"),
                format!("invalid config TOML: {error}"),
            )
            .with_metadata("source", "config")
        }),
    }
}

fn parse_overrides_json(input: &str) -> Result<ClientConfigOverrides, ErrorEnvelope> {
    serde_json::from_str(input).map_err(|error| {
        ErrorEnvelope::expected(
            ErrorCode::new("config", "invalid_json"),
            format!("invalid overrides JSON: {error}"),
        )
        .with_metadata("source", "overrides")
    })
}

fn read_config_file(path: &Path) -> Result<String, ErrorEnvelope> {
    std::fs::read_to_string(path).map_err(|error| {
        let code = match error.kind() {
            std::io::ErrorKind::NotFound => ErrorCode::new("config", "config_file_not_found"),
            std::io::ErrorKind::PermissionDenied => {
                ErrorCode::new("config", "config_file_permission_denied")
            },
            _ => ErrorCode::new("config", "config_file_io"),
        };

        ErrorEnvelope::expected(code, format!("failed to read config file: {error}"))
            .with_metadata("path", path.to_string_lossy().to_string())
    })
}

fn detect_config_format(path: &Path) -> Result<ConfigFormat, ErrorEnvelope> {
    let ext = path
        .extension()
        .and_then(|value| value.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        None | Some("json") => Ok(ConfigFormat::Json),
        Some("toml") => Ok(ConfigFormat::Toml),
        Some(other) => Err(ErrorEnvelope::expected(
            ErrorCode::new("config", "unsupported_format"),
            "unsupported config format; use .json or .toml",
        )
        .with_metadata("extension", other.to_string())),
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
struct ClientConfigOverrides {
    version: Option<u32>,
    api: ApiConfigOverrides,
    geolocation: GeolocationConfigOverrides,
    map: MapConfigOverrides,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
struct ApiConfigOverrides {
    base_url: Option<Box<str>>,
    timeout_ms: Option<u64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
struct GeolocationConfigOverrides {
    timeout_ms: Option<u64>,
    high_accuracy: Option<bool>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
struct MapConfigOverrides {
    zoom: Option<u32>,
}

impl ClientConfigOverrides {
    fn apply(self, config: &mut ClientConfig) {
        if let Some(version) = self.version {
            config.version = version;
        }
        if let Some(base_url) = self.api.base_url {
            config.api.base_url = base_url;
        }
        if let Some(timeout_ms) = self.api.timeout_ms {
            config.api.timeout_ms = timeout_ms;
        }
        if let Some(timeout_ms) = self.geolocation.timeout_ms {
            config.geolocation.timeout_ms = timeout_ms;
        }
        if let Some(high_accuracy) = self.geolocation.high_accuracy {
            config.geolocation.high_accuracy = high_accuracy;
        }
        if let Some(zoom) = self.map.zoom {
            config.map.zoom = zoom;
        }
    }
}
