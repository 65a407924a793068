//! Environment variable parsing and env-to-config merging.
//!
//! Env parsing is strict: a variable that is present but empty or malformed
//! fails fast instead of silently falling back to the file or defaults.

use crate::schema::{ClientConfig, ValidatedClientConfig};
use quick_evac_shared::{ErrorCode, ErrorEnvelope, redact_if_secret};
use std::collections::BTreeMap;
use std::fmt;
use url::Url;

/// Env var: zone-check service base URL.
pub const ENV_API_BASE_URL: &str = "QEVAC_API_BASE_URL";
/// Env var: zone-check request timeout in milliseconds.
pub const ENV_API_TIMEOUT_MS: &str = "QEVAC_API_TIMEOUT_MS";
/// Env var: position fix timeout in milliseconds.
pub const ENV_GEO_TIMEOUT_MS: &str = "QEVAC_GEO_TIMEOUT_MS";
/// Env var: request a high-accuracy fix.
pub const ENV_GEO_HIGH_ACCURACY: &str = "QEVAC_GEO_HIGH_ACCURACY";
/// Env var: initial map zoom.
pub const ENV_MAP_ZOOM: &str = "QEVAC_MAP_ZOOM";

const ALL_ENV_VARS: [&str; 5] = [
    ENV_API_BASE_URL,
    ENV_API_TIMEOUT_MS,
    ENV_GEO_TIMEOUT_MS,
    ENV_GEO_HIGH_ACCURACY,
    ENV_MAP_ZOOM,
];

/// Parsed env overrides. `None` means the variable was not set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientEnv {
    /// Override for `api.baseUrl`.
    pub api_base_url: Option<Box<str>>,
    /// Override for `api.timeoutMs`.
    pub api_timeout_ms: Option<u64>,
    /// Override for `geolocation.timeoutMs`.
    pub geo_timeout_ms: Option<u64>,
    /// Override for `geolocation.highAccuracy`.
    pub geo_high_accuracy: Option<bool>,
    /// Override for `map.zoom`.
    pub map_zoom: Option<u32>,
}

impl ClientEnv {
    /// Parse env overrides from a key/value map (useful for tests and fixtures).
    pub fn from_map(map: &BTreeMap<String, String>) -> Result<Self, EnvParseError> {
        Ok(Self {
            api_base_url: parse_optional_url_string(map, ENV_API_BASE_URL)?,
            api_timeout_ms: parse_optional_u64(map, ENV_API_TIMEOUT_MS)?,
            geo_timeout_ms: parse_optional_u64(map, ENV_GEO_TIMEOUT_MS)?,
            geo_high_accuracy: parse_optional_bool(map, ENV_GEO_HIGH_ACCURACY)?,
            map_zoom: parse_optional_u32(map, ENV_MAP_ZOOM)?,
        })
    }

    /// Parse env overrides from the process environment.
    pub fn from_std_env() -> Result<Self, EnvParseError> {
        let mut map = BTreeMap::new();
        for name in ALL_ENV_VARS {
            if let Ok(value) = std::env::var(name) {
                map.insert(name.to_owned(), value);
            }
        }
        Self::from_map(&map)
    }

    /// True when no override is set.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.api_base_url.is_none()
            && self.api_timeout_ms.is_none()
            && self.geo_timeout_ms.is_none()
            && self.geo_high_accuracy.is_none()
            && self.map_zoom.is_none()
    }
}

/// Apply env overrides on top of `base`, then validate and normalize.
pub fn apply_env_overrides(
    base: ClientConfig,
    env: &ClientEnv,
) -> Result<ValidatedClientConfig, ErrorEnvelope> {
    let mut config = base;
    if let Some(base_url) = &env.api_base_url {
        config.api.base_url = base_url.clone();
    }
    if let Some(timeout_ms) = env.api_timeout_ms {
        config.api.timeout_ms = timeout_ms;
    }
    if let Some(timeout_ms) = env.geo_timeout_ms {
        config.geolocation.timeout_ms = timeout_ms;
    }
    if let Some(high_accuracy) = env.geo_high_accuracy {
        config.geolocation.high_accuracy = high_accuracy;
    }
    if let Some(zoom) = env.map_zoom {
        config.map.zoom = zoom;
    }

    config.validate_and_normalize().map_err(Into::into)
}

/// Env parsing errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnvParseError {
    /// An env var was present but empty after trimming.
    EmptyValue {
        /// Env var name.
        var: &'static str,
    },
    /// Boolean env var had an invalid value.
    InvalidBool {
        /// Env var name.
        var: &'static str,
        /// Raw input value.
        value: String,
    },
    /// Integer env var had an invalid value.
    InvalidInt {
        /// Env var name.
        var: &'static str,
        /// Raw input value.
        value: String,
    },
    /// URL env var had an invalid value.
    InvalidUrl {
        /// Env var name.
        var: &'static str,
        /// Raw input value.
        value: String,
    },
}

impl EnvParseError {
    fn error_code(&self) -> ErrorCode {
        match self {
            Self::EmptyValue { .. } => ErrorCode::new("config", "env_empty_value"),
            Self::InvalidBool { .. } => ErrorCode::new("config", "env_invalid_bool"),
            Self::InvalidInt { .. } => ErrorCode::new("config", "env_invalid_int"),
            Self::InvalidUrl { .. } => ErrorCode::new("config", "env_invalid_url"),
        }
    }
}

impl fmt::Display for EnvParseError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyValue { var } => write!(formatter, "{var} is set but empty"),
            Self::InvalidBool { var, .. } => {
                write!(formatter, "{var} must be a boolean (true/false/1/0)")
            },
            Self::InvalidInt { var, .. } => {
                write!(formatter, "{var} must be a non-negative integer")
            },
            Self::InvalidUrl { var, .. } => write!(formatter, "{var} must be an http(s) URL"),
        }
    }
}

impl std::error::Error for EnvParseError {}

impl From<EnvParseError> for ErrorEnvelope {
    fn from(error: EnvParseError) -> Self {
        let code = error.error_code();
        let message = error.to_string();
        let envelope = Self::expected(code, message);

        match error {
            EnvParseError::EmptyValue { var } => envelope.with_metadata("env_var", var),
            EnvParseError::InvalidBool { var, value }
            | EnvParseError::InvalidInt { var, value }
            | EnvParseError::InvalidUrl { var, value } => envelope
                .with_metadata("env_var", var)
                .with_metadata("value", redact_if_secret(var, &value)),
        }
    }
}

fn read_trimmed<'a>(
    map: &'a BTreeMap<String, String>,
    var: &'static str,
) -> Result<Option<(&'a str, &'a String)>, EnvParseError> {
    let Some(raw) = map.get(var) else {
        return Ok(None);
    };
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(EnvParseError::EmptyValue { var });
    }
    Ok(Some((trimmed, raw)))
}

fn parse_optional_u64(
    map: &BTreeMap<String, String>,
    var: &'static str,
) -> Result<Option<u64>, EnvParseError> {
    let Some((trimmed, raw)) = read_trimmed(map, var)? else {
        return Ok(None);
    };

    trimmed
        .parse::<u64>()
        .map(Some)
        .map_err(|_| EnvParseError::InvalidInt {
            var,
            value: raw.clone(),
        })
}

fn parse_optional_u32(
    map: &BTreeMap<String, String>,
    var: &'static str,
) -> Result<Option<u32>, EnvParseError> {
    let Some((trimmed, raw)) = read_trimmed(map, var)? else {
        return Ok(None);
    };

    trimmed
        .parse::<u32>()
        .map(Some)
        .map_err(|_| EnvParseError::InvalidInt {
            var,
            value: raw.clone(),
        })
}

fn parse_optional_bool(
    map: &BTreeMap<String, String>,
    var: &'static str,
) -> Result<Option<bool>, EnvParseError> {
    let Some((trimmed, raw)) = read_trimmed(map, var)? else {
        return Ok(None);
    };

    match trimmed.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(Some(true)),
        "false" | "0" | "no" | "off" => Ok(Some(false)),
        _ => Err(EnvParseError::InvalidBool {
            var,
            value: raw.clone(),
        }),
    }
}

fn parse_optional_url_string(
    map: &BTreeMap<String, String>,
    var: &'static str,
) -> Result<Option<Box<str>>, EnvParseError> {
    let Some((trimmed, raw)) = read_trimmed(map, var)? else {
        return Ok(None);
    };

    let parsed = Url::parse(trimmed).map_err(|_| EnvParseError::InvalidUrl {
        var,
        value: raw.clone(),
    })?;
    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return Err(EnvParseError::InvalidUrl {
            var,
            value: raw.clone(),
        });
    }

    Ok(Some(parsed.to_string().into_boxed_str()))
}
