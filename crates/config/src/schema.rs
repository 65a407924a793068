//! Client configuration schema, defaults, validation, and normalization.
//!
//! - Deserialization uses `serde` (JSON or TOML).
//! - Validation is manual and returns typed errors mapped to `ErrorEnvelope`.
//! - Normalization trims the API base URL and drops its trailing slash.

use quick_evac_shared::{BoundedU32, BoundedU64, ErrorCode, ErrorEnvelope};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use url::Url;

/// Sanitizes a URL for error messages by stripping credentials.
fn sanitize_url_for_error(url: &str) -> String {
    match Url::parse(url) {
        Ok(mut parsed) => {
            if parsed.password().is_some() || !parsed.username().is_empty() {
                if parsed.set_username("").is_err() {
                    return "[invalid url: invalid username]".to_string();
                }
                if parsed.set_password(None).is_err() {
                    return "[invalid url: invalid password]".to_string();
                }
            }
            parsed.to_string()
        },
        Err(error) => format!("[invalid url: {error}]"),
    }
}

/// Current supported configuration schema version.
pub const CURRENT_CONFIG_VERSION: u32 = 1;

/// Default zone-check service base URL.
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:5000/api";
/// Default zone-check request timeout.
pub const DEFAULT_API_TIMEOUT_MS: u64 = 15_000;
/// Default position fix timeout.
pub const DEFAULT_GEOLOCATION_TIMEOUT_MS: u64 = 10_000;
/// Default map zoom (city scale).
pub const DEFAULT_MAP_ZOOM: u32 = 13;

const API_TIMEOUT_MIN_MS: u64 = 1_000;
const API_TIMEOUT_MAX_MS: u64 = 120_000;
const GEOLOCATION_TIMEOUT_MIN_MS: u64 = 1_000;
const GEOLOCATION_TIMEOUT_MAX_MS: u64 = 60_000;
const MAP_ZOOM_MIN: u32 = 1;
const MAP_ZOOM_MAX: u32 = 21;

/// Top-level client configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct ClientConfig {
    /// Schema version for forward-compatible migrations.
    pub version: u32,
    /// Zone-check service settings.
    pub api: ApiConfig,
    /// Position acquisition settings.
    pub geolocation: GeolocationConfig,
    /// Map rendering settings.
    pub map: MapConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            version: CURRENT_CONFIG_VERSION,
            api: ApiConfig::default(),
            geolocation: GeolocationConfig::default(),
            map: MapConfig::default(),
        }
    }
}

impl ClientConfig {
    /// Validate and normalize the config.
    pub fn validate_and_normalize(self) -> Result<ValidatedClientConfig, ConfigSchemaError> {
        validate_version(self.version)?;
        let mut config = self;
        config.api.base_url = normalize_base_url(&config.api.base_url)?;
        let limits = ConfigLimits::new(&config)?;
        Ok(ValidatedClientConfig {
            raw: config,
            limits,
        })
    }
}

/// Zone-check service settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct ApiConfig {
    /// Base URL; requests go to `{baseUrl}/location/check`.
    pub base_url: Box<str>,
    /// Per-request timeout (ms). The client never retries.
    pub timeout_ms: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE_URL.into(),
            timeout_ms: DEFAULT_API_TIMEOUT_MS,
        }
    }
}

/// Position acquisition settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct GeolocationConfig {
    /// Time allowed for a position fix (ms).
    pub timeout_ms: u64,
    /// Request a high-accuracy fix.
    pub high_accuracy: bool,
}

impl Default for GeolocationConfig {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_GEOLOCATION_TIMEOUT_MS,
            high_accuracy: true,
        }
    }
}

/// Map rendering settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct MapConfig {
    /// Initial zoom level.
    pub zoom: u32,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            zoom: DEFAULT_MAP_ZOOM,
        }
    }
}

/// Validated config wrapper carrying bounded numeric values.
#[derive(Debug, Clone)]
pub struct ValidatedClientConfig {
    raw: ClientConfig,
    limits: ConfigLimits,
}

impl ValidatedClientConfig {
    /// Access validated numeric bounds.
    #[must_use]
    pub const fn limits(&self) -> &ConfigLimits {
        &self.limits
    }

    /// Borrow the raw config.
    #[must_use]
    pub const fn as_ref(&self) -> &ClientConfig {
        &self.raw
    }

    /// Consume the wrapper and return the raw config.
    #[must_use]
    pub fn into_inner(self) -> ClientConfig {
        self.raw
    }

    /// Normalized API base URL (no trailing slash).
    #[must_use]
    pub fn api_base_url(&self) -> &str {
        &self.raw.api.base_url
    }

    /// Zone-check request timeout.
    #[must_use]
    pub const fn api_timeout(&self) -> Duration {
        Duration::from_millis(self.limits.api_timeout_ms.get())
    }

    /// Position fix timeout.
    #[must_use]
    pub const fn geolocation_timeout(&self) -> Duration {
        Duration::from_millis(self.limits.geolocation_timeout_ms.get())
    }

    /// Initial map zoom.
    #[must_use]
    pub const fn map_zoom(&self) -> u32 {
        self.limits.map_zoom.get()
    }
}

impl AsRef<ClientConfig> for ValidatedClientConfig {
    fn as_ref(&self) -> &ClientConfig {
        &self.raw
    }
}

impl std::ops::Deref for ValidatedClientConfig {
    type Target = ClientConfig;

    fn deref(&self) -> &Self::Target {
        &self.raw
    }
}

/// Validated numeric limits derived from the config.
#[derive(Debug, Clone, Copy)]
pub struct ConfigLimits {
    /// Zone-check request timeout (ms).
    pub api_timeout_ms: BoundedU64<API_TIMEOUT_MIN_MS, API_TIMEOUT_MAX_MS>,
    /// Position fix timeout (ms).
    pub geolocation_timeout_ms: BoundedU64<GEOLOCATION_TIMEOUT_MIN_MS, GEOLOCATION_TIMEOUT_MAX_MS>,
    /// Map zoom.
    pub map_zoom: BoundedU32<MAP_ZOOM_MIN, MAP_ZOOM_MAX>,
}

impl ConfigLimits {
    fn new(config: &ClientConfig) -> Result<Self, ConfigSchemaError> {
        Ok(Self {
            api_timeout_ms: bounded_timeout(
                "api",
                "timeoutMs",
                config.api.timeout_ms,
                API_TIMEOUT_MIN_MS,
                API_TIMEOUT_MAX_MS,
            )?,
            geolocation_timeout_ms: bounded_timeout(
                "geolocation",
                "timeoutMs",
                config.geolocation.timeout_ms,
                GEOLOCATION_TIMEOUT_MIN_MS,
                GEOLOCATION_TIMEOUT_MAX_MS,
            )?,
            map_zoom: bounded_u32("map", "zoom", config.map.zoom, MAP_ZOOM_MIN, MAP_ZOOM_MAX)?,
        })
    }
}

/// Parse a client config from a JSON string, applying validation and normalization.
pub fn parse_client_config_json(input: &str) -> Result<ValidatedClientConfig, ErrorEnvelope> {
    let config: ClientConfig = serde_json::from_str(input).map_err(|error| {
        ErrorEnvelope::expected(
            ErrorCode::new("config", "invalid_json"),
            format!("invalid config JSON: {error}"),
        )
    })?;

    config.validate_and_normalize().map_err(Into::into)
}

/// Parse a client config from a TOML string, applying validation and normalization.
pub fn parse_client_config_toml(input: &str) -> Result<ValidatedClientConfig, ErrorEnvelope> {
    let config: ClientConfig = toml::from_str(input).map_err(|error| {
        ErrorEnvelope::expected(
            ErrorCode::new("config", "invalid_toml"),
            format!("invalid config TOML: {error}"),
        )
    })?;

    config.validate_and_normalize().map_err(Into::into)
}

/// Typed validation errors for config parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSchemaError {
    /// The config version is not supported by this binary.
    UnsupportedVersion {
        /// Version found in the config.
        found: u32,
        /// Version supported by this crate.
        supported: u32,
    },
    /// A timeout value is out of bounds.
    TimeoutOutOfRange {
        /// Schema section (e.g. `api`).
        section: &'static str,
        /// Field name in the config file (e.g. `timeoutMs`).
        field: &'static str,
        /// Value provided (ms).
        value_ms: u64,
        /// Minimum allowed value (ms).
        min_ms: u64,
        /// Maximum allowed value (ms).
        max_ms: u64,
    },
    /// A numeric limit is out of bounds.
    LimitOutOfRange {
        /// Schema section (e.g. `map`).
        section: &'static str,
        /// Field name in the config file (e.g. `zoom`).
        field: &'static str,
        /// Value provided.
        value: u64,
        /// Minimum allowed value.
        min: u64,
        /// Maximum allowed value.
        max: u64,
    },
    /// A URL is not a valid http(s) URL.
    InvalidUrl {
        /// Schema section.
        section: &'static str,
        /// Field name in the config file.
        field: &'static str,
        /// Value provided (credentials are stripped before display).
        url: String,
    },
}

impl ConfigSchemaError {
    fn error_code(&self) -> ErrorCode {
        match self {
            Self::UnsupportedVersion { .. } => ErrorCode::new("config", "unsupported_version"),
            Self::TimeoutOutOfRange { .. } => ErrorCode::new("config", "invalid_timeout"),
            Self::LimitOutOfRange { .. } => ErrorCode::new("config", "invalid_limit"),
            Self::InvalidUrl { .. } => ErrorCode::new("config", "invalid_url"),
        }
    }
}

impl fmt::Display for ConfigSchemaError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedVersion { found, supported } => {
                write!(
                    formatter,
                    "unsupported config version: {found} (supported: {supported})"
                )
            },
            Self::TimeoutOutOfRange {
                section,
                field,
                value_ms,
                min_ms,
                max_ms,
            } => write!(
                formatter,
                "{section}.{field} must be within [{min_ms}, {max_ms}] ms (got {value_ms})"
            ),
            Self::LimitOutOfRange {
                section,
                field,
                value,
                min,
                max,
            } => write!(
                formatter,
                "{section}.{field} must be within [{min}, {max}] (got {value})"
            ),
            Self::InvalidUrl {
                section,
                field,
                url,
            } => write!(
                formatter,
                "{section}.{field} must be an http(s) URL (got {})",
                sanitize_url_for_error(url)
            ),
        }
    }
}

impl std::error::Error for ConfigSchemaError {}

impl From<ConfigSchemaError> for ErrorEnvelope {
    fn from(error: ConfigSchemaError) -> Self {
        let code = error.error_code();
        let message = error.to_string();
        let envelope = Self::expected(code, message);

        match error {
            ConfigSchemaError::UnsupportedVersion { found, supported } => envelope
                .with_metadata("found", found.to_string())
                .with_metadata("supported", supported.to_string()),
            ConfigSchemaError::TimeoutOutOfRange {
                section,
                field,
                value_ms,
                min_ms,
                max_ms,
            } => envelope
                .with_metadata("section", section)
                .with_metadata("field", field)
                .with_metadata("value_ms", value_ms.to_string())
                .with_metadata("min_ms", min_ms.to_string())
                .with_metadata("max_ms", max_ms.to_string()),
            ConfigSchemaError::LimitOutOfRange {
                section,
                field,
                value,
                min,
                max,
            } => envelope
                .with_metadata("section", section)
                .with_metadata("field", field)
                .with_metadata("value", value.to_string())
                .with_metadata("min", min.to_string())
                .with_metadata("max", max.to_string()),
            ConfigSchemaError::InvalidUrl {
                section,
                field,
                url,
            } => envelope
                .with_metadata("section", section)
                .with_metadata("field", field)
                .with_metadata("url", sanitize_url_for_error(&url)),
        }
    }
}

const fn validate_version(version: u32) -> Result<(), ConfigSchemaError> {
    if version == CURRENT_CONFIG_VERSION {
        Ok(())
    } else {
        Err(ConfigSchemaError::UnsupportedVersion {
            found: version,
            supported: CURRENT_CONFIG_VERSION,
        })
    }
}

fn normalize_base_url(value: &str) -> Result<Box<str>, ConfigSchemaError> {
    let trimmed = value.trim();
    let invalid = || ConfigSchemaError::InvalidUrl {
        section: "api",
        field: "baseUrl",
        url: trimmed.to_owned(),
    };

    let parsed = Url::parse(trimmed).map_err(|_| invalid())?;
    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return Err(invalid());
    }
    if parsed.query().is_some() || parsed.fragment().is_some() {
        return Err(invalid());
    }

    Ok(parsed.as_str().trim_end_matches('/').into())
}

fn bounded_u32<const MIN: u32, const MAX: u32>(
    section: &'static str,
    field: &'static str,
    value: u32,
    min: u32,
    max: u32,
) -> Result<BoundedU32<MIN, MAX>, ConfigSchemaError> {
    BoundedU32::try_new(value).map_err(|_| ConfigSchemaError::LimitOutOfRange {
        section,
        field,
        value: u64::from(value),
        min: u64::from(min),
        max: u64::from(max),
    })
}

fn bounded_timeout<const MIN: u64, const MAX: u64>(
    section: &'static str,
    field: &'static str,
    value_ms: u64,
    min_ms: u64,
    max_ms: u64,
) -> Result<BoundedU64<MIN, MAX>, ConfigSchemaError> {
    BoundedU64::try_new(value_ms).map_err(|_| ConfigSchemaError::TimeoutOutOfRange {
        section,
        field,
        value_ms,
        min_ms,
        max_ms,
    })
}
