//! # quick-evac-config
//!
//! Client configuration schema, validation, and loading.
//! This crate depends on `shared` only.

/// Environment variable parsing and merging.
pub mod env;
/// Config loading helpers (env + file + overrides).
pub mod load;
/// Configuration schema types and helpers.
pub mod schema;

pub use schema::{
    ApiConfig, CURRENT_CONFIG_VERSION, ClientConfig, ConfigLimits, ConfigSchemaError,
    DEFAULT_API_BASE_URL, DEFAULT_API_TIMEOUT_MS, DEFAULT_GEOLOCATION_TIMEOUT_MS,
    DEFAULT_MAP_ZOOM, GeolocationConfig, MapConfig, ValidatedClientConfig,
    parse_client_config_json, parse_client_config_toml,
};

pub use env::{
    ClientEnv, ENV_API_BASE_URL, ENV_API_TIMEOUT_MS, ENV_GEO_HIGH_ACCURACY, ENV_GEO_TIMEOUT_MS,
    ENV_MAP_ZOOM, EnvParseError, apply_env_overrides,
};
pub use load::{
    load_client_config_from_path, load_client_config_from_sources, load_client_config_std_env,
    to_pretty_json, to_pretty_toml,
};

/// Returns the config crate version.
#[must_use]
pub const fn config_crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
