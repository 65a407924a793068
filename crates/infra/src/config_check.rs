//! Config loading helpers for CLI surfaces.

use crate::InfraResult;
use quick_evac_config::{
    ClientEnv, ValidatedClientConfig, load_client_config_from_path, to_pretty_json,
    to_pretty_toml,
};
use quick_evac_shared::ErrorEnvelope;
use std::collections::BTreeMap;
use std::path::Path;

/// Load and validate the effective config from an env snapshot.
pub fn load_effective_config(
    env: &BTreeMap<String, String>,
    config_path: Option<&Path>,
    overrides_json: Option<&str>,
) -> InfraResult<ValidatedClientConfig> {
    let env = ClientEnv::from_map(env).map_err(ErrorEnvelope::from)?;
    load_client_config_from_path(config_path, overrides_json, &env)
}

/// Load and validate the effective config, returning deterministic pretty JSON.
pub fn load_effective_config_json(
    env: &BTreeMap<String, String>,
    config_path: Option<&Path>,
    overrides_json: Option<&str>,
) -> InfraResult<String> {
    let config = load_effective_config(env, config_path, overrides_json)?;
    to_pretty_json(&config)
}

/// Same as [`load_effective_config_json`], rendered as TOML.
pub fn load_effective_config_toml(
    env: &BTreeMap<String, String>,
    config_path: Option<&Path>,
    overrides_json: Option<&str>,
) -> InfraResult<String> {
    let config = load_effective_config(env, config_path, overrides_json)?;
    to_pretty_toml(&config)
}
