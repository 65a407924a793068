//! Integration tests for env parsing and env-to-config merging.

use quick_evac_config::{
    ClientConfig, ClientEnv, EnvParseError, apply_env_overrides, load_client_config_from_path,
};
use quick_evac_shared::ErrorCode;
use std::collections::BTreeMap;
use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

fn workspace_root() -> PathBuf {
    let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));
    manifest_dir
        .parent()
        .and_then(Path::parent)
        .map(Path::to_path_buf)
        .unwrap_or_else(|| manifest_dir.to_path_buf())
}

fn fixture_path(relative: &str) -> PathBuf {
    workspace_root()
        .join("crates")
        .join("testkit")
        .join("fixtures")
        .join(relative)
}

fn read_env_map(relative: &str) -> Result<BTreeMap<String, String>, Box<dyn Error>> {
    let contents = fs::read_to_string(fixture_path(relative))?;
    Ok(serde_json::from_str(&contents)?)
}

#[test]
fn env_fixture_merges_into_effective_config() -> Result<(), Box<dyn Error>> {
    let env_map = read_env_map("env/client-env.valid.json")?;
    let env = ClientEnv::from_map(&env_map)?;

    let config = apply_env_overrides(ClientConfig::default(), &env)?;

    assert_eq!(config.api_base_url(), "http://127.0.0.1:8080/api");
    assert_eq!(config.api_timeout(), Duration::from_secs(5));
    assert_eq!(config.geolocation_timeout(), Duration::from_secs(3));
    assert!(!config.geolocation.high_accuracy);
    assert_eq!(config.map_zoom(), 16);
    Ok(())
}

#[test]
fn env_wins_over_config_file() -> Result<(), Box<dyn Error>> {
    let env_map = read_env_map("env/client-env.valid.json")?;
    let env = ClientEnv::from_map(&env_map)?;
    let path = fixture_path("config/client-config.valid.json");

    let config = load_client_config_from_path(Some(&path), None, &env)?;

    assert_eq!(config.api_base_url(), "http://127.0.0.1:8080/api");
    assert_eq!(config.map_zoom(), 16);
    Ok(())
}

#[test]
fn invalid_env_fixture_is_rejected() -> Result<(), Box<dyn Error>> {
    let env_map = read_env_map("env/client-env.invalid-bool.json")?;
    let error = ClientEnv::from_map(&env_map).err();

    assert!(matches!(
        error,
        Some(EnvParseError::InvalidBool {
            var: "QEVAC_GEO_HIGH_ACCURACY",
            ..
        })
    ));

    let envelope = error.map(quick_evac_shared::ErrorEnvelope::from);
    assert_eq!(
        envelope.map(|error| error.code),
        Some(ErrorCode::new("config", "env_invalid_bool"))
    );
    Ok(())
}
