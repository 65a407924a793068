//! Environment validation helpers for CLI surfaces.

use quick_evac_config::{ClientConfig, ClientEnv, apply_env_overrides};
use quick_evac_shared::ErrorEnvelope;
use std::collections::BTreeMap;

/// Infra-level error type (shared error envelope).
pub type InfraError = ErrorEnvelope;

/// Infra-level result type.
pub type InfraResult<T> = Result<T, InfraError>;

/// Validate that the provided env overrides can be parsed and merged into a config.
pub fn validate_env_parsing(env: &BTreeMap<String, String>) -> InfraResult<()> {
    let parsed = ClientEnv::from_map(env).map_err(ErrorEnvelope::from)?;
    let _ = apply_env_overrides(ClientConfig::default(), &parsed)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use quick_evac_config::{ENV_API_TIMEOUT_MS, ENV_MAP_ZOOM};

    fn env(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(key, value)| ((*key).to_owned(), (*value).to_owned()))
            .collect()
    }

    #[test]
    fn accepts_empty_env() {
        assert!(validate_env_parsing(&BTreeMap::new()).is_ok());
    }

    #[test]
    fn rejects_malformed_numbers() {
        let result = validate_env_parsing(&env(&[(ENV_API_TIMEOUT_MS, "soon")]));
        assert!(result.is_err());
    }

    #[test]
    fn rejects_out_of_range_zoom() {
        let result = validate_env_parsing(&env(&[(ENV_MAP_ZOOM, "99")]));
        assert!(result.is_err());
    }
}
