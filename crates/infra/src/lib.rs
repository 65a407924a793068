//! # quick-evac-infra
//!
//! Infrastructure wiring and runtime composition.
//! This crate depends on `app`, `adapters`, `config`, and `shared`.

/// Local check composition root.
pub mod check_local;
/// Config loading helpers used by CLI surfaces.
pub mod config_check;
/// Environment validation helpers used by CLI surfaces.
pub mod env_check;
/// Logger and telemetry selection.
pub mod observability;

pub use check_local::{
    CheckReport, CheckRuntime, HostLocation, build_check_runtime, build_check_runtime_with,
    run_check, run_check_local,
};
pub use config_check::{
    load_effective_config, load_effective_config_json, load_effective_config_toml,
};
pub use env_check::{InfraError, InfraResult, validate_env_parsing};
pub use observability::{Observability, observability_from_env, observability_from_map};

pub use quick_evac_app::RouteOutcome;

// Re-export redaction utilities for CLI boundary sanitization
pub use quick_evac_shared::{is_secret_key, mask_phone, redact_if_secret};

/// Returns the infra crate version.
#[must_use]
pub const fn infra_crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
