//! Info command handler.

use crate::CliOutput;
use crate::error::{CliError, ExitCode};
use crate::format::OutputMode;
use quick_evac_config::{DEFAULT_API_BASE_URL, config_crate_version};
use quick_evac_infra::infra_crate_version;

/// Run the info command.
pub fn run_info(mode: OutputMode) -> Result<CliOutput, CliError> {
    let name = env!("CARGO_PKG_NAME");
    let version = env!("CARGO_PKG_VERSION");
    let infra_version = infra_crate_version();
    let config_version = config_crate_version();

    let payload = serde_json::json!({
        "status": "ok",
        "build": {
            "name": name,
            "version": version,
            "infraVersion": infra_version,
            "configVersion": config_version,
            "defaultApiBaseUrl": DEFAULT_API_BASE_URL,
        }
    });
    let stdout = mode.render_payload("info", payload)?.unwrap_or_else(|| {
        format!(
            "status: ok\nname: {name}\nversion: {version}\ninfra: {infra_version}\nconfig: {config_version}\ndefault api: {DEFAULT_API_BASE_URL}\n"
        )
    });

    Ok(CliOutput {
        stdout,
        stderr: String::new(),
        exit_code: ExitCode::Ok,
    })
}
