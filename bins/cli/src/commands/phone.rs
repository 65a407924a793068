//! Phone formatting command handler.

use crate::error::{CliError, ExitCode};
use crate::format::OutputMode;
use crate::{CliOutput, format_error_output};
use quick_evac_domain::NormalizedPhoneNumber;
use quick_evac_shared::ErrorEnvelope;

/// Normalize a phone number and print its display and E.164 forms.
pub fn run_format_phone(mode: OutputMode, raw: &str) -> Result<CliOutput, CliError> {
    let phone = match NormalizedPhoneNumber::parse(raw) {
        Ok(phone) => phone,
        Err(error) => {
            let error = ErrorEnvelope::from(error);
            return Ok(format_error_output(mode, &error, ExitCode::InvalidInput));
        },
    };

    let payload = serde_json::json!({
        "status": "ok",
        "normalized": phone.as_str(),
        "formatted": phone.formatted(),
        "e164": phone.e164(),
    });
    let stdout = mode.render_payload("phone", payload)?.unwrap_or_else(|| {
        format!(
            "status: ok\nnormalized: {}\nformatted: {}\ne164: {}\n",
            phone.as_str(),
            phone.formatted(),
            phone.e164()
        )
    });

    Ok(CliOutput {
        stdout,
        stderr: String::new(),
        exit_code: ExitCode::Ok,
    })
}
