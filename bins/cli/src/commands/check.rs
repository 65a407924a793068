//! Check command handler.

use crate::error::{CliError, ExitCode};
use crate::format::OutputMode;
use crate::{CliOutput, collect_scoped_env, format_error_output, infra_exit_code, log_info};
use quick_evac_domain::{CheckSessionState, Coordinates, StatusCard};
use quick_evac_infra::{
    CheckReport, HostLocation, RouteOutcome, load_effective_config, observability_from_env,
    run_check_local,
};
use std::path::Path;

/// Inputs of one `check` invocation.
#[derive(Debug, Clone, Copy)]
pub struct CheckCommandInput<'a> {
    pub phone: &'a str,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub deny_location: bool,
    pub config_path: Option<&'a Path>,
    pub overrides_json: Option<&'a str>,
}

/// Run the check command.
pub fn run_check(mode: OutputMode, input: CheckCommandInput<'_>) -> Result<CliOutput, CliError> {
    let location = host_location(&input)?;
    let env = collect_scoped_env("QEVAC_");
    let config = match load_effective_config(&env, input.config_path, input.overrides_json) {
        Ok(config) => config,
        Err(error) => return Ok(format_error_output(mode, &error, ExitCode::InvalidInput)),
    };

    let mut stderr = String::new();
    log_info(
        &mut stderr,
        &format!("checking location against {}", config.api_base_url()),
        mode.no_progress,
    );

    let observability = observability_from_env();
    match run_check_local(&config, input.phone, location, &observability) {
        Ok(report) => format_check_output(mode, &report, stderr),
        Err(error) => Ok(format_error_output(mode, &error, infra_exit_code(&error))),
    }
}

fn host_location(input: &CheckCommandInput<'_>) -> Result<HostLocation, CliError> {
    if input.deny_location {
        return Ok(HostLocation::Denied);
    }
    match (input.latitude, input.longitude) {
        (Some(latitude), Some(longitude)) => Coordinates::new(latitude, longitude)
            .map(HostLocation::Fixed)
            .map_err(|error| CliError::InvalidInput(error.to_string())),
        (None, None) => Ok(HostLocation::Unavailable),
        _ => Err(CliError::InvalidInput(
            "--lat and --lon must be given together".to_owned(),
        )),
    }
}

fn format_check_output(
    mode: OutputMode,
    report: &CheckReport,
    stderr: String,
) -> Result<CliOutput, CliError> {
    let exit_code = ExitCode::for_check(&report.state);
    let stdout = mode
        .render_payload("check", check_payload(report)?)?
        .unwrap_or_else(|| format_check_text(report));

    Ok(CliOutput {
        stdout,
        stderr,
        exit_code,
    })
}

fn check_payload(report: &CheckReport) -> Result<serde_json::Value, CliError> {
    let payload = match &report.state {
        CheckSessionState::Failed { error } => serde_json::json!({
            "status": "failed",
            "error": {
                "stage": error.stage(),
                "code": error.code(),
                "message": error.message(),
            },
        }),
        _ => serde_json::json!({
            "status": "ok",
            "result": serde_json::to_value(&report.status_card)?,
            "scene": serde_json::to_value(&report.scene)?,
            "route": route_label(report),
        }),
    };
    Ok(payload)
}

fn route_label(report: &CheckReport) -> Option<&'static str> {
    report.route.as_ref().map(|route| match route {
        RouteOutcome::Drawn { .. } => "drawn",
        RouteOutcome::Omitted(_) => "omitted",
        RouteOutcome::Stale => "stale",
    })
}

fn format_check_text(report: &CheckReport) -> String {
    match (&report.state, &report.status_card) {
        (CheckSessionState::Failed { error }, _) => format!(
            "status: failed\nstage: {}\ncode: {}\nmessage: {}\n",
            error.stage(),
            error.code(),
            error.message()
        ),
        (_, Some(card)) => {
            let mut out = format_card_text(card);
            if let Some(scene) = report.scene.as_ref() {
                out.push_str(&format!(
                    "map: {} markers, {} circles, {} routes\n",
                    scene.markers().count(),
                    scene.circles().count(),
                    scene.polylines().count()
                ));
            }
            out
        },
        (state, None) => format!("status: {}\n", state.name()),
    }
}

fn format_card_text(card: &StatusCard) -> String {
    let mut out = String::new();
    out.push_str("status: ok\n");
    out.push_str(&format!("result: {}\n", card.descriptor.label));
    out.push_str(&format!("message: {}\n", card.descriptor.message));
    out.push_str(&format!("phone: {}\n", card.phone));
    out.push_str(&format!("location: {}\n", card.location));
    if let Some(zone) = card.zone.as_ref() {
        out.push_str(&format!("zone: {}\n", zone.headline));
        if let Some(description) = zone.description.as_ref() {
            out.push_str(&format!("description: {description}\n"));
        }
    }
    if let Some(evacuation) = card.evacuation.as_ref() {
        out.push_str(&format!("evacuation: {}\n", evacuation.safe_zone));
        if let Some(route) = evacuation.route.as_ref() {
            out.push_str(&format!("{}\n", route.summary));
            for (index, step) in route.steps.iter().enumerate() {
                out.push_str(&format!(
                    "  {}. {} ({})\n",
                    index + 1,
                    step.instruction.plain_text(),
                    step.detail
                ));
            }
            if route.remaining_steps > 0 {
                out.push_str(&format!("  ... and {} more steps\n", route.remaining_steps));
            }
            out.push_str(&format!("note: {}\n", route.sms_note));
        }
    }
    out.push_str(&format!("legend: {}\n", card.legend));
    out
}
