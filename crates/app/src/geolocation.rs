//! Single-shot device position acquisition.

use quick_evac_domain::{Coordinates, GeoError};
use quick_evac_ports::{GeolocationPort, PositionOptions, TelemetryPort, TelemetryTags};
use quick_evac_shared::{Interrupted, RequestContext, race_with_context};
use std::sync::Arc;
use std::time::Duration;

/// Default deadline for one position fix.
pub const DEFAULT_GEOLOCATION_TIMEOUT: Duration = Duration::from_secs(10);

/// Dependencies required to acquire a position.
#[derive(Clone)]
pub struct AcquireLocationDeps {
    /// Platform geolocation capability.
    pub geolocation: Arc<dyn GeolocationPort>,
    /// Optional telemetry sink.
    pub telemetry: Option<Arc<dyn TelemetryPort>>,
}

/// Per-request acquisition settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AcquireLocationOptions {
    /// Deadline for the fix.
    pub timeout: Duration,
    /// Ask for GPS-grade accuracy.
    pub high_accuracy: bool,
}

impl Default for AcquireLocationOptions {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_GEOLOCATION_TIMEOUT,
            high_accuracy: true,
        }
    }
}

/// Acquire exactly one fresh position fix.
///
/// Unsupported devices fail without issuing a request. The platform receives
/// the deadline; a local guard enforces it too, so a platform that never
/// answers still yields [`GeoError::Timeout`]. A cancelled context yields
/// [`GeoError::Unknown`].
#[tracing::instrument(
    name = "app.geolocation.acquire",
    skip_all,
    fields(correlation_id = %ctx.correlation_id())
)]
pub async fn acquire_location(
    ctx: &RequestContext,
    deps: &AcquireLocationDeps,
    options: AcquireLocationOptions,
) -> Result<Coordinates, GeoError> {
    if !deps.geolocation.is_supported() {
        record_outcome(deps, Err(GeoError::Unsupported));
        return Err(GeoError::Unsupported);
    }

    let timer = deps
        .telemetry
        .as_ref()
        .map(|telemetry| telemetry.start_timer("client.geolocation.acquire", None));

    let position_options = PositionOptions {
        high_accuracy: options.high_accuracy,
        ..PositionOptions::fresh(options.timeout)
    };
    let request = deps.geolocation.current_position(ctx, position_options);
    let outcome = match race_with_context(ctx, options.timeout, request).await {
        Ok(result) => result,
        Err(Interrupted::TimedOut) => Err(GeoError::Timeout),
        Err(Interrupted::Cancelled) => Err(GeoError::Unknown),
    };

    if let Some(timer) = timer.as_ref() {
        timer.stop();
    }
    record_outcome(deps, outcome);
    if let Err(error) = outcome {
        tracing::debug!(code = error.code(), "position fix failed");
    }
    outcome
}

fn record_outcome(deps: &AcquireLocationDeps, outcome: Result<Coordinates, GeoError>) {
    let Some(telemetry) = deps.telemetry.as_ref() else {
        return;
    };
    let outcome = match outcome {
        Ok(_) => "success",
        Err(error) => error.code(),
    };
    let mut tags = TelemetryTags::new();
    tags.insert("outcome".into(), outcome.into());
    telemetry.increment_counter("client.geolocation.acquire", 1, Some(&tags));
}
