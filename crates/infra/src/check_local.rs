//! Composition root for running one location check from a local host.
//!
//! A terminal has no GPS and no graphical map, so the position comes from
//! the operator, the scene is recorded in memory, and the route is drawn as
//! a straight line. The zone check itself goes to the configured service.

use crate::observability::Observability;
use crate::{InfraError, InfraResult};
use quick_evac_adapters::{
    FixedGeolocation, HttpZoneCheck, MapScene, RecordingMapSurface, StraightLineDirections,
};
use quick_evac_app::{
    AcquireLocationOptions, CheckSession, CheckSessionDeps, MapOverlayRenderer, OverlayDeps,
    RouteOutcome, SubmitOutcome,
};
use quick_evac_config::ValidatedClientConfig;
use quick_evac_domain::{CheckSessionState, Coordinates, GeoError, StatusCard};
use quick_evac_ports::{GeolocationPort, ZoneCheckPort};
use quick_evac_shared::{ErrorClass, ErrorCode, ErrorEnvelope};
use std::sync::Arc;

/// Where the local host's position comes from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HostLocation {
    /// Operator-supplied coordinates.
    Fixed(Coordinates),
    /// The operator refused to share a position.
    Denied,
    /// No position source at all.
    Unavailable,
}

impl HostLocation {
    fn into_port(self) -> FixedGeolocation {
        match self {
            Self::Fixed(position) => FixedGeolocation::Position(position),
            Self::Denied => FixedGeolocation::Failing(GeoError::PermissionDenied),
            Self::Unavailable => FixedGeolocation::Unsupported,
        }
    }
}

/// A wired session plus the handles needed to inspect what it drew.
pub struct CheckRuntime {
    /// The session.
    pub session: Arc<CheckSession>,
    /// Renderer shared with the session.
    pub renderer: Arc<MapOverlayRenderer>,
    /// Recorded map.
    pub surface: Arc<RecordingMapSurface>,
}

/// Outcome of one local check.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckReport {
    /// Terminal session state.
    pub state: CheckSessionState,
    /// Result view content, for successful checks.
    pub status_card: Option<StatusCard>,
    /// Drawn scene, for successful checks.
    pub scene: Option<MapScene>,
    /// Fate of the evacuation route, when one was requested.
    pub route: Option<RouteOutcome>,
}

impl CheckReport {
    /// Whether the check ended in a result.
    pub const fn succeeded(&self) -> bool {
        matches!(self.state, CheckSessionState::Success { .. })
    }
}

/// Wire a session against the configured zone-check service.
pub fn build_check_runtime(
    config: &ValidatedClientConfig,
    location: HostLocation,
    observability: &Observability,
) -> InfraResult<CheckRuntime> {
    let zone_check: Arc<dyn ZoneCheckPort> = Arc::new(HttpZoneCheck::new(config)?);
    let geolocation: Arc<dyn GeolocationPort> = Arc::new(location.into_port());
    Ok(build_check_runtime_with(
        config,
        geolocation,
        zone_check,
        observability,
    ))
}

/// Wire a session against explicit geolocation and zone-check ports.
pub fn build_check_runtime_with(
    config: &ValidatedClientConfig,
    geolocation: Arc<dyn GeolocationPort>,
    zone_check: Arc<dyn ZoneCheckPort>,
    observability: &Observability,
) -> CheckRuntime {
    let surface = Arc::new(RecordingMapSurface::new());
    let renderer = Arc::new(
        MapOverlayRenderer::new(OverlayDeps {
            map: surface.clone(),
            directions: Arc::new(StraightLineDirections::default()),
            logger: observability.logger.clone(),
        })
        .with_zoom(config.map_zoom()),
    );
    let session = CheckSession::new(CheckSessionDeps {
        geolocation,
        zone_check,
        renderer: Arc::clone(&renderer),
        logger: observability.logger.clone(),
        telemetry: observability.telemetry.clone(),
    })
    .with_geolocation_options(AcquireLocationOptions {
        timeout: config.geolocation_timeout(),
        high_accuracy: config.geolocation.high_accuracy,
    });

    CheckRuntime {
        session: Arc::new(session),
        renderer,
        surface,
    }
}

/// Submit `phone` and wait for the check and its route to settle.
#[tracing::instrument(name = "infra.check.run", skip_all)]
pub async fn run_check(runtime: &CheckRuntime, phone: &str) -> InfraResult<CheckReport> {
    let outcome = runtime
        .session
        .submit(phone)
        .await
        .map_err(ErrorEnvelope::from)?;
    let state = match outcome {
        SubmitOutcome::Completed(state) => state,
        SubmitOutcome::Rejected | SubmitOutcome::Superseded => {
            return Err(ErrorEnvelope::unexpected(
                ErrorCode::internal(),
                "check session was not idle",
                ErrorClass::NonRetriable,
            ));
        },
    };

    let route = runtime.session.route_settled().await?;
    let scene = match runtime.renderer.map_handle()? {
        Some(map) => runtime.surface.scene(map)?,
        None => None,
    };
    let status_card = match &state {
        CheckSessionState::Success { result, phone } => Some(StatusCard::build(result, phone)),
        _ => None,
    };

    Ok(CheckReport {
        state,
        status_card,
        scene,
        route,
    })
}

/// Run one check to completion on a dedicated runtime.
pub fn run_check_local(
    config: &ValidatedClientConfig,
    phone: &str,
    location: HostLocation,
    observability: &Observability,
) -> InfraResult<CheckReport> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(InfraError::from)?;
    runtime.block_on(async {
        let check = build_check_runtime(config, location, observability)?;
        run_check(&check, phone).await
    })
}
