//! Integration tests for the check session against in-memory adapters.

use quick_evac_adapters::RecordingMapSurface;
use quick_evac_app::{
    CheckSession, CheckSessionDeps, MapOverlayRenderer, OverlayDeps, RouteOutcome, SubmitOutcome,
    USER_MARKER_TITLE,
};
use quick_evac_domain::{CheckSessionState, Coordinates, GeoError, classify};
use quick_evac_ports::{DirectionsPort, GeolocationPort, LoggerPort, MarkerIcon, ZoneCheckPort};
use quick_evac_testkit::capturing_logger;
use quick_evac_testkit::errors::{network_error, no_route};
use quick_evac_testkit::fixtures::{CheckScenario, check_scenarios, sample_zones};
use quick_evac_testkit::in_memory::{
    FailingZoneCheck, Gate, InMemoryZoneService, ScriptedDirections, ScriptedGeolocation,
};
use std::error::Error;
use std::sync::Arc;

type TestResult = Result<(), Box<dyn Error>>;

struct Harness {
    session: Arc<CheckSession>,
    surface: Arc<RecordingMapSurface>,
    renderer: Arc<MapOverlayRenderer>,
}

fn harness(
    geolocation: Arc<dyn GeolocationPort>,
    zone_check: Arc<dyn ZoneCheckPort>,
    directions: Arc<dyn DirectionsPort>,
    logger: Option<Arc<dyn LoggerPort>>,
) -> Harness {
    let surface = Arc::new(RecordingMapSurface::new());
    let renderer = Arc::new(MapOverlayRenderer::new(OverlayDeps {
        map: surface.clone(),
        directions,
        logger: logger.clone(),
    }));
    let session = Arc::new(CheckSession::new(CheckSessionDeps {
        geolocation,
        zone_check,
        renderer: Arc::clone(&renderer),
        logger,
        telemetry: None,
    }));
    Harness {
        session,
        surface,
        renderer,
    }
}

fn scenario(name: &str) -> Result<CheckScenario, Box<dyn Error>> {
    check_scenarios()?
        .into_iter()
        .find(|scenario| scenario.name == name)
        .ok_or_else(|| format!("missing scenario {name}").into())
}

fn zone_service() -> Result<Arc<InMemoryZoneService>, Box<dyn Error>> {
    Ok(Arc::new(InMemoryZoneService::new(sample_zones()?)))
}

#[tokio::test]
async fn red_zone_check_draws_scene_and_route() -> TestResult {
    let downtown = scenario("downtown")?;
    let geolocation = Arc::new(ScriptedGeolocation::answering(Ok(downtown.location()?)));
    let zones = zone_service()?;
    let directions = Arc::new(ScriptedDirections::straight());
    let h = harness(geolocation, zones.clone(), directions.clone(), None);

    let outcome = h.session.submit("(555) 123-4567").await?;
    let SubmitOutcome::Completed(CheckSessionState::Success { result, phone }) = outcome else {
        return Err(format!("unexpected outcome {outcome:?}").into());
    };
    assert_eq!(phone.as_str(), "5551234567");
    assert_eq!(classify(&result).label, "High Danger Zone");
    assert_eq!(zones.requests().len(), 1);
    assert_eq!(zones.requests()[0].phone_number.as_str(), "5551234567");

    let map = h.renderer.map_handle()?.ok_or("map was not created")?;
    let scene = h.surface.scene(map)?.ok_or("scene missing")?;
    let markers: Vec<_> = scene.markers().collect();
    assert_eq!(markers.len(), 2);
    assert_eq!(&*markers[0].title, USER_MARKER_TITLE);
    assert_eq!(markers[0].icon, MarkerIcon::BlueDot);
    assert_eq!(markers[1].icon, MarkerIcon::GreenDot);
    let circles: Vec<_> = scene.circles().collect();
    assert_eq!(circles.len(), 2);
    assert_eq!(circles[0].fill_color.as_str(), "#ff0000");
    assert_eq!(circles[1].fill_color.as_str(), "#4caf50");
    assert_eq!(scene.polylines().count(), 0);

    let route = h.session.route_settled().await?;
    assert!(matches!(route, Some(RouteOutcome::Drawn { .. })));
    assert_eq!(directions.calls(), 1);
    let scene = h.surface.scene(map)?.ok_or("scene missing")?;
    assert_eq!(scene.polylines().count(), 1);
    Ok(())
}

#[tokio::test]
async fn safe_result_draws_only_the_user_marker() -> TestResult {
    let outside = scenario("outside")?;
    let geolocation = Arc::new(ScriptedGeolocation::answering(Ok(outside.location()?)));
    let h = harness(
        geolocation,
        zone_service()?,
        Arc::new(ScriptedDirections::straight()),
        None,
    );

    let outcome = h.session.submit("555.123.4567").await?;
    assert!(matches!(
        outcome,
        SubmitOutcome::Completed(CheckSessionState::Success { .. })
    ));

    let map = h.renderer.map_handle()?.ok_or("map was not created")?;
    let scene = h.surface.scene(map)?.ok_or("scene missing")?;
    assert_eq!(scene.markers().count(), 1);
    assert_eq!(scene.circles().count(), 0);
    assert_eq!(h.session.route_settled().await?, None);
    Ok(())
}

#[tokio::test]
async fn invalid_phone_leaves_session_idle() -> TestResult {
    let geolocation = Arc::new(ScriptedGeolocation::answering(Ok(Coordinates::new(
        37.7749, -122.4194,
    )?)));
    let h = harness(
        geolocation.clone(),
        zone_service()?,
        Arc::new(ScriptedDirections::straight()),
        None,
    );

    let error = h
        .session
        .submit("555-1234")
        .await
        .err()
        .ok_or("short number was accepted")?;
    assert_eq!(error.digit_count, 7);
    assert_eq!(h.session.state(), CheckSessionState::Idle);
    assert!(geolocation.requests().is_empty());
    Ok(())
}

#[tokio::test]
async fn geolocation_failure_skips_zone_check() -> TestResult {
    let geolocation = Arc::new(ScriptedGeolocation::answering(Err(
        GeoError::PermissionDenied,
    )));
    let zones = zone_service()?;
    let h = harness(
        geolocation,
        zones.clone(),
        Arc::new(ScriptedDirections::straight()),
        None,
    );

    let outcome = h.session.submit("5551234567").await?;
    let SubmitOutcome::Completed(state) = outcome else {
        return Err("check did not complete".into());
    };
    assert_eq!(
        state.error_message().as_deref(),
        Some("Location permission denied. Please enable location services.")
    );
    assert!(zones.requests().is_empty());
    assert_eq!(h.renderer.map_handle()?, None);
    Ok(())
}

#[tokio::test]
async fn unsupported_device_fails_without_a_request() -> TestResult {
    let geolocation = Arc::new(ScriptedGeolocation::unsupported());
    let h = harness(
        geolocation.clone(),
        zone_service()?,
        Arc::new(ScriptedDirections::straight()),
        None,
    );

    let outcome = h.session.submit("5551234567").await?;
    let SubmitOutcome::Completed(CheckSessionState::Failed { error }) = outcome else {
        return Err("check did not fail".into());
    };
    assert_eq!(error.stage(), "geolocation");
    assert_eq!(error.code(), GeoError::Unsupported.code());
    assert!(geolocation.requests().is_empty());
    Ok(())
}

#[tokio::test]
async fn network_failure_ends_in_failed_without_a_map() -> TestResult {
    let geolocation = Arc::new(ScriptedGeolocation::answering(Ok(Coordinates::new(
        40.0, -75.0,
    )?)));
    let h = harness(
        geolocation,
        Arc::new(FailingZoneCheck(network_error())),
        Arc::new(ScriptedDirections::straight()),
        None,
    );

    let outcome = h.session.submit("5551234567").await?;
    let SubmitOutcome::Completed(CheckSessionState::Failed { error }) = outcome else {
        return Err("check did not fail".into());
    };
    assert_eq!(error.stage(), "zone_check");
    assert_eq!(error.code(), "network");
    assert_eq!(h.renderer.map_handle()?, None);
    assert_eq!(h.surface.maps_created()?, 0);
    Ok(())
}

#[tokio::test]
async fn directions_failure_keeps_the_result() -> TestResult {
    let waterfront = scenario("waterfront")?;
    let geolocation = Arc::new(ScriptedGeolocation::answering(Ok(waterfront.location()?)));
    let h = harness(
        geolocation,
        zone_service()?,
        Arc::new(ScriptedDirections::failing(no_route())),
        None,
    );

    let outcome = h.session.submit("5551234567").await?;
    assert!(matches!(
        outcome,
        SubmitOutcome::Completed(CheckSessionState::Success { .. })
    ));
    assert_eq!(
        h.session.route_settled().await?,
        Some(RouteOutcome::Omitted(no_route()))
    );
    assert!(matches!(h.session.state(), CheckSessionState::Success { .. }));

    let map = h.renderer.map_handle()?.ok_or("map was not created")?;
    let scene = h.surface.scene(map)?.ok_or("scene missing")?;
    assert_eq!(scene.polylines().count(), 0);
    assert_eq!(scene.circles().count(), 2);
    Ok(())
}

#[tokio::test]
async fn second_submission_while_busy_is_rejected() -> TestResult {
    let gate = Gate::new();
    let geolocation = Arc::new(
        ScriptedGeolocation::answering(Ok(Coordinates::new(37.70, -122.30)?))
            .with_gate(gate.clone()),
    );
    let h = harness(
        geolocation.clone(),
        zone_service()?,
        Arc::new(ScriptedDirections::straight()),
        None,
    );

    let mut states = h.session.subscribe();
    let first = tokio::spawn({
        let session = Arc::clone(&h.session);
        async move { session.submit("5551234567").await }
    });
    states.wait_for(CheckSessionState::is_busy).await?;

    assert_eq!(
        h.session.submit("(555) 765-4321").await?,
        SubmitOutcome::Rejected
    );
    assert_eq!(geolocation.requests().len(), 1);

    gate.release();
    let outcome = first.await??;
    assert!(matches!(
        outcome,
        SubmitOutcome::Completed(CheckSessionState::Success { .. })
    ));

    assert_eq!(h.session.submit("5551234567").await?, SubmitOutcome::Rejected);
    Ok(())
}

#[tokio::test]
async fn reset_during_check_discards_the_late_result() -> TestResult {
    let gate = Gate::new();
    let zones = Arc::new(InMemoryZoneService::new(sample_zones()?).with_gate(gate.clone()));
    let geolocation = Arc::new(ScriptedGeolocation::answering(Ok(Coordinates::new(
        37.7749, -122.4194,
    )?)));
    let h = harness(
        geolocation,
        zones.clone(),
        Arc::new(ScriptedDirections::straight()),
        None,
    );

    let mut states = h.session.subscribe();
    let pending = tokio::spawn({
        let session = Arc::clone(&h.session);
        async move { session.submit("5551234567").await }
    });
    states
        .wait_for(|state| matches!(state, CheckSessionState::CheckingZone { .. }))
        .await?;

    h.session.reset()?;
    gate.release();

    assert_eq!(pending.await??, SubmitOutcome::Superseded);
    assert_eq!(h.session.state(), CheckSessionState::Idle);
    assert_eq!(h.renderer.map_handle()?, None);
    assert_eq!(zones.requests().len(), 1);
    Ok(())
}

#[tokio::test]
async fn failed_check_blocks_submission_until_reset() -> TestResult {
    let here = Coordinates::new(40.0, -75.0)?;
    let geolocation = Arc::new(ScriptedGeolocation::answering(Ok(here)).then(Ok(here)));
    let h = harness(
        geolocation.clone(),
        Arc::new(FailingZoneCheck(network_error())),
        Arc::new(ScriptedDirections::straight()),
        None,
    );
    let mut states = h.session.subscribe();

    h.session.submit("5551234567").await?;
    assert_eq!(h.session.state().name(), "failed");
    assert_eq!(h.session.submit("5551234567").await?, SubmitOutcome::Rejected);
    assert_eq!(geolocation.requests().len(), 1);

    states.mark_unchanged();
    h.session.reset()?;
    assert!(states.has_changed()?);
    assert_eq!(*states.borrow_and_update(), CheckSessionState::Idle);

    let outcome = h.session.submit("5551234567").await?;
    assert!(matches!(
        outcome,
        SubmitOutcome::Completed(CheckSessionState::Failed { .. })
    ));
    assert_eq!(geolocation.requests().len(), 2);
    Ok(())
}

#[tokio::test]
async fn reset_after_success_releases_the_map() -> TestResult {
    let downtown = scenario("downtown")?;
    let geolocation = Arc::new(
        ScriptedGeolocation::answering(Ok(downtown.location()?)).then(Ok(downtown.location()?)),
    );
    let h = harness(
        geolocation,
        zone_service()?,
        Arc::new(ScriptedDirections::straight()),
        None,
    );

    h.session.submit("5551234567").await?;
    h.session.route_settled().await?;
    assert_eq!(h.surface.live_maps()?.len(), 1);

    h.session.reset()?;
    assert_eq!(h.session.state(), CheckSessionState::Idle);
    assert!(h.surface.live_maps()?.is_empty());

    let outcome = h.session.submit("5551234567").await?;
    assert!(matches!(
        outcome,
        SubmitOutcome::Completed(CheckSessionState::Success { .. })
    ));
    assert_eq!(h.surface.maps_created()?, 2);
    Ok(())
}

#[tokio::test]
async fn every_scenario_ends_in_the_expected_status() -> TestResult {
    for expected in check_scenarios()? {
        let geolocation = Arc::new(ScriptedGeolocation::answering(Ok(expected.location()?)));
        let h = harness(
            geolocation,
            zone_service()?,
            Arc::new(ScriptedDirections::straight()),
            None,
        );

        let outcome = h.session.submit("5551234567").await?;
        let SubmitOutcome::Completed(state) = outcome else {
            return Err(format!("scenario {} did not complete", expected.name).into());
        };
        let result = state
            .result()
            .ok_or_else(|| format!("scenario {} has no result", expected.name))?;
        assert_eq!(
            classify(result).label,
            expected.expected_label,
            "scenario {}",
            expected.name
        );
        assert_eq!(
            h.session.route_settled().await?.is_some(),
            expected.expects_evacuation,
            "scenario {}",
            expected.name
        );
    }
    Ok(())
}

#[tokio::test]
async fn session_logs_transitions_with_masked_phone() -> TestResult {
    let (sink, logger) = capturing_logger();
    let geolocation = Arc::new(ScriptedGeolocation::answering(Ok(Coordinates::new(
        37.70, -122.30,
    )?)));
    let h = harness(
        geolocation,
        zone_service()?,
        Arc::new(ScriptedDirections::straight()),
        Some(logger),
    );

    h.session.submit("5551234567").await?;

    let lines = sink.take()?;
    let transitions = lines
        .iter()
        .filter(|line| line.contains("client.session.transition"))
        .count();
    assert_eq!(transitions, 3);
    assert!(lines.iter().any(|line| line.contains("client.overlay.render")));
    assert!(lines.iter().all(|line| !line.contains("5551234567")));
    assert!(lines.iter().any(|line| line.contains("******4567")));
    Ok(())
}
