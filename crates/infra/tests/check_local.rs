//! Integration tests for the local check composition root.

use quick_evac_config::{ClientEnv, ValidatedClientConfig, load_client_config_from_sources};
use quick_evac_domain::{CheckSessionState, Coordinates};
use quick_evac_infra::{
    HostLocation, Observability, build_check_runtime, observability_from_map, run_check,
    run_check_local,
};
use quick_evac_ports::MarkerIcon;
use quick_evac_testkit::MemoryLogSink;
use serde_json::json;
use std::collections::BTreeMap;
use std::error::Error;
use std::sync::Arc;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

type TestResult = Result<(), Box<dyn Error>>;

fn config_for(base_url: &str) -> Result<ValidatedClientConfig, Box<dyn Error>> {
    let overrides = json!({ "api": { "baseUrl": base_url } }).to_string();
    Ok(load_client_config_from_sources(
        None,
        Some(&overrides),
        &ClientEnv::default(),
    )?)
}

fn red_zone_body() -> serde_json::Value {
    json!({
        "success": true,
        "location": {
            "latitude": 37.7749,
            "longitude": -122.4194,
            "address": "Market St, San Francisco"
        },
        "in_danger_zone": true,
        "zone": {
            "id": 1,
            "name": "Downtown Danger Zone",
            "type": "RED",
            "latitude": 37.7749,
            "longitude": -122.4194,
            "radius": 1.0,
            "description": "High risk area due to potential flooding and structural hazards."
        },
        "evacuation": {
            "safe_zone": {
                "id": 5,
                "name": "Central Park Safe Zone",
                "type": "GREEN",
                "latitude": 37.7694,
                "longitude": -122.4862,
                "radius": 1.5
            },
            "distance": 5.9,
            "directions": {
                "distance": "7.2 km",
                "duration": "18 mins",
                "start_address": "Market St",
                "end_address": "Golden Gate Park",
                "steps": [
                    { "instruction": "Head <b>west</b> on Market St", "distance": "1.0 km", "duration": "3 mins" }
                ]
            }
        }
    })
}

#[tokio::test]
async fn red_zone_check_produces_card_and_scene() -> TestResult {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/location/check"))
        .respond_with(ResponseTemplate::new(200).set_body_json(red_zone_body()))
        .mount(&server)
        .await;

    let config = config_for(&format!("{}/api", server.uri()))?;
    let runtime = build_check_runtime(
        &config,
        HostLocation::Fixed(Coordinates::new(37.7749, -122.4194)?),
        &Observability::disabled(),
    )?;
    let report = run_check(&runtime, "(555) 123-4567").await?;

    assert!(report.succeeded());
    let card = report.status_card.ok_or("status card missing")?;
    assert_eq!(card.descriptor.label, "High Danger Zone");
    assert_eq!(card.location, "Market St, San Francisco");

    let scene = report.scene.ok_or("scene missing")?;
    assert_eq!(scene.options.zoom, config.map_zoom());
    let icons: Vec<_> = scene.markers().map(|marker| marker.icon).collect();
    assert_eq!(icons, vec![MarkerIcon::BlueDot, MarkerIcon::GreenDot]);
    assert_eq!(scene.polylines().count(), 1);
    assert!(scene.fitted_bounds.is_some());
    Ok(())
}

#[tokio::test]
async fn denied_location_never_calls_the_service() -> TestResult {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(red_zone_body()))
        .expect(0)
        .mount(&server)
        .await;

    let config = config_for(&format!("{}/api", server.uri()))?;
    let runtime = build_check_runtime(&config, HostLocation::Denied, &Observability::disabled())?;
    let report = run_check(&runtime, "5551234567").await?;

    assert_eq!(
        report.state.error_message().as_deref(),
        Some("Location permission denied. Please enable location services.")
    );
    assert!(report.scene.is_none());
    assert!(report.status_card.is_none());
    Ok(())
}

#[tokio::test]
async fn server_rejection_message_reaches_the_state() -> TestResult {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/location/check"))
        .respond_with(
            ResponseTemplate::new(400)
                .set_body_json(json!({ "success": false, "message": "Invalid phone number" })),
        )
        .mount(&server)
        .await;

    let config = config_for(&format!("{}/api", server.uri()))?;
    let sink = Arc::new(MemoryLogSink::default());
    let env: BTreeMap<String, String> =
        BTreeMap::from([("QEVAC_LOG_FORMAT".to_owned(), "json".to_owned())]);
    let observability = observability_from_map(&env, sink.clone());
    let runtime = build_check_runtime(
        &config,
        HostLocation::Fixed(Coordinates::new(40.0, -75.0)?),
        &observability,
    )?;
    let report = run_check(&runtime, "5551234567").await?;

    let CheckSessionState::Failed { error } = &report.state else {
        return Err("check did not fail".into());
    };
    assert_eq!(error.message(), "Invalid phone number");
    let lines = sink.take()?;
    assert!(lines.iter().any(|line| line.contains("client.session.failed")));
    assert!(lines.iter().all(|line| !line.contains("5551234567")));
    Ok(())
}

#[test]
fn unreachable_service_ends_in_network_error() -> TestResult {
    let config = config_for("http://127.0.0.1:9/api")?;
    let report = run_check_local(
        &config,
        "5551234567",
        HostLocation::Fixed(Coordinates::new(40.0, -75.0)?),
        &Observability::disabled(),
    )?;

    let CheckSessionState::Failed { error } = &report.state else {
        return Err("check did not fail".into());
    };
    assert_eq!(error.code(), "network");
    assert_eq!(
        error.message(),
        "An unexpected error occurred. Please try again."
    );
    Ok(())
}

#[test]
fn invalid_phone_is_an_expected_error() -> TestResult {
    let config = config_for("http://127.0.0.1:9/api")?;
    let error = run_check_local(
        &config,
        "12345",
        HostLocation::Unavailable,
        &Observability::disabled(),
    )
    .err()
    .ok_or("short number was accepted")?;
    assert_eq!(error.kind, quick_evac_shared::ErrorKind::Expected);
    Ok(())
}
