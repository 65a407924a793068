//! HTTP zone-check adapter against a mock server.
#![allow(missing_docs)]

use quick_evac_adapters::HttpZoneCheck;
use quick_evac_domain::{NormalizedPhoneNumber, ZoneType};
use quick_evac_ports::{ApiError, Coordinates, LocationCheckRequest, ZoneCheckPort};
use quick_evac_shared::RequestContext;
use serde_json::json;
use std::error::Error;
use std::time::Duration;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn request() -> Result<LocationCheckRequest, Box<dyn Error>> {
    let phone = NormalizedPhoneNumber::parse("(555) 123-4567")?;
    let location = Coordinates::new(40.0, -75.0)?;
    Ok(LocationCheckRequest::new(phone, location))
}

async fn client_for(server: &MockServer) -> Result<HttpZoneCheck, Box<dyn Error>> {
    let base_url = format!("{}/api", server.uri());
    Ok(HttpZoneCheck::with_base_url(&base_url, Duration::from_secs(5))?)
}

#[tokio::test]
async fn posts_documented_body_and_decodes_result() -> Result<(), Box<dyn Error>> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/location/check"))
        .and(header("content-type", "application/json"))
        .and(body_json(json!({
            "phone_number": "5551234567",
            "latitude": 40.0,
            "longitude": -75.0
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "location": { "latitude": 40.0, "longitude": -75.0, "address": "1 Main St" },
            "in_danger_zone": true,
            "zone": {
                "id": 3, "name": "Flood Plain", "type": "ORANGE",
                "latitude": 40.0, "longitude": -75.0, "radius": 1.5
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server).await?;
    let result = client.check(&RequestContext::new_check(), request()?).await?;

    assert!(result.in_danger_zone);
    assert_eq!(
        result.danger_zone().map(|zone| zone.zone_type.clone()),
        Some(ZoneType::Orange)
    );
    assert!(result.evacuation.is_none());
    Ok(())
}

#[tokio::test]
async fn server_message_wins_on_error_status() -> Result<(), Box<dyn Error>> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/location/check"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "success": false,
            "message": "Missing required field: latitude"
        })))
        .mount(&server)
        .await;

    let client = client_for(&server).await?;
    let error = client
        .check(&RequestContext::new_check(), request()?)
        .await
        .err();

    assert_eq!(
        error,
        Some(ApiError::ServerMessage {
            message: "Missing required field: latitude".into(),
            status: 400,
        })
    );
    Ok(())
}

#[tokio::test]
async fn bare_server_error_is_generic_http_error() -> Result<(), Box<dyn Error>> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/location/check"))
        .respond_with(ResponseTemplate::new(500).set_body_string("Internal Server Error"))
        .mount(&server)
        .await;

    let client = client_for(&server).await?;
    let error = client
        .check(&RequestContext::new_check(), request()?)
        .await
        .err();

    assert!(matches!(
        error,
        Some(ApiError::HttpError {
            status: Some(500),
            ..
        })
    ));
    assert_eq!(
        error.map(|error| error.user_message()),
        Some("An error occurred while processing your request.".to_owned())
    );
    Ok(())
}

#[tokio::test]
async fn malformed_success_payload_is_http_error() -> Result<(), Box<dyn Error>> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/location/check"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let client = client_for(&server).await?;
    let error = client
        .check(&RequestContext::new_check(), request()?)
        .await
        .err();

    assert!(matches!(
        error,
        Some(ApiError::HttpError {
            status: Some(200),
            ..
        })
    ));
    Ok(())
}

#[tokio::test]
async fn unreachable_server_is_network_error() -> Result<(), Box<dyn Error>> {
    let server = MockServer::start().await;
    let base_url = format!("{}/api", server.uri());
    drop(server);

    let client = HttpZoneCheck::with_base_url(&base_url, Duration::from_secs(2))?;
    let error = client
        .check(&RequestContext::new_check(), request()?)
        .await
        .err();

    assert!(matches!(error, Some(ApiError::NetworkError { .. })));
    assert_eq!(
        error.map(|error| error.user_message()),
        Some("An unexpected error occurred. Please try again.".to_owned())
    );
    Ok(())
}
