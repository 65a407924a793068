//! HTTP zone-check adapter (`POST {baseUrl}/location/check`).
//!
//! Failures are classified in three tiers, first match wins:
//! 1. the server supplied a `message` → [`ApiError::ServerMessage`]
//! 2. an HTTP response arrived but was unusable → [`ApiError::HttpError`]
//! 3. no HTTP response at all → [`ApiError::NetworkError`]

use quick_evac_config::ValidatedClientConfig;
use quick_evac_domain::{
    Coordinates, EvacuationInfo, LocationCheckResult, RouteInfo, Zone, ZoneId, ZoneType,
};
use quick_evac_ports::{ApiError, BoxFuture, LocationCheckRequest, ZoneCheckPort};
use quick_evac_shared::{ErrorClass, ErrorCode, ErrorEnvelope, RequestContext, Result};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const CHECK_PATH: &str = "/location/check";

/// Zone-check client backed by `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpZoneCheck {
    client: reqwest::Client,
    endpoint: Box<str>,
}

impl HttpZoneCheck {
    /// Build a client from validated config.
    pub fn new(config: &ValidatedClientConfig) -> Result<Self> {
        Self::with_base_url(config.api_base_url(), config.api_timeout())
    }

    /// Build a client for an explicit base URL.
    pub fn with_base_url(base_url: &str, timeout: Duration) -> Result<Self> {
        let base_url = base_url.trim().trim_end_matches('/');
        if base_url.is_empty() {
            return Err(ErrorEnvelope::expected(
                ErrorCode::invalid_input(),
                "base url must be non-empty",
            ));
        }
        if timeout.is_zero() {
            return Err(ErrorEnvelope::expected(
                ErrorCode::invalid_input(),
                "timeout must be greater than zero",
            ));
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|error| {
                ErrorEnvelope::unexpected(
                    ErrorCode::new("zone_check", "client_init_failed"),
                    format!("failed to build HTTP client: {error}"),
                    ErrorClass::NonRetriable,
                )
            })?;

        Ok(Self {
            client,
            endpoint: format!("{base_url}{CHECK_PATH}").into_boxed_str(),
        })
    }

    /// Full request URL.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    #[tracing::instrument(
        name = "zone_check.http",
        skip_all,
        fields(correlation_id = %ctx.correlation_id().as_str())
    )]
    async fn send(
        &self,
        ctx: &RequestContext,
        request: LocationCheckRequest,
    ) -> std::result::Result<LocationCheckResult, ApiError> {
        let body = CheckLocationBody {
            phone_number: request.phone_number.as_str(),
            latitude: request.location.latitude(),
            longitude: request.location.longitude(),
        };

        let response = tokio::select! {
            () = ctx.cancelled() => return Err(cancelled()),
            result = self.client.post(self.endpoint.as_ref()).json(&body).send() => {
                result.map_err(|error| map_transport_error(&error))?
            }
        };

        let status = response.status();
        let payload = tokio::select! {
            () = ctx.cancelled() => return Err(cancelled()),
            result = response.bytes() => result.map_err(|error| map_transport_error(&error))?,
        };
        tracing::debug!(status = status.as_u16(), bytes = payload.len(), "zone check answered");

        if !status.is_success() {
            return Err(map_http_error(status, &payload));
        }
        decode_success(status, &payload)
    }
}

impl ZoneCheckPort for HttpZoneCheck {
    fn check(
        &self,
        ctx: &RequestContext,
        request: LocationCheckRequest,
    ) -> BoxFuture<'_, std::result::Result<LocationCheckResult, ApiError>> {
        let ctx = ctx.clone();
        Box::pin(async move { self.send(&ctx, request).await })
    }
}

fn cancelled() -> ApiError {
    ApiError::NetworkError {
        detail: "request abandoned".into(),
    }
}

fn map_transport_error(error: &reqwest::Error) -> ApiError {
    let detail = if error.is_timeout() {
        "request timed out".to_owned()
    } else if error.is_connect() {
        format!("connection failed: {error}")
    } else {
        format!("request failed: {error}")
    };
    ApiError::NetworkError {
        detail: detail.into(),
    }
}

fn map_http_error(status: StatusCode, payload: &[u8]) -> ApiError {
    if let Some(message) = server_message(payload) {
        return ApiError::ServerMessage {
            message,
            status: status.as_u16(),
        };
    }
    ApiError::HttpError {
        status: Some(status.as_u16()),
        detail: format!("unexpected status {status}").into(),
    }
}

fn server_message(payload: &[u8]) -> Option<Box<str>> {
    serde_json::from_slice::<ErrorBody>(payload)
        .ok()
        .and_then(|body| body.message)
        .map(|message| message.trim().to_owned())
        .filter(|message| !message.is_empty())
        .map(String::into_boxed_str)
}

fn decode_success(
    status: StatusCode,
    payload: &[u8],
) -> std::result::Result<LocationCheckResult, ApiError> {
    let malformed = |detail: String| ApiError::HttpError {
        status: Some(status.as_u16()),
        detail: detail.into(),
    };

    let body: CheckLocationResponse = serde_json::from_slice(payload)
        .map_err(|error| malformed(format!("failed to decode response: {error}")))?;

    if !body.success {
        return Err(match body.message.filter(|message| !message.trim().is_empty()) {
            Some(message) => ApiError::ServerMessage {
                message: message.trim().into(),
                status: status.as_u16(),
            },
            None => malformed("response reported success=false".to_owned()),
        });
    }

    body.into_result().map_err(malformed)
}

#[derive(Debug, Serialize)]
struct CheckLocationBody<'a> {
    phone_number: &'a str,
    latitude: f64,
    longitude: f64,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
}

const fn default_success() -> bool {
    true
}

#[derive(Debug, Deserialize)]
struct CheckLocationResponse {
    #[serde(default = "default_success")]
    success: bool,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    location: Option<WireLocation>,
    #[serde(default)]
    in_danger_zone: bool,
    #[serde(default)]
    zone: Option<WireZone>,
    #[serde(default)]
    evacuation: Option<WireEvacuation>,
}

impl CheckLocationResponse {
    fn into_result(self) -> std::result::Result<LocationCheckResult, String> {
        let location = self
            .location
            .ok_or_else(|| "response is missing location".to_owned())?;
        let coordinates = coordinates(location.latitude, location.longitude)?;

        let zone = self.zone.map(WireZone::into_zone).transpose()?;
        let evacuation = self
            .evacuation
            .map(WireEvacuation::into_evacuation)
            .transpose()?;

        Ok(LocationCheckResult {
            location: coordinates,
            address: location.address.map(String::into_boxed_str),
            in_danger_zone: self.in_danger_zone,
            zone,
            evacuation,
        })
    }
}

#[derive(Debug, Deserialize)]
struct WireLocation {
    latitude: f64,
    longitude: f64,
    #[serde(default)]
    address: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum WireZoneId {
    Number(i64),
    Text(String),
}

impl WireZoneId {
    fn into_zone_id(self) -> ZoneId {
        match self {
            Self::Number(value) => ZoneId::new(value.to_string()),
            Self::Text(value) => ZoneId::new(value),
        }
    }
}

#[derive(Debug, Deserialize)]
struct WireZone {
    id: WireZoneId,
    name: String,
    #[serde(rename = "type")]
    zone_type: String,
    latitude: f64,
    longitude: f64,
    radius: f64,
    #[serde(default)]
    address: Option<String>,
    #[serde(default)]
    description: Option<String>,
}

impl WireZone {
    fn into_zone(self) -> std::result::Result<Zone, String> {
        if !self.radius.is_finite() || self.radius < 0.0 {
            return Err(format!("zone radius out of range: {}", self.radius));
        }
        Ok(Zone {
            id: self.id.into_zone_id(),
            name: self.name.into_boxed_str(),
            zone_type: ZoneType::parse(&self.zone_type),
            center: coordinates(self.latitude, self.longitude)?,
            radius_km: self.radius,
            address: self.address.map(String::into_boxed_str),
            description: self.description.map(String::into_boxed_str),
        })
    }
}

#[derive(Debug, Deserialize)]
struct WireEvacuation {
    safe_zone: WireZone,
    distance: f64,
    #[serde(default)]
    directions: Option<RouteInfo>,
}

impl WireEvacuation {
    fn into_evacuation(self) -> std::result::Result<EvacuationInfo, String> {
        Ok(EvacuationInfo {
            safe_zone: self.safe_zone.into_zone()?,
            distance_km: self.distance,
            directions: self.directions,
        })
    }
}

fn coordinates(latitude: f64, longitude: f64) -> std::result::Result<Coordinates, String> {
    Coordinates::new(latitude, longitude).map_err(|error| error.to_string())
}
