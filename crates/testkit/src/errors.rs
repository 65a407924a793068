//! Test fixtures for shared error codes and check failures.

use quick_evac_domain::{ApiError, GeoError, RouteLookupFailure};
use quick_evac_shared::{ErrorClass, ErrorCode, ErrorEnvelope};

/// Return a list of common error codes used in tests.
pub fn common_error_codes() -> Vec<ErrorCode> {
    vec![
        ErrorCode::cancelled(),
        ErrorCode::invalid_input(),
        ErrorCode::timeout(),
        ErrorCode::unavailable(),
        ErrorCode::internal(),
    ]
}

/// A cancellation error fixture.
pub fn cancelled_error() -> ErrorEnvelope {
    ErrorEnvelope::cancelled("cancelled")
}

/// A retriable timeout error fixture.
pub fn timeout_error() -> ErrorEnvelope {
    ErrorEnvelope::unexpected(ErrorCode::timeout(), "timeout", ErrorClass::Retriable)
}

/// Every geolocation failure.
pub const fn all_geo_errors() -> [GeoError; 5] {
    [
        GeoError::Unsupported,
        GeoError::PermissionDenied,
        GeoError::PositionUnavailable,
        GeoError::Timeout,
        GeoError::Unknown,
    ]
}

/// A server rejection carrying its own message.
pub fn server_message_error() -> ApiError {
    ApiError::ServerMessage {
        message: "Missing required field: latitude".into(),
        status: 400,
    }
}

/// A bare HTTP failure.
pub fn http_error() -> ApiError {
    ApiError::HttpError {
        status: Some(500),
        detail: "internal server error".into(),
    }
}

/// A transport failure.
pub fn network_error() -> ApiError {
    ApiError::NetworkError {
        detail: "connection refused".into(),
    }
}

/// A route lookup that found nothing.
pub fn no_route() -> RouteLookupFailure {
    RouteLookupFailure::NoRoute {
        status: "ZERO_RESULTS".into(),
    }
}
