//! Failure taxonomy for a location check.
//!
//! Each enum's `Display` output is the exact user-facing message. Diagnostic
//! detail (HTTP status, transport cause) rides along in fields that are only
//! surfaced through the [`ErrorEnvelope`] conversion.

use quick_evac_shared::{ErrorClass, ErrorCode, ErrorEnvelope};
use thiserror::Error;

/// Raw phone input did not contain enough digits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Please enter a valid phone number")]
pub struct PhoneValidationError {
    /// Digits found in the raw input.
    pub digit_count: usize,
}

/// Latitude/longitude outside the WGS84 range.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum CoordinateError {
    /// Latitude outside `[-90, 90]`.
    #[error("latitude {0} is outside [-90, 90]")]
    LatitudeOutOfRange(f64),
    /// Longitude outside `[-180, 180]`.
    #[error("longitude {0} is outside [-180, 180]")]
    LongitudeOutOfRange(f64),
}

/// Why the device position could not be obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum GeoError {
    /// The device has no geolocation capability.
    #[error("Geolocation is not supported by this device.")]
    Unsupported,
    /// The user (or platform policy) refused location access.
    #[error("Location permission denied. Please enable location services.")]
    PermissionDenied,
    /// The platform could not determine a position.
    #[error("Location information is unavailable.")]
    PositionUnavailable,
    /// No fix arrived before the deadline.
    #[error("The request to get user location timed out.")]
    Timeout,
    /// Any other platform failure.
    #[error("An unknown error occurred.")]
    Unknown,
}

impl GeoError {
    /// Map a W3C `GeolocationPositionError.code` onto the taxonomy.
    pub const fn from_platform_code(code: u16) -> Self {
        match code {
            1 => Self::PermissionDenied,
            2 => Self::PositionUnavailable,
            3 => Self::Timeout,
            _ => Self::Unknown,
        }
    }

    /// Stable machine-readable identifier.
    pub const fn code(self) -> &'static str {
        match self {
            Self::Unsupported => "unsupported",
            Self::PermissionDenied => "permission_denied",
            Self::PositionUnavailable => "position_unavailable",
            Self::Timeout => "timeout",
            Self::Unknown => "unknown",
        }
    }
}

impl From<GeoError> for ErrorEnvelope {
    fn from(error: GeoError) -> Self {
        let code = ErrorCode::new("geolocation", error.code());
        match error {
            GeoError::Unsupported | GeoError::PermissionDenied => {
                Self::expected(code, error.to_string())
            },
            GeoError::PositionUnavailable | GeoError::Timeout => {
                Self::unexpected(code, error.to_string(), ErrorClass::Retriable)
            },
            GeoError::Unknown => {
                Self::unexpected(code, error.to_string(), ErrorClass::NonRetriable)
            },
        }
    }
}

/// Why the zone-check request failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// The server rejected the request and explained why.
    #[error("{message}")]
    ServerMessage {
        /// Message supplied by the server, shown verbatim.
        message: Box<str>,
        /// HTTP status of the rejection.
        status: u16,
    },
    /// The server answered, but not with a usable result.
    #[error("An error occurred while processing your request.")]
    HttpError {
        /// HTTP status, when the failure was a status code.
        status: Option<u16>,
        /// Diagnostic detail for logs.
        detail: Box<str>,
    },
    /// The request never produced an HTTP response.
    #[error("An unexpected error occurred. Please try again.")]
    NetworkError {
        /// Diagnostic detail for logs.
        detail: Box<str>,
    },
}

impl ApiError {
    /// Stable machine-readable identifier.
    pub const fn code(&self) -> &'static str {
        match self {
            Self::ServerMessage { .. } => "server_message",
            Self::HttpError { .. } => "http",
            Self::NetworkError { .. } => "network",
        }
    }

    /// The single user-facing message for this failure.
    pub fn user_message(&self) -> String {
        self.to_string()
    }
}

impl From<ApiError> for ErrorEnvelope {
    fn from(error: ApiError) -> Self {
        let code = ErrorCode::new("zone_check", error.code());
        let message = error.to_string();
        match error {
            ApiError::ServerMessage { status, .. } => {
                Self::expected(code, message).with_metadata("status", status.to_string())
            },
            ApiError::HttpError { status, detail } => {
                let envelope = Self::unexpected(code, message, ErrorClass::NonRetriable)
                    .with_metadata("detail", detail);
                match status {
                    Some(status) => envelope.with_metadata("status", status.to_string()),
                    None => envelope,
                }
            },
            ApiError::NetworkError { detail } => {
                Self::unexpected(code, message, ErrorClass::Retriable)
                    .with_metadata("detail", detail)
            },
        }
    }
}

/// Directions lookup failure. Never reaches the session state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteLookupFailure {
    /// The provider answered with a non-OK status.
    #[error("no route found (status {status})")]
    NoRoute {
        /// Provider status string (e.g. `ZERO_RESULTS`).
        status: Box<str>,
    },
    /// The provider could not be reached or returned garbage.
    #[error("directions provider failed: {message}")]
    Provider {
        /// Diagnostic message.
        message: Box<str>,
    },
    /// The lookup was abandoned because the scene was replaced.
    #[error("directions lookup cancelled")]
    Cancelled,
}

impl From<RouteLookupFailure> for ErrorEnvelope {
    fn from(error: RouteLookupFailure) -> Self {
        match &error {
            RouteLookupFailure::NoRoute { .. } => {
                Self::expected(ErrorCode::new("directions", "no_route"), error.to_string())
            },
            RouteLookupFailure::Provider { .. } => Self::unexpected(
                ErrorCode::new("directions", "provider"),
                error.to_string(),
                ErrorClass::Retriable,
            ),
            RouteLookupFailure::Cancelled => Self::cancelled(error.to_string()),
        }
    }
}

/// The payload of a failed check session.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CheckError {
    /// Position acquisition failed.
    #[error(transparent)]
    Geolocation(#[from] GeoError),
    /// The zone check failed.
    #[error(transparent)]
    Api(#[from] ApiError),
}

impl CheckError {
    /// The single user-facing message for this failure.
    pub fn message(&self) -> String {
        self.to_string()
    }

    /// Which stage of the check failed.
    pub const fn stage(&self) -> &'static str {
        match self {
            Self::Geolocation(_) => "geolocation",
            Self::Api(_) => "zone_check",
        }
    }

    /// Stable machine-readable identifier within the stage.
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Geolocation(error) => error.code(),
            Self::Api(error) => error.code(),
        }
    }
}

impl From<CheckError> for ErrorEnvelope {
    fn from(error: CheckError) -> Self {
        match error {
            CheckError::Geolocation(error) => error.into(),
            CheckError::Api(error) => error.into(),
        }
    }
}

impl From<PhoneValidationError> for ErrorEnvelope {
    fn from(error: PhoneValidationError) -> Self {
        Self::expected(ErrorCode::invalid_input(), error.to_string())
            .with_metadata("digitCount", error.digit_count.to_string())
    }
}

impl From<CoordinateError> for ErrorEnvelope {
    fn from(error: CoordinateError) -> Self {
        Self::expected(ErrorCode::new("domain", "invalid_coordinates"), error.to_string())
    }
}
