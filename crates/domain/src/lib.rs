//! # quick-evac-domain
//!
//! Domain model for the location check flow, with no I/O:
//!
//! - **Phone** - validation, normalization, display formatting
//! - **Geo** - validated coordinates, haversine distance, bounds
//! - **Zones** - `ZoneType` discriminant with explicit unknown branch
//! - **Location** - check request/result aggregates
//! - **Classification** - result → display descriptor, status card text
//! - **States** - the check session state machine
//! - **Errors** - the user-facing failure taxonomy
//!
//! ## Dependency Rules
//!
//! - Depends only on the `shared` crate
//! - No infrastructure or adapter dependencies

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

pub mod classify;
pub mod errors;
pub mod geo;
pub mod location;
pub mod phone;
pub mod states;
pub mod status_card;
pub mod zone;

pub use classify::{SeverityColor, ZoneDisplayDescriptor, ZoneIcon, classify};
pub use errors::{
    ApiError, CheckError, CoordinateError, GeoError, PhoneValidationError, RouteLookupFailure,
};
pub use geo::{Coordinates, EARTH_RADIUS_KM, LatLngBounds, haversine_km};
pub use location::{
    EvacuationInfo, LocationCheckRequest, LocationCheckResult, MarkupText, RouteInfo, RouteStep,
};
pub use phone::{MIN_PHONE_DIGITS, NormalizedPhoneNumber};
pub use states::{CheckSessionState, InvalidTransition, SessionEvent};
pub use status_card::{
    EvacuationSummary, RoutePreview, SMS_NOTE, STEP_PREVIEW_LIMIT, StatusCard, StepPreview,
    ZoneSummary,
};
pub use zone::{Severity, Zone, ZoneId, ZoneType};

/// Returns the domain crate version.
#[must_use]
pub const fn domain_crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_crate_compiles() {
        assert!(!domain_crate_version().is_empty());
    }
}
