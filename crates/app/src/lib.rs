//! # quick-evac-app
//!
//! Application use cases for the location check flow: position acquisition,
//! the zone check, the check session state machine, and the map overlay
//! renderer.
//! This crate depends on `ports`, `domain`, and `shared`.

pub mod check_zone;
pub mod geolocation;
pub mod overlay;
pub mod session;

pub use check_zone::{CheckZoneDeps, check_zone};
pub use geolocation::{
    AcquireLocationDeps, AcquireLocationOptions, DEFAULT_GEOLOCATION_TIMEOUT, acquire_location,
};
pub use overlay::{
    DEFAULT_MAP_ZOOM, MapOverlayRenderer, OverlayDeps, RenderReport, RouteOutcome,
    USER_MARKER_TITLE, zone_color,
};
pub use session::{CheckSession, CheckSessionDeps, SubmitOutcome};

/// Returns the app crate version.
#[must_use]
pub const fn app_crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
