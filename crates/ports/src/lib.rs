//! # quick-evac-ports
//!
//! Port traits for the quick-evac hexagonal architecture.
//!
//! This crate defines the interfaces between the check flow and the outside
//! world: device geolocation, the zone-check service, the directions
//! provider, the map surface, and observability sinks. It depends only on
//! `domain` and `shared`.

use std::future::Future;
use std::pin::Pin;

/// Boxed future used by async port traits.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Returns the ports crate version.
#[must_use]
pub const fn ports_crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

pub mod directions;
pub mod geolocation;
pub mod logger;
pub mod map;
pub mod telemetry;
pub mod zone_check;

pub use directions::*;
pub use geolocation::*;
pub use logger::*;
pub use map::*;
pub use telemetry::*;
pub use zone_check::*;

// Re-export domain types used in port signatures, so adapter crates can
// implement ports without directly depending on `quick-evac-domain`.
pub use quick_evac_domain::{
    ApiError, Coordinates, GeoError, LatLngBounds, LocationCheckRequest, LocationCheckResult,
    RouteLookupFailure, RouteStep,
};
