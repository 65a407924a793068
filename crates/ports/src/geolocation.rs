//! Device geolocation boundary contract.

use crate::BoxFuture;
use quick_evac_domain::{Coordinates, GeoError};
use quick_evac_shared::RequestContext;
use std::time::Duration;

/// Options for a single position request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionOptions {
    /// Ask for GPS-grade accuracy.
    pub high_accuracy: bool,
    /// Platform-side deadline.
    pub timeout: Duration,
    /// Oldest cached fix the platform may return. Zero forces a fresh fix.
    pub maximum_age: Duration,
}

impl PositionOptions {
    /// Fresh, high-accuracy fix within `timeout`.
    pub const fn fresh(timeout: Duration) -> Self {
        Self {
            high_accuracy: true,
            timeout,
            maximum_age: Duration::ZERO,
        }
    }
}

/// Boundary contract for the platform geolocation capability.
pub trait GeolocationPort: Send + Sync {
    /// Whether the device can provide a position at all.
    fn is_supported(&self) -> bool;

    /// Request one position fix. Implementations must resolve exactly once.
    fn current_position(
        &self,
        ctx: &RequestContext,
        options: PositionOptions,
    ) -> BoxFuture<'_, Result<Coordinates, GeoError>>;
}
