//! Directions provider boundary contract.

use crate::BoxFuture;
use quick_evac_domain::{Coordinates, RouteLookupFailure, RouteStep};
use quick_evac_shared::RequestContext;
use serde::Serialize;

/// How the route will be travelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TravelMode {
    /// By car.
    #[default]
    Driving,
}

/// Route request between two points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DirectionsQuery {
    /// Start (the user's position).
    pub origin: Coordinates,
    /// End (the safe zone center).
    pub destination: Coordinates,
    /// Travel mode.
    pub mode: TravelMode,
}

impl DirectionsQuery {
    /// Driving directions from `origin` to `destination`.
    pub const fn driving(origin: Coordinates, destination: Coordinates) -> Self {
        Self {
            origin,
            destination,
            mode: TravelMode::Driving,
        }
    }
}

/// A drawable route.
#[derive(Debug, Clone, PartialEq)]
pub struct RoutePath {
    /// Polyline vertices from origin to destination.
    pub path: Vec<Coordinates>,
    /// Total distance text.
    pub distance: Box<str>,
    /// Total duration text.
    pub duration: Box<str>,
    /// Turn-by-turn instructions, in travel order.
    pub steps: Vec<RouteStep>,
}

/// Boundary contract for the mapping provider's directions service.
pub trait DirectionsPort: Send + Sync {
    /// Look up a route.
    fn route(
        &self,
        ctx: &RequestContext,
        query: DirectionsQuery,
    ) -> BoxFuture<'_, Result<RoutePath, RouteLookupFailure>>;
}
