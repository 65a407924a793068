//! Map surface boundary contract.
//!
//! The surface is a stateful, synchronous resource: overlays are added and
//! removed by id. Only the overlay renderer talks to it.

use quick_evac_domain::{Coordinates, LatLngBounds};
use quick_evac_shared::Result;
use serde::Serialize;
use std::fmt;

/// Handle to a created map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct MapHandle(u64);

impl MapHandle {
    /// Wrap a surface-assigned id.
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Raw id.
    pub const fn get(self) -> u64 {
        self.0
    }
}

/// Handle to an overlay on a map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct OverlayId(u64);

impl OverlayId {
    /// Wrap a surface-assigned id.
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Raw id.
    pub const fn get(self) -> u64 {
        self.0
    }
}

/// A `#rrggbb` color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct HexColor(&'static str);

impl HexColor {
    /// Wrap a `#rrggbb` literal.
    pub const fn new(value: &'static str) -> Self {
        Self(value)
    }

    /// The literal.
    pub const fn as_str(self) -> &'static str {
        self.0
    }
}

impl fmt::Display for HexColor {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.0)
    }
}

/// Initial camera.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MapOptions {
    /// Camera center.
    pub center: Coordinates,
    /// Zoom level (13 is city scale).
    pub zoom: u32,
}

/// Marker icon set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkerIcon {
    /// Blue dot.
    BlueDot,
    /// Green dot.
    GreenDot,
}

/// A point marker.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarkerSpec {
    /// Position.
    pub position: Coordinates,
    /// Hover title.
    pub title: Box<str>,
    /// Icon.
    pub icon: MarkerIcon,
}

/// A filled circle.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CircleSpec {
    /// Center.
    pub center: Coordinates,
    /// Radius in metres.
    pub radius_m: f64,
    /// Fill color.
    pub fill_color: HexColor,
    /// Fill opacity in `[0, 1]`.
    pub fill_opacity: f32,
    /// Stroke color.
    pub stroke_color: HexColor,
    /// Stroke width in pixels.
    pub stroke_weight: u32,
}

/// A route line.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PolylineSpec {
    /// Vertices.
    pub path: Vec<Coordinates>,
    /// Line color.
    pub stroke_color: HexColor,
    /// Line width in pixels.
    pub stroke_weight: u32,
}

/// Boundary contract for an interactive map.
pub trait MapSurfacePort: Send + Sync {
    /// Create a map and return its handle.
    fn create_map(&self, options: MapOptions) -> Result<MapHandle>;

    /// Add a marker.
    fn add_marker(&self, map: MapHandle, marker: MarkerSpec) -> Result<OverlayId>;

    /// Add a circle.
    fn add_circle(&self, map: MapHandle, circle: CircleSpec) -> Result<OverlayId>;

    /// Add a polyline.
    fn add_polyline(&self, map: MapHandle, polyline: PolylineSpec) -> Result<OverlayId>;

    /// Remove one overlay. Removing an unknown overlay is an error.
    fn remove_overlay(&self, map: MapHandle, overlay: OverlayId) -> Result<()>;

    /// Move the camera so the bounds are visible.
    fn fit_bounds(&self, map: MapHandle, bounds: LatLngBounds) -> Result<()>;

    /// Destroy the map and every overlay on it.
    fn release_map(&self, map: MapHandle) -> Result<()>;
}
