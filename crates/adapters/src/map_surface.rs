//! In-memory map surface that records the scene instead of drawing it.
//!
//! Hosts without a graphical map (the CLI, tests) render into this surface
//! and then inspect or print the resulting scene.

use quick_evac_ports::{
    CircleSpec, LatLngBounds, MapHandle, MapOptions, MapSurfacePort, MarkerSpec, OverlayId,
    PolylineSpec,
};
use quick_evac_shared::{ErrorClass, ErrorCode, ErrorEnvelope, Result};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

/// One drawn primitive.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Overlay {
    /// Point marker.
    Marker(MarkerSpec),
    /// Filled circle.
    Circle(CircleSpec),
    /// Route line.
    Polyline(PolylineSpec),
}

/// Everything currently on one map.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MapScene {
    /// Options the map was created with.
    pub options: MapOptions,
    /// Overlays in insertion order.
    pub overlays: BTreeMap<OverlayId, Overlay>,
    /// Last bounds the camera was fitted to.
    pub fitted_bounds: Option<LatLngBounds>,
}

impl MapScene {
    /// Markers in insertion order.
    pub fn markers(&self) -> impl Iterator<Item = &MarkerSpec> {
        self.overlays.values().filter_map(|overlay| match overlay {
            Overlay::Marker(marker) => Some(marker),
            _ => None,
        })
    }

    /// Circles in insertion order.
    pub fn circles(&self) -> impl Iterator<Item = &CircleSpec> {
        self.overlays.values().filter_map(|overlay| match overlay {
            Overlay::Circle(circle) => Some(circle),
            _ => None,
        })
    }

    /// Polylines in insertion order.
    pub fn polylines(&self) -> impl Iterator<Item = &PolylineSpec> {
        self.overlays.values().filter_map(|overlay| match overlay {
            Overlay::Polyline(polyline) => Some(polyline),
            _ => None,
        })
    }
}

#[derive(Debug, Default)]
struct SurfaceState {
    next_id: u64,
    maps: BTreeMap<MapHandle, MapScene>,
    created: u64,
}

impl SurfaceState {
    const fn allocate(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn scene_mut(&mut self, map: MapHandle) -> Result<&mut MapScene> {
        self.maps.get_mut(&map).ok_or_else(|| unknown_map(map))
    }

    fn add(&mut self, map: MapHandle, overlay: Overlay) -> Result<OverlayId> {
        let id = OverlayId::new(self.allocate());
        self.scene_mut(map)?.overlays.insert(id, overlay);
        Ok(id)
    }
}

/// Map surface that keeps every scene in memory.
#[derive(Debug, Default)]
pub struct RecordingMapSurface {
    state: Mutex<SurfaceState>,
}

impl RecordingMapSurface {
    /// Create an empty surface.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of one map, if it is still alive.
    pub fn scene(&self, map: MapHandle) -> Result<Option<MapScene>> {
        Ok(self.lock()?.maps.get(&map).cloned())
    }

    /// Handles of every live map.
    pub fn live_maps(&self) -> Result<Vec<MapHandle>> {
        Ok(self.lock()?.maps.keys().copied().collect())
    }

    /// How many maps were ever created on this surface.
    pub fn maps_created(&self) -> Result<u64> {
        Ok(self.lock()?.created)
    }

    fn lock(&self) -> Result<MutexGuard<'_, SurfaceState>> {
        self.state.lock().map_err(|_| {
            ErrorEnvelope::unexpected(
                ErrorCode::internal(),
                "map surface lock poisoned",
                ErrorClass::NonRetriable,
            )
        })
    }
}

impl MapSurfacePort for RecordingMapSurface {
    fn create_map(&self, options: MapOptions) -> Result<MapHandle> {
        let mut state = self.lock()?;
        let handle = MapHandle::new(state.allocate());
        state.created += 1;
        state.maps.insert(
            handle,
            MapScene {
                options,
                overlays: BTreeMap::new(),
                fitted_bounds: None,
            },
        );
        Ok(handle)
    }

    fn add_marker(&self, map: MapHandle, marker: MarkerSpec) -> Result<OverlayId> {
        self.lock()?.add(map, Overlay::Marker(marker))
    }

    fn add_circle(&self, map: MapHandle, circle: CircleSpec) -> Result<OverlayId> {
        self.lock()?.add(map, Overlay::Circle(circle))
    }

    fn add_polyline(&self, map: MapHandle, polyline: PolylineSpec) -> Result<OverlayId> {
        self.lock()?.add(map, Overlay::Polyline(polyline))
    }

    fn remove_overlay(&self, map: MapHandle, overlay: OverlayId) -> Result<()> {
        let mut state = self.lock()?;
        let scene = state.scene_mut(map)?;
        if scene.overlays.remove(&overlay).is_none() {
            return Err(ErrorEnvelope::expected(
                ErrorCode::new("map", "unknown_overlay"),
                "overlay is not on this map",
            )
            .with_metadata("map", map.get().to_string())
            .with_metadata("overlay", overlay.get().to_string()));
        }
        Ok(())
    }

    fn fit_bounds(&self, map: MapHandle, bounds: LatLngBounds) -> Result<()> {
        self.lock()?.scene_mut(map)?.fitted_bounds = Some(bounds);
        Ok(())
    }

    fn release_map(&self, map: MapHandle) -> Result<()> {
        self.lock()?
            .maps
            .remove(&map)
            .map(|_| ())
            .ok_or_else(|| unknown_map(map))
    }
}

fn unknown_map(map: MapHandle) -> ErrorEnvelope {
    ErrorEnvelope::expected(ErrorCode::new("map", "unknown_map"), "map does not exist")
        .with_metadata("map", map.get().to_string())
}
