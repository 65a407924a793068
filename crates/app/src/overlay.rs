//! Map overlay renderer.
//!
//! Owns the map resource for a session: the map is created lazily on the
//! first render and reused afterwards. Each render clears the overlays of the
//! previous one before drawing. The route is looked up on a spawned task so
//! the rest of the scene is visible while directions are pending; a route that
//! arrives after a newer render or a teardown is dropped.

use quick_evac_domain::{LatLngBounds, LocationCheckResult, RouteLookupFailure, ZoneType};
use quick_evac_ports::{
    CircleSpec, DirectionsPort, DirectionsQuery, HexColor, LogFields, LoggerPort, MapHandle,
    MapOptions, MapSurfacePort, MarkerIcon, MarkerSpec, OverlayId, PolylineSpec, RoutePath,
};
use quick_evac_shared::{ErrorClass, ErrorCode, ErrorEnvelope, RequestContext, Result};
use serde_json::Value;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

/// City-scale zoom.
pub const DEFAULT_MAP_ZOOM: u32 = 13;

const RED: HexColor = HexColor::new("#ff0000");
const ORANGE: HexColor = HexColor::new("#ff9800");
const GREEN: HexColor = HexColor::new("#4caf50");

const ZONE_FILL_OPACITY: f32 = 0.3;
const ZONE_STROKE_WEIGHT: u32 = 1;
const ROUTE_STROKE_WEIGHT: u32 = 5;

/// Title of the user's marker.
pub const USER_MARKER_TITLE: &str = "Your Location";

/// Circle color for a zone type. Unrecognized types draw as red.
pub const fn zone_color(zone_type: &ZoneType) -> HexColor {
    match zone_type {
        ZoneType::Orange => ORANGE,
        ZoneType::Green => GREEN,
        ZoneType::Red | ZoneType::Unknown(_) => RED,
    }
}

/// Dependencies required by the renderer.
#[derive(Clone)]
pub struct OverlayDeps {
    /// Map surface the scene is drawn on.
    pub map: Arc<dyn MapSurfacePort>,
    /// Directions provider for the evacuation route.
    pub directions: Arc<dyn DirectionsPort>,
    /// Optional logger.
    pub logger: Option<Arc<dyn LoggerPort>>,
}

/// What happened to the evacuation route.
#[derive(Debug, Clone, PartialEq)]
pub enum RouteOutcome {
    /// The route was drawn and the camera fitted to it.
    Drawn {
        /// Polyline overlay.
        overlay: OverlayId,
    },
    /// The lookup failed; the scene stays without a route.
    Omitted(RouteLookupFailure),
    /// A newer render or a teardown happened first.
    Stale,
}

/// Result of one render pass.
#[derive(Debug)]
pub struct RenderReport {
    /// Map the scene was drawn on.
    pub map: MapHandle,
    /// Overlays drawn synchronously.
    pub overlays: usize,
    /// Pending route task, when the result carries directions and a runtime
    /// is available.
    pub route: Option<JoinHandle<Result<RouteOutcome>>>,
}

#[derive(Debug, Default)]
struct SceneState {
    map: Option<MapHandle>,
    overlays: Vec<OverlayId>,
    generation: u64,
}

/// Draws check results onto a map surface.
pub struct MapOverlayRenderer {
    deps: OverlayDeps,
    zoom: u32,
    scene: Arc<Mutex<SceneState>>,
}

impl MapOverlayRenderer {
    /// Create a renderer at city zoom.
    #[must_use]
    pub fn new(deps: OverlayDeps) -> Self {
        Self {
            deps,
            zoom: DEFAULT_MAP_ZOOM,
            scene: Arc::new(Mutex::new(SceneState::default())),
        }
    }

    /// Override the initial zoom.
    #[must_use]
    pub const fn with_zoom(mut self, zoom: u32) -> Self {
        self.zoom = zoom;
        self
    }

    /// Handle of the live map, if one was created.
    pub fn map_handle(&self) -> Result<Option<MapHandle>> {
        Ok(lock_scene(&self.scene)?.map)
    }

    /// Draw the scene for a successful check.
    ///
    /// The route lookup runs on the ambient tokio runtime. Called outside a
    /// runtime, the scene is drawn without a route and `route` is `None`.
    #[tracing::instrument(
        name = "app.overlay.render",
        skip_all,
        fields(correlation_id = %ctx.correlation_id())
    )]
    pub fn render(&self, ctx: &RequestContext, result: &LocationCheckResult) -> Result<RenderReport> {
        let mut scene = lock_scene(&self.scene)?;
        scene.generation += 1;
        let generation = scene.generation;

        let map = match scene.map {
            Some(map) => map,
            None => {
                let map = self.deps.map.create_map(MapOptions {
                    center: result.location,
                    zoom: self.zoom,
                })?;
                scene.map = Some(map);
                map
            },
        };
        clear_overlays(self.deps.map.as_ref(), &mut scene, map)?;

        let surface = self.deps.map.as_ref();
        let user_marker = surface.add_marker(
            map,
            MarkerSpec {
                position: result.location,
                title: USER_MARKER_TITLE.into(),
                icon: MarkerIcon::BlueDot,
            },
        )?;
        scene.overlays.push(user_marker);

        if let Some(zone) = result.danger_zone() {
            let color = zone_color(&zone.zone_type);
            let circle = surface.add_circle(map, zone_circle(zone.center, zone.radius_m(), color))?;
            scene.overlays.push(circle);
        }

        if let Some(evacuation) = result.evacuation.as_ref() {
            let safe_zone = &evacuation.safe_zone;
            let marker = surface.add_marker(
                map,
                MarkerSpec {
                    position: safe_zone.center,
                    title: safe_zone.name.clone(),
                    icon: MarkerIcon::GreenDot,
                },
            )?;
            scene.overlays.push(marker);
            let circle =
                surface.add_circle(map, zone_circle(safe_zone.center, safe_zone.radius_m(), GREEN))?;
            scene.overlays.push(circle);
        }
        let overlays = scene.overlays.len();
        drop(scene);

        if let Some(logger) = self.deps.logger.as_ref() {
            logger.info(
                "client.overlay.render",
                "Map scene drawn",
                Some(log_fields_render(map, overlays, result)),
            );
        }

        let route = match result.evacuation.as_ref() {
            Some(evacuation) if evacuation.directions.is_some() => {
                let query =
                    DirectionsQuery::driving(result.location, evacuation.safe_zone.center);
                self.spawn_route(ctx.clone(), map, generation, query)
            },
            _ => None,
        };

        Ok(RenderReport {
            map,
            overlays,
            route,
        })
    }

    /// Remove every overlay and release the map.
    ///
    /// The map is released even when an overlay removal fails; the first
    /// failure is returned.
    pub fn teardown(&self) -> Result<()> {
        let mut scene = lock_scene(&self.scene)?;
        scene.generation += 1;
        let Some(map) = scene.map.take() else {
            return Ok(());
        };
        let cleared = clear_overlays(self.deps.map.as_ref(), &mut scene, map);
        scene.overlays.clear();
        let released = self.deps.map.release_map(map);
        cleared.and(released)
    }

    fn spawn_route(
        &self,
        ctx: RequestContext,
        map: MapHandle,
        generation: u64,
        query: DirectionsQuery,
    ) -> Option<JoinHandle<Result<RouteOutcome>>> {
        let Ok(runtime) = Handle::try_current() else {
            if let Some(logger) = self.deps.logger.as_ref() {
                logger.warn(
                    "client.overlay.routeOmitted",
                    "Evacuation route skipped outside an async runtime",
                    None,
                );
            }
            return None;
        };
        let directions = Arc::clone(&self.deps.directions);
        let surface = Arc::clone(&self.deps.map);
        let logger = self.deps.logger.clone();
        let scene = Arc::clone(&self.scene);

        Some(runtime.spawn(async move {
            match directions.route(&ctx, query).await {
                Ok(route) => draw_route(surface.as_ref(), &scene, map, generation, route, query),
                Err(failure) => {
                    if let Some(logger) = logger.as_ref() {
                        logger.warn(
                            "client.overlay.routeOmitted",
                            "Evacuation route could not be drawn",
                            Some(log_fields_route_failure(&failure)),
                        );
                    }
                    Ok(RouteOutcome::Omitted(failure))
                },
            }
        }))
    }
}

fn draw_route(
    surface: &dyn MapSurfacePort,
    scene: &Mutex<SceneState>,
    map: MapHandle,
    generation: u64,
    route: RoutePath,
    query: DirectionsQuery,
) -> Result<RouteOutcome> {
    let mut scene = lock_scene(scene)?;
    if scene.generation != generation || scene.map != Some(map) {
        return Ok(RouteOutcome::Stale);
    }

    let bounds = LatLngBounds::enclosing(
        route
            .path
            .iter()
            .copied()
            .chain([query.origin, query.destination]),
    );
    let overlay = surface.add_polyline(
        map,
        PolylineSpec {
            path: route.path,
            stroke_color: GREEN,
            stroke_weight: ROUTE_STROKE_WEIGHT,
        },
    )?;
    scene.overlays.push(overlay);
    if let Some(bounds) = bounds {
        surface.fit_bounds(map, bounds)?;
    }
    Ok(RouteOutcome::Drawn { overlay })
}

fn zone_circle(
    center: quick_evac_domain::Coordinates,
    radius_m: f64,
    color: HexColor,
) -> CircleSpec {
    CircleSpec {
        center,
        radius_m,
        fill_color: color,
        fill_opacity: ZONE_FILL_OPACITY,
        stroke_color: color,
        stroke_weight: ZONE_STROKE_WEIGHT,
    }
}

/// Try every removal. Overlays the surface refused stay tracked so the next
/// clear retries them; the first failure is returned.
fn clear_overlays(
    surface: &dyn MapSurfacePort,
    scene: &mut SceneState,
    map: MapHandle,
) -> Result<()> {
    let mut first_error = None;
    scene
        .overlays
        .retain(|&overlay| match surface.remove_overlay(map, overlay) {
            Ok(()) => false,
            Err(error) => {
                first_error.get_or_insert(error);
                true
            },
        });
    first_error.map_or(Ok(()), Err)
}

fn lock_scene(scene: &Mutex<SceneState>) -> Result<MutexGuard<'_, SceneState>> {
    scene.lock().map_err(|_| {
        ErrorEnvelope::unexpected(
            ErrorCode::internal(),
            "map scene lock poisoned",
            ErrorClass::NonRetriable,
        )
    })
}

fn log_fields_render(map: MapHandle, overlays: usize, result: &LocationCheckResult) -> LogFields {
    let mut fields = LogFields::new();
    fields.insert("map".into(), Value::from(map.get()));
    fields.insert("overlays".into(), Value::from(overlays));
    fields.insert(
        "zoneType".into(),
        result
            .danger_zone()
            .map_or(Value::Null, |zone| Value::from(zone.zone_type.as_str())),
    );
    fields.insert(
        "routeRequested".into(),
        Value::from(result.directions().is_some()),
    );
    fields
}

fn log_fields_route_failure(failure: &RouteLookupFailure) -> LogFields {
    let mut fields = LogFields::new();
    fields.insert("reason".into(), Value::String(failure.to_string()));
    fields
}

#[cfg(test)]
mod tests {
    use super::*;
    use quick_evac_adapters::{RecordingMapSurface, StraightLineDirections};
    use quick_evac_domain::{Coordinates, EvacuationInfo, RouteInfo, Zone, ZoneId};
    use std::sync::atomic::{AtomicU32, Ordering};

    type TestResult = std::result::Result<(), Box<dyn std::error::Error>>;

    fn point(latitude: f64, longitude: f64) -> Coordinates {
        Coordinates::new(latitude, longitude).expect("coordinates")
    }

    fn zone(zone_type: ZoneType) -> Zone {
        Zone {
            id: ZoneId::new("7"),
            name: "Riverside".into(),
            zone_type,
            center: point(40.0, -75.0),
            radius_km: 2.0,
            address: None,
            description: None,
        }
    }

    fn renderer(surface: Arc<RecordingMapSurface>) -> MapOverlayRenderer {
        MapOverlayRenderer::new(OverlayDeps {
            map: surface,
            directions: Arc::new(StraightLineDirections::default()),
            logger: None,
        })
    }

    /// Recording surface whose next `remove_overlay` calls fail.
    #[derive(Default)]
    struct FlakySurface {
        inner: RecordingMapSurface,
        failing_removals: AtomicU32,
    }

    impl FlakySurface {
        fn fail_next_removals(&self, count: u32) {
            self.failing_removals.store(count, Ordering::SeqCst);
        }
    }

    impl MapSurfacePort for FlakySurface {
        fn create_map(&self, options: MapOptions) -> Result<MapHandle> {
            self.inner.create_map(options)
        }

        fn add_marker(&self, map: MapHandle, marker: MarkerSpec) -> Result<OverlayId> {
            self.inner.add_marker(map, marker)
        }

        fn add_circle(&self, map: MapHandle, circle: CircleSpec) -> Result<OverlayId> {
            self.inner.add_circle(map, circle)
        }

        fn add_polyline(&self, map: MapHandle, polyline: PolylineSpec) -> Result<OverlayId> {
            self.inner.add_polyline(map, polyline)
        }

        fn remove_overlay(&self, map: MapHandle, overlay: OverlayId) -> Result<()> {
            let failing = self
                .failing_removals
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
                .is_ok();
            if failing {
                return Err(ErrorEnvelope::unexpected(
                    ErrorCode::unavailable(),
                    "transient",
                    ErrorClass::Retriable,
                ));
            }
            self.inner.remove_overlay(map, overlay)
        }

        fn fit_bounds(&self, map: MapHandle, bounds: LatLngBounds) -> Result<()> {
            self.inner.fit_bounds(map, bounds)
        }

        fn release_map(&self, map: MapHandle) -> Result<()> {
            self.inner.release_map(map)
        }
    }

    fn flaky_renderer(surface: Arc<FlakySurface>) -> MapOverlayRenderer {
        MapOverlayRenderer::new(OverlayDeps {
            map: surface,
            directions: Arc::new(StraightLineDirections::default()),
            logger: None,
        })
    }

    fn evacuation_with_route() -> EvacuationInfo {
        let mut safe_zone = zone(ZoneType::Green);
        safe_zone.center = point(40.05, -75.05);
        EvacuationInfo {
            safe_zone,
            distance_km: 6.9,
            directions: Some(RouteInfo {
                distance: "7.2 km".into(),
                duration: "18 mins".into(),
                start_address: None,
                end_address: None,
                steps: Vec::new(),
            }),
        }
    }

    #[test]
    fn palette_falls_back_to_red() {
        assert_eq!(zone_color(&ZoneType::Red).as_str(), "#ff0000");
        assert_eq!(zone_color(&ZoneType::Orange).as_str(), "#ff9800");
        assert_eq!(zone_color(&ZoneType::Green).as_str(), "#4caf50");
        assert_eq!(zone_color(&ZoneType::parse("purple")).as_str(), "#ff0000");
    }

    #[tokio::test]
    async fn rerender_clears_previous_overlays_and_reuses_map() -> TestResult {
        let surface = Arc::new(RecordingMapSurface::default());
        let renderer = renderer(surface.clone());
        let ctx = RequestContext::new_check();

        let first = renderer.render(
            &ctx,
            &LocationCheckResult::in_zone(point(40.0, -75.0), zone(ZoneType::Orange)),
        )?;
        assert_eq!(first.overlays, 2);

        let second = renderer.render(&ctx, &LocationCheckResult::safe(point(40.0, -75.0)))?;
        assert_eq!(second.map, first.map);
        assert_eq!(second.overlays, 1);

        let scene = surface.scene(first.map)?.ok_or("map missing")?;
        assert_eq!(scene.markers().count(), 1);
        assert_eq!(scene.circles().count(), 0);
        assert_eq!(surface.maps_created()?, 1);
        Ok(())
    }

    #[tokio::test]
    async fn danger_circle_uses_zone_radius_in_metres() -> TestResult {
        let surface = Arc::new(RecordingMapSurface::default());
        let renderer = renderer(surface.clone());

        let report = renderer.render(
            &RequestContext::new_check(),
            &LocationCheckResult::in_zone(point(40.001, -75.0), zone(ZoneType::Red)),
        )?;

        let scene = surface.scene(report.map)?.ok_or("map missing")?;
        let circles: Vec<_> = scene.circles().collect();
        assert_eq!(circles.len(), 1);
        assert!((circles[0].radius_m - 2000.0).abs() < 1e-9);
        assert_eq!(circles[0].fill_color.as_str(), "#ff0000");
        assert!((circles[0].fill_opacity - 0.3).abs() < f32::EPSILON);
        assert_eq!(circles[0].stroke_weight, 1);
        assert!(report.route.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn teardown_releases_the_map() -> TestResult {
        let surface = Arc::new(RecordingMapSurface::default());
        let renderer = renderer(surface.clone());

        renderer.render(
            &RequestContext::new_check(),
            &LocationCheckResult::safe(point(40.0, -75.0)),
        )?;
        assert_eq!(surface.live_maps()?.len(), 1);

        renderer.teardown()?;
        assert!(surface.live_maps()?.is_empty());
        assert_eq!(renderer.map_handle()?, None);
        renderer.teardown()?;
        Ok(())
    }

    #[tokio::test]
    async fn failed_removal_is_retried_by_the_next_render() -> TestResult {
        let surface = Arc::new(FlakySurface::default());
        let renderer = flaky_renderer(surface.clone());
        let ctx = RequestContext::new_check();
        let here = point(40.0, -75.0);

        let first = renderer.render(&ctx, &LocationCheckResult::in_zone(here, zone(ZoneType::Orange)))?;
        surface.fail_next_removals(1);
        assert!(renderer.render(&ctx, &LocationCheckResult::safe(here)).is_err());

        let third = renderer.render(&ctx, &LocationCheckResult::safe(here))?;
        assert_eq!(third.overlays, 1);
        let scene = surface.inner.scene(first.map)?.ok_or("map missing")?;
        assert_eq!(scene.markers().count(), 1);
        assert_eq!(scene.circles().count(), 0);
        Ok(())
    }

    #[tokio::test]
    async fn teardown_releases_the_map_when_a_removal_fails() -> TestResult {
        let surface = Arc::new(FlakySurface::default());
        let renderer = flaky_renderer(surface.clone());

        renderer.render(
            &RequestContext::new_check(),
            &LocationCheckResult::in_zone(point(40.0, -75.0), zone(ZoneType::Red)),
        )?;
        surface.fail_next_removals(1);

        assert!(renderer.teardown().is_err());
        assert!(surface.inner.live_maps()?.is_empty());
        assert_eq!(renderer.map_handle()?, None);
        renderer.teardown()?;
        Ok(())
    }

    #[test]
    fn render_outside_a_runtime_draws_the_scene_without_a_route() -> TestResult {
        let surface = Arc::new(RecordingMapSurface::default());
        let renderer = renderer(surface.clone());
        let result = LocationCheckResult::in_zone(point(40.0, -75.0), zone(ZoneType::Red))
            .with_evacuation(evacuation_with_route());

        let report = renderer.render(&RequestContext::new_check(), &result)?;

        assert!(report.route.is_none());
        assert_eq!(report.overlays, 4);
        let scene = surface.scene(report.map)?.ok_or("map missing")?;
        assert_eq!(scene.polylines().count(), 0);
        Ok(())
    }
}
