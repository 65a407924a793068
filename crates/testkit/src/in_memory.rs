//! In-memory adapter implementations for port contracts.
//!
//! These implementations are intended for:
//! - Unit/integration tests of the check session
//! - Deterministic contract tests for the ports layer
//! - Local experimentation without a zone-check server

use quick_evac_domain::{
    ApiError, Coordinates, EvacuationInfo, GeoError, LocationCheckRequest, LocationCheckResult,
    MarkupText, RouteInfo, RouteLookupFailure, RouteStep, Zone, ZoneType,
};
use quick_evac_ports::{
    BoxFuture, DirectionsPort, DirectionsQuery, GeolocationPort, LogEvent, LogFields, LoggerPort,
    PositionOptions, RoutePath, TelemetryPort, TelemetryTags, TelemetryTimer, ZoneCheckPort,
};
use quick_evac_shared::RequestContext;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

/// A no-op logger implementation.
#[derive(Debug, Default)]
pub struct NoopLogger;

impl LoggerPort for NoopLogger {
    fn log(&self, _event: LogEvent) {}

    fn child(&self, _fields: LogFields) -> Box<dyn LoggerPort> {
        Box::new(Self)
    }
}

/// A no-op telemetry timer.
#[derive(Debug, Default)]
pub struct NoopTimer;

impl TelemetryTimer for NoopTimer {
    fn stop(&self) {}
}

/// A no-op telemetry implementation.
#[derive(Debug, Default)]
pub struct NoopTelemetry;

impl TelemetryPort for NoopTelemetry {
    fn increment_counter(&self, _name: &str, _value: u64, _tags: Option<&TelemetryTags>) {}

    fn record_timer_ms(&self, _name: &str, _duration_ms: u64, _tags: Option<&TelemetryTags>) {}

    fn start_timer(&self, _name: &str, _tags: Option<&TelemetryTags>) -> Box<dyn TelemetryTimer> {
        Box::new(NoopTimer)
    }
}

/// Holds an answer back until released.
#[derive(Debug, Default, Clone)]
pub struct Gate {
    notify: Arc<Notify>,
}

impl Gate {
    /// Create a closed gate.
    pub fn new() -> Self {
        Self::default()
    }

    /// Let one waiting (or the next) caller through.
    pub fn release(&self) {
        self.notify.notify_one();
    }

    async fn wait(&self) {
        self.notify.notified().await;
    }
}

async fn pass(gate: Option<&Gate>) {
    if let Some(gate) = gate {
        gate.wait().await;
    }
}

/// Zone-check service that classifies positions against a fixed zone list.
///
/// Mirrors the backend: zones are tried in RED > ORANGE > GREEN > other
/// order and the first one within its radius wins. For RED and ORANGE zones
/// the nearest GREEN zone is suggested, but only when directions exist.
#[derive(Debug)]
pub struct InMemoryZoneService {
    zones: Vec<Zone>,
    directions: bool,
    gate: Option<Gate>,
    requests: Mutex<Vec<LocationCheckRequest>>,
}

impl InMemoryZoneService {
    /// Service over `zones` that produces directions for evacuations.
    pub fn new(zones: Vec<Zone>) -> Self {
        Self {
            zones,
            directions: true,
            gate: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Pretend the directions provider found no route.
    pub fn without_directions(mut self) -> Self {
        self.directions = false;
        self
    }

    /// Hold every answer until the gate is released.
    pub fn with_gate(mut self, gate: Gate) -> Self {
        self.gate = Some(gate);
        self
    }

    /// Requests received so far.
    pub fn requests(&self) -> Vec<LocationCheckRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Classify a position synchronously.
    pub fn evaluate(&self, location: Coordinates) -> LocationCheckResult {
        let Some(zone) = self.containing_zone(location) else {
            return LocationCheckResult::safe(location);
        };
        let evacuate = matches!(zone.zone_type, ZoneType::Red | ZoneType::Orange);
        let result = LocationCheckResult::in_zone(location, zone.clone());
        if !evacuate || !self.directions {
            return result;
        }
        match self.nearest_safe_zone(location) {
            Some((safe_zone, distance_km)) => result.with_evacuation(EvacuationInfo {
                directions: Some(straight_route_info(location, safe_zone)),
                safe_zone: safe_zone.clone(),
                distance_km,
            }),
            None => result,
        }
    }

    fn containing_zone(&self, location: Coordinates) -> Option<&Zone> {
        let mut zones: Vec<&Zone> = self.zones.iter().collect();
        zones.sort_by_key(|zone| priority(&zone.zone_type));
        zones.into_iter().find(|zone| zone.contains(location))
    }

    fn nearest_safe_zone(&self, location: Coordinates) -> Option<(&Zone, f64)> {
        self.zones
            .iter()
            .filter(|zone| zone.zone_type == ZoneType::Green)
            .map(|zone| (zone, location.distance_km(zone.center)))
            .min_by(|left, right| left.1.total_cmp(&right.1))
    }
}

fn priority(zone_type: &ZoneType) -> u8 {
    match zone_type {
        ZoneType::Red => 0,
        ZoneType::Orange => 1,
        ZoneType::Green => 2,
        ZoneType::Unknown(_) => 3,
    }
}

fn straight_route_info(origin: Coordinates, safe_zone: &Zone) -> RouteInfo {
    let distance_km = origin.distance_km(safe_zone.center);
    RouteInfo {
        distance: format!("{distance_km:.1} km").into(),
        duration: format!("{} mins", (distance_km * 1.5).ceil().max(1.0)).into(),
        start_address: None,
        end_address: safe_zone.address.clone(),
        steps: vec![
            RouteStep {
                instruction: MarkupText::new("Head <b>toward</b> the safe zone"),
                distance: format!("{distance_km:.1} km").into(),
                duration: "1 min".into(),
            },
            RouteStep {
                instruction: MarkupText::new(format!("Arrive at <b>{}</b>", safe_zone.name)),
                distance: "0 m".into(),
                duration: "1 min".into(),
            },
        ],
    }
}

impl ZoneCheckPort for InMemoryZoneService {
    fn check(
        &self,
        ctx: &RequestContext,
        request: LocationCheckRequest,
    ) -> BoxFuture<'_, Result<LocationCheckResult, ApiError>> {
        let ctx = ctx.clone();
        Box::pin(async move {
            self.requests.lock().unwrap().push(request.clone());
            tokio::select! {
                () = ctx.cancelled() => Err(ApiError::NetworkError {
                    detail: "request abandoned".into(),
                }),
                () = pass(self.gate.as_ref()) => Ok(self.evaluate(request.location)),
            }
        })
    }
}

/// Zone-check service that always fails.
#[derive(Debug, Clone)]
pub struct FailingZoneCheck(pub ApiError);

impl ZoneCheckPort for FailingZoneCheck {
    fn check(
        &self,
        _ctx: &RequestContext,
        _request: LocationCheckRequest,
    ) -> BoxFuture<'_, Result<LocationCheckResult, ApiError>> {
        let error = self.0.clone();
        Box::pin(async move { Err(error) })
    }
}

/// Geolocation capability that replays queued answers.
///
/// With an empty queue the request never resolves, like a platform that
/// ignores its own deadline.
#[derive(Debug)]
pub struct ScriptedGeolocation {
    supported: bool,
    answers: Mutex<VecDeque<Result<Coordinates, GeoError>>>,
    gate: Option<Gate>,
    requests: Mutex<Vec<PositionOptions>>,
}

impl ScriptedGeolocation {
    /// A device without geolocation.
    pub fn unsupported() -> Self {
        Self {
            supported: false,
            answers: Mutex::new(VecDeque::new()),
            gate: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// A device that answers once with `answer`.
    pub fn answering(answer: Result<Coordinates, GeoError>) -> Self {
        Self {
            supported: true,
            ..Self::unsupported()
        }
        .then(answer)
    }

    /// A supported device that never answers.
    pub fn silent() -> Self {
        Self {
            supported: true,
            ..Self::unsupported()
        }
    }

    /// Queue another answer.
    pub fn then(self, answer: Result<Coordinates, GeoError>) -> Self {
        self.answers.lock().unwrap().push_back(answer);
        self
    }

    /// Hold every answer until the gate is released.
    pub fn with_gate(mut self, gate: Gate) -> Self {
        self.gate = Some(gate);
        self
    }

    /// Options of every request issued so far.
    pub fn requests(&self) -> Vec<PositionOptions> {
        self.requests.lock().unwrap().clone()
    }
}

impl GeolocationPort for ScriptedGeolocation {
    fn is_supported(&self) -> bool {
        self.supported
    }

    fn current_position(
        &self,
        _ctx: &RequestContext,
        options: PositionOptions,
    ) -> BoxFuture<'_, Result<Coordinates, GeoError>> {
        self.requests.lock().unwrap().push(options);
        let answer = self.answers.lock().unwrap().pop_front();
        Box::pin(async move {
            pass(self.gate.as_ref()).await;
            match answer {
                Some(answer) => answer,
                None => std::future::pending().await,
            }
        })
    }
}

/// Directions provider with a fixed answer.
#[derive(Debug)]
pub struct ScriptedDirections {
    failure: Option<RouteLookupFailure>,
    gate: Option<Gate>,
    calls: AtomicUsize,
}

impl ScriptedDirections {
    /// Answers with a two-point route from origin to destination.
    pub fn straight() -> Self {
        Self {
            failure: None,
            gate: None,
            calls: AtomicUsize::new(0),
        }
    }

    /// Always fails with `failure`.
    pub fn failing(failure: RouteLookupFailure) -> Self {
        Self {
            failure: Some(failure),
            ..Self::straight()
        }
    }

    /// Hold every answer until the gate is released.
    pub fn with_gate(mut self, gate: Gate) -> Self {
        self.gate = Some(gate);
        self
    }

    /// Number of lookups so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl DirectionsPort for ScriptedDirections {
    fn route(
        &self,
        _ctx: &RequestContext,
        query: DirectionsQuery,
    ) -> BoxFuture<'_, Result<RoutePath, RouteLookupFailure>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let failure = self.failure.clone();
        Box::pin(async move {
            pass(self.gate.as_ref()).await;
            match failure {
                Some(failure) => Err(failure),
                None => {
                    let distance: Box<str> =
                        format!("{:.1} km", query.origin.distance_km(query.destination)).into();
                    Ok(RoutePath {
                        path: vec![query.origin, query.destination],
                        steps: vec![RouteStep {
                            instruction: MarkupText::new("Head toward the safe zone"),
                            distance: distance.clone(),
                            duration: "5 mins".into(),
                        }],
                        distance,
                        duration: "5 mins".into(),
                    })
                },
            }
        })
    }
}
