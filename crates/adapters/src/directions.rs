//! Offline directions adapter.
//!
//! Produces a straight, evenly subdivided path between the two endpoints.
//! Used by hosts without a mapping provider; the drawn route is an
//! approximation, the server-computed step list remains authoritative.

use quick_evac_domain::{MarkupText, RouteStep, haversine_km};
use quick_evac_ports::{
    BoxFuture, Coordinates, DirectionsPort, DirectionsQuery, RouteLookupFailure, RoutePath,
};
use quick_evac_shared::RequestContext;

const DEFAULT_SEGMENTS: u32 = 8;
const DEFAULT_MAX_DISTANCE_KM: f64 = 500.0;
const DEFAULT_SPEED_KMH: f64 = 40.0;

/// Straight-line route provider.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StraightLineDirections {
    segments: u32,
    max_distance_km: f64,
    speed_kmh: f64,
}

impl Default for StraightLineDirections {
    fn default() -> Self {
        Self {
            segments: DEFAULT_SEGMENTS,
            max_distance_km: DEFAULT_MAX_DISTANCE_KM,
            speed_kmh: DEFAULT_SPEED_KMH,
        }
    }
}

impl StraightLineDirections {
    /// Routes longer than `max_distance_km` report `ZERO_RESULTS`.
    #[must_use]
    pub const fn with_max_distance_km(mut self, max_distance_km: f64) -> Self {
        self.max_distance_km = max_distance_km;
        self
    }

    fn plan(&self, query: DirectionsQuery) -> Result<RoutePath, RouteLookupFailure> {
        let distance_km = haversine_km(query.origin, query.destination);
        if distance_km > self.max_distance_km {
            return Err(RouteLookupFailure::NoRoute {
                status: "ZERO_RESULTS".into(),
            });
        }

        let segments = self.segments.max(1);
        let mut path = Vec::with_capacity(segments as usize + 1);
        for index in 0..=segments {
            let fraction = f64::from(index) / f64::from(segments);
            path.push(interpolate(query.origin, query.destination, fraction)?);
        }

        let distance: Box<str> = format_distance(distance_km).into();
        let duration: Box<str> = format_duration(distance_km / self.speed_kmh * 60.0).into();
        let heading = compass_heading(query.origin, query.destination);
        let step = RouteStep {
            instruction: MarkupText::new(format!("Head <b>{heading}</b> toward the safe zone")),
            distance: distance.clone(),
            duration: duration.clone(),
        };

        Ok(RoutePath {
            path,
            distance,
            duration,
            steps: vec![step],
        })
    }
}

impl DirectionsPort for StraightLineDirections {
    fn route(
        &self,
        ctx: &RequestContext,
        query: DirectionsQuery,
    ) -> BoxFuture<'_, Result<RoutePath, RouteLookupFailure>> {
        let outcome = if ctx.is_cancelled() {
            Err(RouteLookupFailure::Cancelled)
        } else {
            self.plan(query)
        };
        Box::pin(async move { outcome })
    }
}

fn interpolate(
    from: Coordinates,
    to: Coordinates,
    fraction: f64,
) -> Result<Coordinates, RouteLookupFailure> {
    let latitude = (to.latitude() - from.latitude()).mul_add(fraction, from.latitude());
    let longitude = (to.longitude() - from.longitude()).mul_add(fraction, from.longitude());
    Coordinates::new(latitude, longitude).map_err(|error| RouteLookupFailure::Provider {
        message: error.to_string().into(),
    })
}

/// Eight-point compass direction of the initial great-circle bearing.
fn compass_heading(from: Coordinates, to: Coordinates) -> &'static str {
    const POINTS: [&str; 8] = [
        "north",
        "northeast",
        "east",
        "southeast",
        "south",
        "southwest",
        "west",
        "northwest",
    ];
    let (lat1, lat2) = (from.latitude().to_radians(), to.latitude().to_radians());
    let delta_lon = (to.longitude() - from.longitude()).to_radians();
    let y = delta_lon.sin() * lat2.cos();
    let x = lat1.cos().mul_add(lat2.sin(), -(lat1.sin() * lat2.cos() * delta_lon.cos()));
    let bearing = y.atan2(x).to_degrees().rem_euclid(360.0);
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let index = ((bearing / 45.0).round() as usize) % POINTS.len();
    POINTS[index]
}

fn format_distance(distance_km: f64) -> String {
    if distance_km < 1.0 {
        format!("{:.0} m", distance_km * 1000.0)
    } else {
        format!("{distance_km:.1} km")
    }
}

fn format_duration(minutes: f64) -> String {
    let minutes = minutes.ceil().max(1.0);
    if minutes < 60.0 {
        if minutes <= 1.0 {
            "1 min".to_owned()
        } else {
            format!("{minutes:.0} mins")
        }
    } else {
        let hours = (minutes / 60.0).floor();
        let rest = minutes - hours * 60.0;
        format!("{hours:.0} h {rest:.0} mins")
    }
}
