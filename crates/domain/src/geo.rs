//! Coordinates, great-circle distance, and bounding boxes.

use crate::errors::CoordinateError;
use serde::{Deserialize, Serialize};

/// Mean Earth radius used for haversine distances.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// A validated WGS84 position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawCoordinates")]
pub struct Coordinates {
    latitude: f64,
    longitude: f64,
}

#[derive(Deserialize)]
struct RawCoordinates {
    latitude: f64,
    longitude: f64,
}

impl TryFrom<RawCoordinates> for Coordinates {
    type Error = CoordinateError;

    fn try_from(raw: RawCoordinates) -> Result<Self, Self::Error> {
        Self::new(raw.latitude, raw.longitude)
    }
}

impl Coordinates {
    /// Validate latitude in `[-90, 90]` and longitude in `[-180, 180]`.
    ///
    /// NaN fails both range checks.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, CoordinateError> {
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(CoordinateError::LatitudeOutOfRange(latitude));
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(CoordinateError::LongitudeOutOfRange(longitude));
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    /// Latitude in degrees.
    pub const fn latitude(self) -> f64 {
        self.latitude
    }

    /// Longitude in degrees.
    pub const fn longitude(self) -> f64 {
        self.longitude
    }

    /// Great-circle distance in kilometres.
    pub fn distance_km(self, other: Self) -> f64 {
        haversine_km(self, other)
    }
}

/// Haversine distance between two points, in kilometres.
pub fn haversine_km(from: Coordinates, to: Coordinates) -> f64 {
    let lat1 = from.latitude.to_radians();
    let lat2 = to.latitude.to_radians();
    let d_lat = (to.latitude - from.latitude).to_radians();
    let d_lon = (to.longitude - from.longitude).to_radians();

    let a = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    EARTH_RADIUS_KM * c
}

/// Axis-aligned box enclosing a set of points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LatLngBounds {
    /// Minimum latitude / longitude corner.
    pub south_west: Coordinates,
    /// Maximum latitude / longitude corner.
    pub north_east: Coordinates,
}

impl LatLngBounds {
    /// Smallest box containing every point, `None` for an empty input.
    ///
    /// Does not handle boxes that cross the antimeridian.
    pub fn enclosing(points: impl IntoIterator<Item = Coordinates>) -> Option<Self> {
        let mut points = points.into_iter();
        let first = points.next()?;
        let (mut south, mut west, mut north, mut east) = (
            first.latitude,
            first.longitude,
            first.latitude,
            first.longitude,
        );
        for point in points {
            south = south.min(point.latitude);
            north = north.max(point.latitude);
            west = west.min(point.longitude);
            east = east.max(point.longitude);
        }
        Some(Self {
            south_west: Coordinates {
                latitude: south,
                longitude: west,
            },
            north_east: Coordinates {
                latitude: north,
                longitude: east,
            },
        })
    }

    /// Returns true when the point lies inside or on the edge of the box.
    pub fn contains(&self, point: Coordinates) -> bool {
        (self.south_west.latitude..=self.north_east.latitude).contains(&point.latitude)
            && (self.south_west.longitude..=self.north_east.longitude).contains(&point.longitude)
    }
}
