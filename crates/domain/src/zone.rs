//! Hazard and safe zones.

use crate::geo::Coordinates;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Server-assigned zone identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ZoneId(Box<str>);

impl ZoneId {
    /// Wrap an identifier.
    pub fn new(value: impl Into<Box<str>>) -> Self {
        Self(value.into())
    }

    /// Borrow the identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ZoneId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.0)
    }
}

/// Zone classification as sent by the server.
///
/// Wire values are case-sensitive. Anything other than `RED`, `ORANGE` or
/// `GREEN` is kept verbatim in [`ZoneType::Unknown`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ZoneType {
    /// High danger, immediate evacuation.
    Red,
    /// Medium danger, prepare to evacuate.
    Orange,
    /// Safe area.
    Green,
    /// Unrecognized discriminant.
    Unknown(Box<str>),
}

impl ZoneType {
    /// Decode a wire value.
    pub fn parse(raw: &str) -> Self {
        match raw {
            "RED" => Self::Red,
            "ORANGE" => Self::Orange,
            "GREEN" => Self::Green,
            other => Self::Unknown(other.into()),
        }
    }

    /// Wire value.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Red => "RED",
            Self::Orange => "ORANGE",
            Self::Green => "GREEN",
            Self::Unknown(raw) => raw,
        }
    }

    /// Severity of the zone, `None` for unknown types.
    pub const fn severity(&self) -> Option<Severity> {
        match self {
            Self::Red => Some(Severity::High),
            Self::Orange => Some(Severity::Medium),
            Self::Green => Some(Severity::Safe),
            Self::Unknown(_) => None,
        }
    }
}

impl From<String> for ZoneType {
    fn from(value: String) -> Self {
        Self::parse(&value)
    }
}

impl From<ZoneType> for String {
    fn from(value: ZoneType) -> Self {
        value.as_str().to_owned()
    }
}

impl fmt::Display for ZoneType {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Ordered danger level: `High > Medium > Safe`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// GREEN.
    Safe,
    /// ORANGE.
    Medium,
    /// RED.
    High,
}

/// A circular zone on the map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Zone {
    /// Identifier.
    pub id: ZoneId,
    /// Display name.
    pub name: Box<str>,
    /// Classification.
    #[serde(rename = "type")]
    pub zone_type: ZoneType,
    /// Center of the circle.
    pub center: Coordinates,
    /// Radius in kilometres.
    pub radius_km: f64,
    /// Street address of the center, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<Box<str>>,
    /// Free-form description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<Box<str>>,
}

impl Zone {
    /// Radius in metres, as map circles expect.
    pub fn radius_m(&self) -> f64 {
        self.radius_km * 1000.0
    }

    /// Returns true when the point lies within the zone's radius.
    pub fn contains(&self, point: Coordinates) -> bool {
        self.center.distance_km(point) <= self.radius_km
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zone_type_round_trips_known_values() {
        for raw in ["RED", "ORANGE", "GREEN"] {
            assert_eq!(ZoneType::parse(raw).as_str(), raw);
        }
    }

    #[test]
    fn zone_type_keeps_unknown_values_verbatim() {
        let parsed = ZoneType::parse("red");
        assert_eq!(parsed, ZoneType::Unknown("red".into()));
        assert_eq!(parsed.severity(), None);

        let decoded: ZoneType = serde_json::from_str(r#""PURPLE""#).expect("decode");
        assert_eq!(decoded, ZoneType::Unknown("PURPLE".into()));
    }

    #[test]
    fn severity_orders_red_above_orange_above_green() {
        assert!(ZoneType::Red.severity() > ZoneType::Orange.severity());
        assert!(ZoneType::Orange.severity() > ZoneType::Green.severity());
    }

    #[test]
    fn contains_uses_great_circle_distance() {
        let zone = Zone {
            id: ZoneId::new("1"),
            name: "Downtown".into(),
            zone_type: ZoneType::Red,
            center: Coordinates::new(40.0, -75.0).expect("center"),
            radius_km: 1.0,
            address: None,
            description: None,
        };
        assert!((zone.radius_m() - 1000.0).abs() < f64::EPSILON);
        assert!(zone.contains(Coordinates::new(40.005, -75.0).expect("inside")));
        assert!(!zone.contains(Coordinates::new(40.02, -75.0).expect("outside")));
    }
}
