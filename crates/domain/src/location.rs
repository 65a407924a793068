//! Location check request and result aggregates.

use crate::geo::Coordinates;
use crate::phone::NormalizedPhoneNumber;
use crate::zone::Zone;
use serde::{Deserialize, Serialize};
use std::fmt;

/// What the zone-check service is asked.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocationCheckRequest {
    /// Validated phone number.
    pub phone_number: NormalizedPhoneNumber,
    /// Device position.
    pub location: Coordinates,
}

impl LocationCheckRequest {
    /// Build a request for a single submission.
    pub const fn new(phone_number: NormalizedPhoneNumber, location: Coordinates) -> Self {
        Self {
            phone_number,
            location,
        }
    }
}

/// Provider-supplied markup (route instructions carry `<b>`/`<div>` tags).
///
/// Stored verbatim; [`MarkupText::plain_text`] gives a tag-free rendering for
/// surfaces that cannot display markup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MarkupText(Box<str>);

impl MarkupText {
    /// Wrap provider markup.
    pub fn new(value: impl Into<Box<str>>) -> Self {
        Self(value.into())
    }

    /// Original markup.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Text with tags removed, common entities decoded, whitespace collapsed.
    ///
    /// ```
    /// use quick_evac_domain::MarkupText;
    ///
    /// let text = MarkupText::new("Turn <b>left</b><div style=\"x\">Destination&nbsp;ahead</div>");
    /// assert_eq!(text.plain_text(), "Turn left Destination ahead");
    /// ```
    pub fn plain_text(&self) -> String {
        let mut out = String::with_capacity(self.0.len());
        let mut in_tag = false;
        for ch in self.0.chars() {
            match ch {
                '<' => in_tag = true,
                '>' if in_tag => {
                    in_tag = false;
                    out.push(' ');
                },
                _ if in_tag => {},
                _ => out.push(ch),
            }
        }
        let decoded = out
            .replace("&nbsp;", " ")
            .replace("&lt;", "<")
            .replace("&gt;", ">")
            .replace("&quot;", "\"")
            .replace("&#39;", "'")
            .replace("&amp;", "&");
        let mut collapsed = String::with_capacity(decoded.len());
        for word in decoded.split_whitespace() {
            if !collapsed.is_empty() {
                collapsed.push(' ');
            }
            collapsed.push_str(word);
        }
        collapsed
    }
}

impl fmt::Display for MarkupText {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.0)
    }
}

/// One leg of a route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteStep {
    /// Instruction markup.
    pub instruction: MarkupText,
    /// Human-readable distance (e.g. "0.3 km").
    pub distance: Box<str>,
    /// Human-readable duration (e.g. "1 min").
    pub duration: Box<str>,
}

/// Server-computed directions to the safe zone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteInfo {
    /// Total distance text.
    pub distance: Box<str>,
    /// Total duration text.
    pub duration: Box<str>,
    /// Geocoded origin.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_address: Option<Box<str>>,
    /// Geocoded destination.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_address: Option<Box<str>>,
    /// Ordered steps.
    #[serde(default)]
    pub steps: Vec<RouteStep>,
}

/// Nearest safe zone and how to get there.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvacuationInfo {
    /// Destination zone.
    pub safe_zone: Zone,
    /// Straight-line distance in kilometres.
    pub distance_km: f64,
    /// Directions, when the server computed them.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub directions: Option<RouteInfo>,
}

/// Outcome of a successful zone check.
///
/// Fields mirror what the server sent. `zone` should be present exactly when
/// `in_danger_zone` is true; read it through [`LocationCheckResult::danger_zone`]
/// so a zone attached to a safe result is ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationCheckResult {
    /// Position the server evaluated.
    pub location: Coordinates,
    /// Reverse-geocoded address of `location`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<Box<str>>,
    /// Whether the position is inside a hazard zone.
    pub in_danger_zone: bool,
    /// Containing zone.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zone: Option<Zone>,
    /// Suggested evacuation, independent of the danger flag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evacuation: Option<EvacuationInfo>,
}

impl LocationCheckResult {
    /// A result outside every hazard zone.
    pub const fn safe(location: Coordinates) -> Self {
        Self {
            location,
            address: None,
            in_danger_zone: false,
            zone: None,
            evacuation: None,
        }
    }

    /// A result inside `zone`.
    pub const fn in_zone(location: Coordinates, zone: Zone) -> Self {
        Self {
            location,
            address: None,
            in_danger_zone: true,
            zone: Some(zone),
            evacuation: None,
        }
    }

    /// Attach an evacuation suggestion.
    #[must_use]
    pub fn with_evacuation(mut self, evacuation: EvacuationInfo) -> Self {
        self.evacuation = Some(evacuation);
        self
    }

    /// Attach a reverse-geocoded address.
    #[must_use]
    pub fn with_address(mut self, address: impl Into<Box<str>>) -> Self {
        self.address = Some(address.into());
        self
    }

    /// The containing zone, only when the danger flag is set.
    pub const fn danger_zone(&self) -> Option<&Zone> {
        if self.in_danger_zone {
            self.zone.as_ref()
        } else {
            None
        }
    }

    /// Directions to the safe zone, when present.
    pub fn directions(&self) -> Option<&RouteInfo> {
        self.evacuation
            .as_ref()
            .and_then(|evacuation| evacuation.directions.as_ref())
    }
}
