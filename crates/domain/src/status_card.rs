//! Text content of the result view.

use crate::classify::{ZoneDisplayDescriptor, classify};
use crate::location::{LocationCheckResult, MarkupText};
use crate::phone::NormalizedPhoneNumber;
use serde::Serialize;

/// Number of route steps previewed on the card.
pub const STEP_PREVIEW_LIMIT: usize = 3;

/// Shown under the route preview.
pub const SMS_NOTE: &str = "An SMS with evacuation details has been sent to your phone.";

const LEGEND_IN_DANGER: &str = "Blue marker: Your location. Green marker: Nearest safe zone. Green line: Recommended evacuation route.";
const LEGEND_SAFE: &str = "You are in a safe location (blue marker).";

/// Everything the result view prints, derived from one successful check.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusCard {
    /// Headline.
    pub descriptor: ZoneDisplayDescriptor,
    /// `Phone: ...` value, formatted for display.
    pub phone: String,
    /// Address, or the coordinates with six decimals.
    pub location: String,
    /// Present when inside a known hazard zone.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zone: Option<ZoneSummary>,
    /// Present when the server suggested a safe zone.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evacuation: Option<EvacuationSummary>,
    /// Caption under the map.
    pub legend: &'static str,
}

/// The zone the user is in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoneSummary {
    /// `You are in <name> (<TYPE> zone).`
    pub headline: String,
    /// Zone description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Where to go.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EvacuationSummary {
    /// `Nearest safe zone: <name> (<d.dd> km away)`
    pub safe_zone: String,
    /// Route preview, when directions were computed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub route: Option<RoutePreview>,
}

/// First few steps of the route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutePreview {
    /// `Route: <distance>, approximately <duration>`
    pub summary: String,
    /// Up to [`STEP_PREVIEW_LIMIT`] steps.
    pub steps: Vec<StepPreview>,
    /// Steps not shown.
    pub remaining_steps: usize,
    /// SMS confirmation note.
    pub sms_note: &'static str,
}

/// One previewed step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StepPreview {
    /// Instruction markup, verbatim.
    pub instruction: MarkupText,
    /// `<distance>, <duration>`
    pub detail: String,
}

impl StatusCard {
    /// Build the card for a successful check.
    pub fn build(result: &LocationCheckResult, phone: &NormalizedPhoneNumber) -> Self {
        let location = result.address.as_deref().map_or_else(
            || {
                format!(
                    "Latitude: {:.6}, Longitude: {:.6}",
                    result.location.latitude(),
                    result.location.longitude()
                )
            },
            str::to_owned,
        );

        let zone = result.danger_zone().map(|zone| ZoneSummary {
            headline: format!("You are in {} ({} zone).", zone.name, zone.zone_type),
            description: zone.description.as_deref().map(str::to_owned),
        });

        let evacuation = result.evacuation.as_ref().map(|evacuation| {
            let route = evacuation.directions.as_ref().map(|directions| RoutePreview {
                summary: format!(
                    "Route: {}, approximately {}",
                    directions.distance, directions.duration
                ),
                steps: directions
                    .steps
                    .iter()
                    .take(STEP_PREVIEW_LIMIT)
                    .map(|step| StepPreview {
                        instruction: step.instruction.clone(),
                        detail: format!("{}, {}", step.distance, step.duration),
                    })
                    .collect(),
                remaining_steps: directions.steps.len().saturating_sub(STEP_PREVIEW_LIMIT),
                sms_note: SMS_NOTE,
            });
            EvacuationSummary {
                safe_zone: format!(
                    "Nearest safe zone: {} ({:.2} km away)",
                    evacuation.safe_zone.name, evacuation.distance_km
                ),
                route,
            }
        });

        let legend = if result.in_danger_zone {
            LEGEND_IN_DANGER
        } else {
            LEGEND_SAFE
        };

        Self {
            descriptor: classify(result),
            phone: phone.formatted(),
            location,
            zone,
            evacuation,
            legend,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::Coordinates;
    use crate::location::{EvacuationInfo, RouteInfo, RouteStep};
    use crate::zone::{Zone, ZoneId, ZoneType};

    fn point(latitude: f64, longitude: f64) -> Coordinates {
        Coordinates::new(latitude, longitude).expect("point")
    }

    fn phone() -> NormalizedPhoneNumber {
        NormalizedPhoneNumber::parse("5551234567").expect("phone")
    }

    fn zone(name: &str, zone_type: ZoneType, center: Coordinates) -> Zone {
        Zone {
            id: ZoneId::new(name),
            name: name.into(),
            zone_type,
            center,
            radius_km: 1.0,
            address: None,
            description: Some("Chemical spill".into()),
        }
    }

    fn step(instruction: &str) -> RouteStep {
        RouteStep {
            instruction: MarkupText::new(instruction),
            distance: "0.5 km".into(),
            duration: "1 min".into(),
        }
    }

    #[test]
    fn safe_result_shows_coordinates_and_safe_legend() {
        let card = StatusCard::build(&LocationCheckResult::safe(point(40.0, -75.0)), &phone());
        assert_eq!(card.phone, "(555) 123-4567");
        assert_eq!(card.location, "Latitude: 40.000000, Longitude: -75.000000");
        assert!(card.zone.is_none());
        assert!(card.evacuation.is_none());
        assert_eq!(card.legend, "You are in a safe location (blue marker).");
    }

    #[test]
    fn danger_result_with_directions_fills_every_section() {
        let here = point(40.0, -75.0);
        let result = LocationCheckResult::in_zone(here, zone("Harbor", ZoneType::Red, here))
            .with_address("1 Main St")
            .with_evacuation(EvacuationInfo {
                safe_zone: zone("Hilltop Park", ZoneType::Green, point(40.05, -75.05)),
                distance_km: 6.789,
                directions: Some(RouteInfo {
                    distance: "7.2 km".into(),
                    duration: "12 mins".into(),
                    start_address: None,
                    end_address: None,
                    steps: vec![
                        step("Head <b>north</b>"),
                        step("Turn left"),
                        step("Turn right"),
                        step("Arrive"),
                    ],
                }),
            });

        let card = StatusCard::build(&result, &phone());
        assert_eq!(card.location, "1 Main St");
        assert_eq!(card.descriptor.label, "High Danger Zone");

        let zone = card.zone.expect("zone summary");
        assert_eq!(zone.headline, "You are in Harbor (RED zone).");
        assert_eq!(zone.description.as_deref(), Some("Chemical spill"));

        let evacuation = card.evacuation.expect("evacuation summary");
        assert_eq!(
            evacuation.safe_zone,
            "Nearest safe zone: Hilltop Park (6.79 km away)"
        );
        let route = evacuation.route.expect("route preview");
        assert_eq!(route.summary, "Route: 7.2 km, approximately 12 mins");
        assert_eq!(route.steps.len(), 3);
        assert_eq!(route.remaining_steps, 1);
        assert_eq!(route.steps[0].instruction.as_str(), "Head <b>north</b>");
        assert_eq!(route.steps[0].detail, "0.5 km, 1 min");
        assert_eq!(route.sms_note, SMS_NOTE);
        assert!(card.legend.starts_with("Blue marker: Your location."));
    }
}
