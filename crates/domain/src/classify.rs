//! Zone classification into display descriptors.

use crate::location::LocationCheckResult;
use crate::zone::ZoneType;
use serde::Serialize;

/// Color role of a descriptor; themes map roles to concrete colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SeverityColor {
    /// Safe.
    Success,
    /// Medium danger.
    Warning,
    /// High danger.
    Error,
    /// Unknown state.
    Info,
}

/// Icon shown next to the status headline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ZoneIcon {
    /// Check mark.
    CheckCircle,
    /// Warning triangle.
    Warning,
    /// Location pin.
    LocationPin,
}

/// Everything the result view needs to render the status headline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoneDisplayDescriptor {
    /// Color role.
    pub severity_color: SeverityColor,
    /// Icon.
    pub icon: ZoneIcon,
    /// Headline.
    pub label: &'static str,
    /// One-line guidance.
    pub message: &'static str,
}

const NOT_IN_DANGER: ZoneDisplayDescriptor = ZoneDisplayDescriptor {
    severity_color: SeverityColor::Success,
    icon: ZoneIcon::CheckCircle,
    label: "Safe Zone",
    message: "You are not in a danger zone.",
};

const HIGH_DANGER: ZoneDisplayDescriptor = ZoneDisplayDescriptor {
    severity_color: SeverityColor::Error,
    icon: ZoneIcon::Warning,
    label: "High Danger Zone",
    message: "Immediate evacuation required!",
};

const MEDIUM_DANGER: ZoneDisplayDescriptor = ZoneDisplayDescriptor {
    severity_color: SeverityColor::Warning,
    icon: ZoneIcon::Warning,
    label: "Medium Danger Zone",
    message: "Prepare for possible evacuation.",
};

const GREEN_ZONE: ZoneDisplayDescriptor = ZoneDisplayDescriptor {
    severity_color: SeverityColor::Success,
    icon: ZoneIcon::CheckCircle,
    label: "Safe Zone",
    message: "No evacuation necessary.",
};

const UNKNOWN_ZONE: ZoneDisplayDescriptor = ZoneDisplayDescriptor {
    severity_color: SeverityColor::Info,
    icon: ZoneIcon::LocationPin,
    label: "Unknown Zone",
    message: "Status unknown.",
};

/// Map a check result onto its descriptor.
///
/// The danger flag wins over any attached zone. A danger flag without a zone
/// is treated like an unknown zone type.
pub fn classify(result: &LocationCheckResult) -> ZoneDisplayDescriptor {
    if !result.in_danger_zone {
        return NOT_IN_DANGER;
    }
    match &result.zone {
        Some(zone) => match zone.zone_type {
            ZoneType::Red => HIGH_DANGER,
            ZoneType::Orange => MEDIUM_DANGER,
            ZoneType::Green => GREEN_ZONE,
            ZoneType::Unknown(_) => UNKNOWN_ZONE,
        },
        None => UNKNOWN_ZONE,
    }
}
