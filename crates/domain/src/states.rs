//! # Check session state machine
//!
//! ```text
//! Idle ──submit──▶ AcquiringLocation ──fix──▶ CheckingZone ──result──▶ Success
//!                        │                         │
//!                        └──geo error──▶ Failed ◀──┴──api error
//!
//! any state ──reset──▶ Idle
//! ```
//!
//! Transitions are pure: [`CheckSessionState::apply`] consumes the current
//! state and returns the next one, or rejects the event. The session
//! controller in the app crate owns the single live instance.

use crate::errors::{ApiError, CheckError, GeoError};
use crate::geo::Coordinates;
use crate::location::LocationCheckResult;
use crate::phone::NormalizedPhoneNumber;
use std::fmt;
use thiserror::Error;

/// UI-facing state of a location check.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CheckSessionState {
    /// Waiting for a phone number.
    #[default]
    Idle,
    /// Waiting for a position fix.
    AcquiringLocation {
        /// Number being checked.
        phone: NormalizedPhoneNumber,
    },
    /// Waiting for the zone-check service.
    CheckingZone {
        /// Number being checked.
        phone: NormalizedPhoneNumber,
        /// Position sent to the service.
        location: Coordinates,
    },
    /// The check completed.
    Success {
        /// Server result.
        result: Box<LocationCheckResult>,
        /// Number that was checked.
        phone: NormalizedPhoneNumber,
    },
    /// The check failed.
    Failed {
        /// Classified failure.
        error: CheckError,
    },
}

/// Inputs that move the state machine.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// A validated number was submitted.
    Submitted(NormalizedPhoneNumber),
    /// The device produced a position.
    LocationAcquired(Coordinates),
    /// The device failed to produce a position.
    LocationFailed(GeoError),
    /// The zone-check service answered.
    ZoneChecked(Box<LocationCheckResult>),
    /// The zone-check service failed.
    ZoneCheckFailed(ApiError),
    /// The user started over.
    Reset,
}

impl SessionEvent {
    /// Short name for logs.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Submitted(_) => "submitted",
            Self::LocationAcquired(_) => "location_acquired",
            Self::LocationFailed(_) => "location_failed",
            Self::ZoneChecked(_) => "zone_checked",
            Self::ZoneCheckFailed(_) => "zone_check_failed",
            Self::Reset => "reset",
        }
    }
}

/// An event arrived in a state that does not accept it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("event `{event}` is not valid in state `{state}`")]
pub struct InvalidTransition {
    /// State name at the time of the event.
    pub state: &'static str,
    /// Rejected event name.
    pub event: &'static str,
}

impl CheckSessionState {
    /// Short name for logs.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::AcquiringLocation { .. } => "acquiring_location",
            Self::CheckingZone { .. } => "checking_zone",
            Self::Success { .. } => "success",
            Self::Failed { .. } => "failed",
        }
    }

    /// True while a check is in flight; submission is disabled.
    pub const fn is_busy(&self) -> bool {
        matches!(
            self,
            Self::AcquiringLocation { .. } | Self::CheckingZone { .. }
        )
    }

    /// True for `Success` and `Failed`.
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Success { .. } | Self::Failed { .. })
    }

    /// The user-facing failure message, when failed.
    pub fn error_message(&self) -> Option<String> {
        match self {
            Self::Failed { error } => Some(error.message()),
            _ => None,
        }
    }

    /// The result, when successful.
    pub fn result(&self) -> Option<&LocationCheckResult> {
        match self {
            Self::Success { result, .. } => Some(&**result),
            _ => None,
        }
    }

    /// Apply an event, returning the next state.
    pub fn apply(self, event: SessionEvent) -> Result<Self, InvalidTransition> {
        match (self, event) {
            (_, SessionEvent::Reset) => Ok(Self::Idle),
            (Self::Idle, SessionEvent::Submitted(phone)) => Ok(Self::AcquiringLocation { phone }),
            (Self::AcquiringLocation { phone }, SessionEvent::LocationAcquired(location)) => {
                Ok(Self::CheckingZone { phone, location })
            },
            (Self::AcquiringLocation { .. }, SessionEvent::LocationFailed(error)) => {
                Ok(Self::Failed {
                    error: CheckError::Geolocation(error),
                })
            },
            (Self::CheckingZone { phone, .. }, SessionEvent::ZoneChecked(result)) => {
                Ok(Self::Success { result, phone })
            },
            (Self::CheckingZone { .. }, SessionEvent::ZoneCheckFailed(error)) => Ok(Self::Failed {
                error: CheckError::Api(error),
            }),
            (state, event) => Err(InvalidTransition {
                state: state.name(),
                event: event.name(),
            }),
        }
    }
}

impl fmt::Display for CheckSessionState {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.name())
    }
}
