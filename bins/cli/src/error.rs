//! Process exit codes and CLI-level failures for `qevac`.
//!
//! Domain failures (bad phone, unusable config, a failed check) are printed
//! as structured output and mapped to an [`ExitCode`]; [`CliError`] covers
//! only what goes wrong around them.

use quick_evac_domain::CheckSessionState;
use std::fmt;

/// Exit status of a `qevac` invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    Ok = 0,
    /// A bug or serialization failure inside the binary.
    Internal = 1,
    /// Flags, phone number, location or config were rejected.
    InvalidInput = 2,
    /// Stdout or stderr could not be written.
    Io = 3,
    /// `check` ran to completion and ended in `Failed`.
    CheckFailed = 4,
}

impl ExitCode {
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    /// Exit status for the state a `check` settled in.
    ///
    /// A session still in flight never reaches the printer, so it maps to
    /// `Internal`.
    #[must_use]
    pub const fn for_check(state: &CheckSessionState) -> Self {
        match state {
            CheckSessionState::Success { .. } => Self::Ok,
            CheckSessionState::Failed { .. } => Self::CheckFailed,
            CheckSessionState::Idle
            | CheckSessionState::AcquiringLocation { .. }
            | CheckSessionState::CheckingZone { .. } => Self::Internal,
        }
    }
}

#[derive(Debug)]
pub enum CliError {
    /// Argument combinations clap cannot express, e.g. `--lat` without `--lon`.
    InvalidInput(String),
    Io(std::io::Error),
    Serialization(serde_json::Error),
}

impl CliError {
    #[must_use]
    pub const fn exit_code(&self) -> ExitCode {
        match self {
            Self::InvalidInput(_) => ExitCode::InvalidInput,
            Self::Io(_) => ExitCode::Io,
            Self::Serialization(_) => ExitCode::Internal,
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidInput(message) => formatter.write_str(message),
            Self::Io(error) => write!(formatter, "cannot write output: {error}"),
            Self::Serialization(error) => write!(formatter, "cannot encode output: {error}"),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::InvalidInput(_) => None,
            Self::Io(error) => Some(error),
            Self::Serialization(error) => Some(error),
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(error: std::io::Error) -> Self {
        Self::Io(error)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(error: serde_json::Error) -> Self {
        Self::Serialization(error)
    }
}
