//! # quick-evac-shared
//!
//! Shared result types, error handling, and request context for the quick-evac
//! workspace.
//!
//! - Result and error envelope types
//! - Request context (correlation ids + cancellation) and a deadline race
//! - Secret and phone-number redaction
//! - Bounded numeric wrappers for validated configuration
//!
//! This crate only depends on external crates.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

pub mod concurrency;
pub mod errors;
pub mod invariants;
pub mod redaction;
pub mod result;
pub mod timeout;

pub use concurrency::{CorrelationId, RequestContext};
pub use errors::{ErrorClass, ErrorCode, ErrorEnvelope, ErrorKind, ErrorMetadata};
pub use invariants::{BoundedU32, BoundedU64, BoundsError};
pub use redaction::{REDACTED, is_phone_key, is_secret_key, mask_phone, redact_if_secret};
pub use result::Result;
pub use timeout::{Interrupted, race_with_context};

/// Returns the shared crate version.
#[must_use]
pub const fn shared_crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
