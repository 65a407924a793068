//! # quick-evac-adapters
//!
//! Adapter implementations for ports (zone-check HTTP client, geolocation,
//! directions, map surface, logging, telemetry).
//! This crate depends on `ports`, `config`, and `shared`.

pub mod directions;
pub mod geolocation;
pub mod log_sink;
pub mod logger;
pub mod map_surface;
pub mod telemetry;
pub mod zone_check_http;

pub use directions::StraightLineDirections;
pub use geolocation::FixedGeolocation;
pub use log_sink::{LogSink, MemoryLogSink, StderrLogSink};
pub use logger::JsonLogger;
pub use map_surface::{MapScene, Overlay, RecordingMapSurface};
pub use telemetry::{JsonTelemetry, TaggedTelemetry};
pub use zone_check_http::HttpZoneCheck;

/// Returns the adapters crate version.
#[must_use]
pub const fn adapters_crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
