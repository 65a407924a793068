//! # quick-evac-testkit
//!
//! Test helpers and in-memory adapters: a zone service that mirrors the
//! backend's classification, scripted geolocation and directions, fixture
//! loaders, and a capturing log sink.
//! This crate depends on `ports`, `domain`, `adapters`, and `shared`.

pub mod errors;
pub mod fixtures;
pub mod in_memory;

pub use quick_evac_adapters::MemoryLogSink;

use quick_evac_adapters::JsonLogger;
use quick_evac_ports::{LogLevel, LoggerPort};
use std::sync::Arc;

/// Debug-level JSON logger writing into a fresh memory sink.
pub fn capturing_logger() -> (Arc<MemoryLogSink>, Arc<dyn LoggerPort>) {
    let sink = Arc::new(MemoryLogSink::default());
    let logger = JsonLogger::new(sink.clone()).with_min_level(LogLevel::Debug);
    (sink, Arc::new(logger))
}

/// Returns the testkit crate version.
#[must_use]
pub const fn testkit_crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
