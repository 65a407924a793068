//! Logger and telemetry selection from the process environment.

use quick_evac_adapters::{JsonLogger, JsonTelemetry, LogSink, StderrLogSink, TaggedTelemetry};
use quick_evac_ports::{LogLevel, LoggerPort, TelemetryPort, telemetry_tags};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Env var: `json` enables structured logs on stderr.
pub const LOG_FORMAT_ENV: &str = "QEVAC_LOG_FORMAT";
/// Env var: minimum log level (`debug`, `info`, `warn`, `error`).
pub const LOG_LEVEL_ENV: &str = "QEVAC_LOG_LEVEL";
/// Env var: `json` enables metric lines; defaults to the log format.
pub const TELEMETRY_FORMAT_ENV: &str = "QEVAC_TELEMETRY_FORMAT";

/// Optional observability ports handed to the use cases.
#[derive(Clone, Default)]
pub struct Observability {
    /// Structured logger.
    pub logger: Option<Arc<dyn LoggerPort>>,
    /// Metrics sink.
    pub telemetry: Option<Arc<dyn TelemetryPort>>,
}

impl Observability {
    /// No logging and no metrics.
    #[must_use]
    pub fn disabled() -> Self {
        Self::default()
    }
}

/// Build observability from the process environment, writing to stderr.
pub fn observability_from_env() -> Observability {
    let env: BTreeMap<String, String> = std::env::vars()
        .filter(|(key, _)| key.starts_with("QEVAC_"))
        .collect();
    observability_from_map(&env, Arc::new(StderrLogSink))
}

/// Build observability from an env snapshot, writing to `sink`.
pub fn observability_from_map(
    env: &BTreeMap<String, String>,
    sink: Arc<dyn LogSink>,
) -> Observability {
    let log_enabled = is_json(env.get(LOG_FORMAT_ENV));
    let telemetry_enabled = env
        .get(TELEMETRY_FORMAT_ENV)
        .map_or(log_enabled, |value| value.eq_ignore_ascii_case("json"));

    let logger: Option<Arc<dyn LoggerPort>> = if log_enabled {
        Some(Arc::new(
            JsonLogger::new(Arc::clone(&sink)).with_min_level(parse_log_level(env)),
        ))
    } else {
        None
    };
    let telemetry: Option<Arc<dyn TelemetryPort>> = if telemetry_enabled {
        let base: Arc<dyn TelemetryPort> = Arc::new(JsonTelemetry::new(sink));
        Some(Arc::new(TaggedTelemetry::new(
            base,
            telemetry_tags([("surface", "cli")]),
        )))
    } else {
        None
    };

    Observability { logger, telemetry }
}

fn is_json(value: Option<&String>) -> bool {
    value.is_some_and(|value| value.eq_ignore_ascii_case("json"))
}

fn parse_log_level(env: &BTreeMap<String, String>) -> LogLevel {
    env.get(LOG_LEVEL_ENV)
        .and_then(|value| LogLevel::parse(value))
        .unwrap_or(LogLevel::Info)
}
