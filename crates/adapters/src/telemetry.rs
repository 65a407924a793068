//! JSON telemetry adapter (counters, timers, and spans).

use crate::log_sink::LogSink;
use crate::logger::now_epoch_ms;
use quick_evac_ports::{TelemetryPort, TelemetryTags, TelemetryTimer};
use quick_evac_shared::{REDACTED, is_phone_key, is_secret_key};
use serde_json::{Map, Value};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Instant;

/// Telemetry adapter that emits JSON lines.
#[derive(Clone)]
pub struct JsonTelemetry {
    sink: Arc<dyn LogSink>,
    base_tags: TelemetryTags,
    next_span_id: Arc<AtomicU64>,
}

impl JsonTelemetry {
    /// Create a telemetry adapter backed by the provided sink.
    #[must_use]
    pub fn new(sink: Arc<dyn LogSink>) -> Self {
        Self {
            sink,
            base_tags: TelemetryTags::new(),
            next_span_id: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Set base tags applied to every metric.
    #[must_use]
    pub fn with_base_tags(mut self, tags: TelemetryTags) -> Self {
        self.base_tags = tags;
        self
    }
}

impl TelemetryPort for JsonTelemetry {
    fn increment_counter(&self, name: &str, value: u64, tags: Option<&TelemetryTags>) {
        let tags = merge_tags(&self.base_tags, tags);
        self.sink
            .write_line(&metric_line("counter", name, value, None, &tags));
    }

    fn record_timer_ms(&self, name: &str, duration_ms: u64, tags: Option<&TelemetryTags>) {
        let tags = merge_tags(&self.base_tags, tags);
        self.sink
            .write_line(&metric_line("timer", name, duration_ms, Some("ms"), &tags));
    }

    fn start_timer(&self, name: &str, tags: Option<&TelemetryTags>) -> Box<dyn TelemetryTimer> {
        let tags = merge_tags(&self.base_tags, tags);
        let span_id = self.next_span_id.fetch_add(1, Ordering::Relaxed);
        self.sink
            .write_line(&span_line("start", name, None, span_id, &tags));
        Box::new(JsonTelemetryTimer {
            sink: Arc::clone(&self.sink),
            name: name.into(),
            tags,
            span_id,
            started_at: Instant::now(),
            stopped: AtomicBool::new(false),
        })
    }
}

/// Telemetry adapter that applies base tags to an inner telemetry sink.
#[derive(Clone)]
pub struct TaggedTelemetry {
    inner: Arc<dyn TelemetryPort>,
    tags: TelemetryTags,
}

impl TaggedTelemetry {
    /// Wrap a telemetry sink with base tags.
    #[must_use]
    pub fn new(inner: Arc<dyn TelemetryPort>, tags: TelemetryTags) -> Self {
        Self { inner, tags }
    }
}

impl TelemetryPort for TaggedTelemetry {
    fn increment_counter(&self, name: &str, value: u64, tags: Option<&TelemetryTags>) {
        let merged = merge_tags(&self.tags, tags);
        self.inner.increment_counter(name, value, Some(&merged));
    }

    fn record_timer_ms(&self, name: &str, duration_ms: u64, tags: Option<&TelemetryTags>) {
        let merged = merge_tags(&self.tags, tags);
        self.inner.record_timer_ms(name, duration_ms, Some(&merged));
    }

    fn start_timer(&self, name: &str, tags: Option<&TelemetryTags>) -> Box<dyn TelemetryTimer> {
        let merged = merge_tags(&self.tags, tags);
        self.inner.start_timer(name, Some(&merged))
    }
}

struct JsonTelemetryTimer {
    sink: Arc<dyn LogSink>,
    name: Box<str>,
    tags: TelemetryTags,
    span_id: u64,
    started_at: Instant,
    stopped: AtomicBool,
}

impl TelemetryTimer for JsonTelemetryTimer {
    fn stop(&self) {
        if self.stopped.swap(true, Ordering::SeqCst) {
            return;
        }
        let duration_ms = u64::try_from(self.started_at.elapsed().as_millis()).unwrap_or_default();

        self.sink.write_line(&metric_line(
            "timer",
            &self.name,
            duration_ms,
            Some("ms"),
            &self.tags,
        ));
        self.sink.write_line(&span_line(
            "end",
            &self.name,
            Some(duration_ms),
            self.span_id,
            &self.tags,
        ));
    }
}

fn metric_line(
    metric_type: &str,
    name: &str,
    value: u64,
    unit: Option<&str>,
    tags: &TelemetryTags,
) -> String {
    let mut payload = Map::new();
    payload.insert("type".to_owned(), Value::from("metric"));
    payload.insert("timestampMs".to_owned(), Value::from(now_epoch_ms()));
    payload.insert("metricType".to_owned(), Value::from(metric_type));
    payload.insert("name".to_owned(), Value::from(name));
    payload.insert("value".to_owned(), Value::from(value));
    if let Some(unit) = unit {
        payload.insert("unit".to_owned(), Value::from(unit));
    }
    insert_tags(&mut payload, tags);
    to_line(payload)
}

fn span_line(
    event: &str,
    name: &str,
    duration_ms: Option<u64>,
    span_id: u64,
    tags: &TelemetryTags,
) -> String {
    let mut payload = Map::new();
    payload.insert("type".to_owned(), Value::from("span"));
    payload.insert("timestampMs".to_owned(), Value::from(now_epoch_ms()));
    payload.insert("event".to_owned(), Value::from(event));
    payload.insert("name".to_owned(), Value::from(name));
    payload.insert("spanId".to_owned(), Value::from(span_id));
    if let Some(duration_ms) = duration_ms {
        payload.insert("durationMs".to_owned(), Value::from(duration_ms));
    }
    insert_tags(&mut payload, tags);
    to_line(payload)
}

fn insert_tags(payload: &mut Map<String, Value>, tags: &TelemetryTags) {
    if tags.is_empty() {
        return;
    }
    let tags = tags
        .iter()
        .map(|(key, value)| (key.to_string(), Value::from(value.as_ref())))
        .collect();
    payload.insert("tags".to_owned(), Value::Object(tags));
}

fn to_line(payload: Map<String, Value>) -> String {
    serde_json::to_string(&Value::Object(payload)).map_or_else(
        |_| {
            "{\"type\":\"metric\",\"metricType\":\"error\",\"name\":\"telemetry.serializeFailed\",\"value\":1}\n"
                .to_owned()
        },
        |mut encoded| {
            encoded.push('\n');
            encoded
        },
    )
}

/// Merge tags; phone numbers never become tag values.
fn merge_tags(base: &TelemetryTags, extra: Option<&TelemetryTags>) -> TelemetryTags {
    let mut merged = base.clone();
    if let Some(extra) = extra {
        merged.extend(extra.iter().map(|(key, value)| (key.clone(), value.clone())));
    }
    for (key, value) in &mut merged {
        if is_secret_key(key) || is_phone_key(key) {
            *value = REDACTED.into();
        }
    }
    merged
}
