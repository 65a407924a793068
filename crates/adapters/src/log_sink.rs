//! Log sinks for the observability adapters.

use quick_evac_shared::{ErrorClass, ErrorCode, ErrorEnvelope, Result};
use std::io::Write;
use std::sync::Mutex;

/// A sink that receives pre-formatted log lines.
pub trait LogSink: Send + Sync {
    /// Write a line to the sink.
    fn write_line(&self, line: &str);
}

/// Log sink that writes to stderr.
#[derive(Debug, Default)]
pub struct StderrLogSink;

impl LogSink for StderrLogSink {
    fn write_line(&self, line: &str) {
        let mut stderr = std::io::stderr().lock();
        if let Err(error) = stderr.write_all(line.as_bytes()) {
            eprintln!("log sink write failed: {error}");
        }
    }
}

/// Log sink that keeps lines in memory.
#[derive(Debug, Default)]
pub struct MemoryLogSink {
    lines: Mutex<Vec<String>>,
}

impl MemoryLogSink {
    /// Drain every captured line.
    pub fn take(&self) -> Result<Vec<String>> {
        let mut guard = self.lines.lock().map_err(|_| poisoned())?;
        Ok(std::mem::take(&mut *guard))
    }

    /// Parse every captured line as JSON without draining.
    pub fn json_lines(&self) -> Result<Vec<serde_json::Value>> {
        let guard = self.lines.lock().map_err(|_| poisoned())?;
        guard
            .iter()
            .map(|line| {
                serde_json::from_str(line.trim()).map_err(|error| {
                    ErrorEnvelope::unexpected(
                        ErrorCode::internal(),
                        format!("captured line is not JSON: {error}"),
                        ErrorClass::NonRetriable,
                    )
                })
            })
            .collect()
    }
}

impl LogSink for MemoryLogSink {
    fn write_line(&self, line: &str) {
        if let Ok(mut guard) = self.lines.lock() {
            guard.push(line.to_owned());
        }
    }
}

fn poisoned() -> ErrorEnvelope {
    ErrorEnvelope::unexpected(
        ErrorCode::internal(),
        "log sink lock poisoned",
        ErrorClass::NonRetriable,
    )
}
