// crates/suitegen-core/src/events.rs
// ============================================================================
// Module: Suite Events
// Description: Structured JSON-line events for generation and run activity.
// Purpose: Emit machine-readable progress records without a logging framework.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! Every notable step (a generation pass, an artifact write, a presence check,
//! a leaf execution) is recorded as one [`SuiteEvent`] and handed to an
//! [`EventSink`]. Sinks serialize each event as a single JSON line. Sink
//! failures are swallowed so logging can never fail a run.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::OpenOptions;
use std::io;
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use serde::Serialize;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Event identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SuiteEventKind {
    /// A suite generation pass started.
    GenerationStarted,
    /// A suite generation pass finished.
    GenerationCompleted,
    /// An artifact was written to the output directory.
    ArtifactWritten,
    /// A presence check ran.
    PresenceChecked,
    /// A leaf test ran.
    LeafExecuted,
    /// A suite run finished.
    RunCompleted,
}

/// Event payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SuiteEvent {
    /// Event identifier.
    pub event: SuiteEventKind,
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: u128,
    /// Suite the event belongs to.
    pub suite: String,
    /// Qualified check or leaf name, or artifact path.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    /// Outcome label (`pass`, `fail`, `drift`, `error`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<&'static str>,
    /// Free-form detail.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    /// Item count (fixtures, leaves, bytes) where meaningful.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
}

/// Inputs required to construct an event.
#[derive(Debug, Clone)]
pub struct SuiteEventParams {
    /// Event identifier.
    pub event: SuiteEventKind,
    /// Suite the event belongs to.
    pub suite: String,
    /// Qualified check or leaf name, or artifact path.
    pub subject: Option<String>,
    /// Outcome label.
    pub outcome: Option<&'static str>,
    /// Free-form detail.
    pub detail: Option<String>,
    /// Item count.
    pub count: Option<usize>,
}

impl SuiteEventParams {
    /// Creates params with only the event kind and suite set.
    #[must_use]
    pub fn new(event: SuiteEventKind, suite: impl Into<String>) -> Self {
        Self {
            event,
            suite: suite.into(),
            subject: None,
            outcome: None,
            detail: None,
            count: None,
        }
    }
}

impl SuiteEvent {
    /// Creates a new event with a consistent timestamp.
    #[must_use]
    pub fn new(params: SuiteEventParams) -> Self {
        let timestamp_ms =
            SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis();
        Self {
            event: params.event,
            timestamp_ms,
            suite: params.suite,
            subject: params.subject,
            outcome: params.outcome,
            detail: params.detail,
            count: params.count,
        }
    }
}

// ============================================================================
// SECTION: Trait
// ============================================================================

/// Sink for suite events.
pub trait EventSink: Send + Sync {
    /// Record an event.
    fn record(&self, event: &SuiteEvent);
}

/// Event sink that logs JSON lines to stderr.
pub struct StderrEventSink;

impl EventSink for StderrEventSink {
    fn record(&self, event: &SuiteEvent) {
        if let Ok(payload) = serde_json::to_string(event) {
            let _ = writeln!(std::io::stderr(), "{payload}");
        }
    }
}

/// Event sink that appends JSON lines to a file.
pub struct FileEventSink {
    /// File handle used for append-only logging.
    file: Mutex<std::fs::File>,
}

impl FileEventSink {
    /// Opens the event log file in append mode.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened.
    pub fn new(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }
}

impl EventSink for FileEventSink {
    fn record(&self, event: &SuiteEvent) {
        if let Ok(payload) = serde_json::to_string(event)
            && let Ok(mut file) = self.file.lock()
        {
            let _ = writeln!(file, "{payload}");
            let _ = file.flush();
        }
    }
}

/// No-op event sink.
pub struct NoopEventSink;

impl EventSink for NoopEventSink {
    fn record(&self, _event: &SuiteEvent) {}
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use std::io::Read;

    use super::EventSink;
    use super::FileEventSink;
    use super::SuiteEvent;
    use super::SuiteEventKind;
    use super::SuiteEventParams;

    #[test]
    fn file_sink_appends_one_json_line_per_event() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("events.jsonl");
        let sink = FileEventSink::new(&path)?;
        let mut params = SuiteEventParams::new(SuiteEventKind::PresenceChecked, "Diagnostics");
        params.subject = Some("Diagnostics.testAllFilesPresentInDiagnostics".to_string());
        params.outcome = Some("pass");
        sink.record(&SuiteEvent::new(params));
        sink.record(&SuiteEvent::new(SuiteEventParams::new(
            SuiteEventKind::RunCompleted,
            "Diagnostics",
        )));

        let mut text = String::new();
        std::fs::File::open(&path)?.read_to_string(&mut text)?;
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        let first: serde_json::Value = serde_json::from_str(lines[0])?;
        assert_eq!(first["event"], "presence_checked");
        assert_eq!(first["outcome"], "pass");
        let second: serde_json::Value = serde_json::from_str(lines[1])?;
        assert_eq!(second["event"], "run_completed");
        assert!(second.get("subject").is_none());
        Ok(())
    }
}
