//! Structured event definitions for logging.
//!
//! Events follow a consistent schema for machine-parseable JSONL output.
//! Every event carries the run ID and the pipeline stage it came from.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Log levels for events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl From<tracing::Level> for Level {
    fn from(level: tracing::Level) -> Self {
        match level {
            tracing::Level::TRACE => Level::Trace,
            tracing::Level::DEBUG => Level::Debug,
            tracing::Level::INFO => Level::Info,
            tracing::Level::WARN => Level::Warn,
            tracing::Level::ERROR => Level::Error,
        }
    }
}

/// Stages of the mining pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Startup, configuration and input loading.
    Init,
    /// Per-label indexing and deduplication.
    Index,
    /// Candidate generation and pricing.
    Generate,
    /// Cover selection.
    Select,
    /// Rebuilding the log from the catalogue.
    Reconstruct,
    /// Rendering command output.
    Report,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Stage::Init => "init",
            Stage::Index => "index",
            Stage::Generate => "generate",
            Stage::Select => "select",
            Stage::Reconstruct => "reconstruct",
            Stage::Report => "report",
        };
        write!(f, "{}", s)
    }
}

/// Standard event names used in logging.
pub mod event_names {
    // Run lifecycle
    pub const RUN_STARTED: &str = "run.started";
    pub const RUN_FINISHED: &str = "run.finished";

    // Config/input
    pub const CONFIG_LOADED: &str = "config.loaded";
    pub const CONFIG_DEFAULT_USED: &str = "config.default_used";
    pub const CONFIG_ERROR: &str = "config.error";
    pub const INPUT_LOADED: &str = "input.loaded";

    // Fit
    pub const FIT_STARTED: &str = "fit.started";
    pub const FIT_FINISHED: &str = "fit.finished";
    pub const INDEX_DUPLICATE: &str = "index.duplicate";
    pub const LABEL_MINED: &str = "generate.label_mined";
    pub const GENERATE_EARLY_STOPPED: &str = "generate.early_stopped";
    pub const SELECT_NO_CYCLES: &str = "select.no_cycles";
    pub const SELECT_APPROXIMATE: &str = "select.approximate";

    // Reconstruct
    pub const RECONSTRUCT_FINISHED: &str = "reconstruct.finished";

    // Report
    pub const REPORT_WRITTEN: &str = "report.written";

    // Error events
    pub const INTERNAL_ERROR: &str = "internal_error";
}

/// A structured log event for JSONL output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEvent {
    /// Timestamp when the event occurred.
    pub ts: DateTime<Utc>,

    pub level: Level,

    /// Event name (e.g., "fit.started", "select.no_cycles").
    pub event: String,

    /// Unique ID for this invocation.
    pub run_id: String,

    /// Fit ID once a fit has started (nullable).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fit_id: Option<String>,

    pub stage: Stage,

    pub host_id: String,

    /// Human-readable message.
    pub message: String,

    /// Additional structured fields (stable keys).
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub fields: HashMap<String, serde_json::Value>,

    /// Event label the event concerns, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl LogEvent {
    /// Create a new log event with required fields.
    pub fn new(
        level: Level,
        event: impl Into<String>,
        run_id: impl Into<String>,
        host_id: impl Into<String>,
        stage: Stage,
        message: impl Into<String>,
    ) -> Self {
        LogEvent {
            ts: Utc::now(),
            level,
            event: event.into(),
            run_id: run_id.into(),
            fit_id: None,
            stage,
            host_id: host_id.into(),
            message: message.into(),
            fields: HashMap::new(),
            label: None,
        }
    }

    pub fn with_fit_id(mut self, fit_id: impl Into<String>) -> Self {
        self.fit_id = Some(fit_id.into());
        self
    }

    /// Add a field to the event.
    pub fn with_field(mut self, key: impl Into<String>, value: impl Serialize) -> Self {
        if let Ok(v) = serde_json::to_value(value) {
            self.fields.insert(key.into(), v);
        }
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Serialize to a single JSON line.
    pub fn to_jsonl(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| {
            format!(
                r#"{{"error":"serialization_failed","event":"{}"}}"#,
                self.event
            )
        })
    }
}

/// Context for generating log events with consistent run/fit IDs.
#[derive(Debug, Clone)]
pub struct LogContext {
    pub run_id: String,
    pub fit_id: Option<String>,
    pub host_id: String,
}

impl LogContext {
    pub fn new(run_id: impl Into<String>, host_id: impl Into<String>) -> Self {
        LogContext {
            run_id: run_id.into(),
            fit_id: None,
            host_id: host_id.into(),
        }
    }

    pub fn with_fit_id(mut self, fit_id: impl Into<String>) -> Self {
        self.fit_id = Some(fit_id.into());
        self
    }

    /// Create an event with this context.
    pub fn event(
        &self,
        level: Level,
        event: impl Into<String>,
        stage: Stage,
        message: impl Into<String>,
    ) -> LogEvent {
        let mut e = LogEvent::new(level, event, &self.run_id, &self.host_id, stage, message);
        e.fit_id.clone_from(&self.fit_id);
        e
    }

    pub fn info(
        &self,
        event: impl Into<String>,
        stage: Stage,
        message: impl Into<String>,
    ) -> LogEvent {
        self.event(Level::Info, event, stage, message)
    }

    pub fn warn(
        &self,
        event: impl Into<String>,
        stage: Stage,
        message: impl Into<String>,
    ) -> LogEvent {
        self.event(Level::Warn, event, stage, message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_event_serialization() {
        let event = LogEvent::new(
            Level::Info,
            "fit.started",
            "run-12345",
            "host-abc",
            Stage::Index,
            "fitting 3 labels",
        )
        .with_fit_id("fit-20261018-101500-a7xq")
        .with_field("labels", 3);

        let json = event.to_jsonl();
        assert!(json.contains(r#""event":"fit.started""#));
        assert!(json.contains(r#""level":"info""#));
        assert!(json.contains(r#""stage":"index""#));
        assert!(json.contains(r#""run_id":"run-12345""#));
        assert!(json.contains(r#""fit_id":"fit-20261018-101500-a7xq""#));
        assert!(!json.contains("label\":"));
    }

    #[test]
    fn test_log_event_with_label() {
        let event = LogEvent::new(
            Level::Warn,
            event_names::INDEX_DUPLICATE,
            "run-1",
            "host-1",
            Stage::Index,
            "duplicate merged",
        )
        .with_label("backup");
        assert!(event.to_jsonl().contains(r#""label":"backup""#));
    }

    #[test]
    fn test_log_context() {
        let ctx = LogContext::new("run-abc", "host-xyz").with_fit_id("fit-20261018-101500-b2c3");
        let event = ctx.info(event_names::FIT_FINISHED, Stage::Select, "fit complete");
        assert_eq!(event.run_id, "run-abc");
        assert_eq!(event.host_id, "host-xyz");
        assert_eq!(event.fit_id.as_deref(), Some("fit-20261018-101500-b2c3"));
        assert_eq!(event.stage, Stage::Select);
        assert_eq!(ctx.warn("x", Stage::Init, "y").level, Level::Warn);
    }

    #[test]
    fn test_stage_display() {
        assert_eq!(Stage::Index.to_string(), "index");
        assert_eq!(Stage::Generate.to_string(), "generate");
        assert_eq!(Stage::Reconstruct.to_string(), "reconstruct");
        assert_eq!(serde_json::to_string(&Stage::Select).unwrap(), "\"select\"");
    }

    #[test]
    fn test_event_names() {
        assert_eq!(event_names::FIT_STARTED, "fit.started");
        assert_eq!(event_names::INDEX_DUPLICATE, "index.duplicate");
        assert_eq!(event_names::SELECT_NO_CYCLES, "select.no_cycles");
    }
}
