//! Error types for the periodic cycle miner.
//!
//! This module provides structured error handling with:
//! - Stable error codes for machine parsing
//! - Category classification for error grouping
//! - Recoverability hints for automation
//! - Remediation suggestions for humans
//!
//! Only *fatal* conditions live here. Duplicate occurrences, labels without
//! cycles and early-stopped candidate generation are mining outcomes and are
//! reported as diagnostics on the fitted model instead.
//!
//! # Human-Facing Output
//!
//! ```text
//! ✗ Non-Monotonic Timestamps
//!   Reason: timestamp 90 at record 3 precedes previous timestamp 120
//!   Fix: Sort the event log by timestamp, or load it with the unsorted reader.
//! ```
//!
//! # Agent-Facing Output
//!
//! ```json
//! {
//!   "code": 12,
//!   "category": "input",
//!   "message": "timestamp 90 at record 3 precedes previous timestamp 120",
//!   "recoverable": true,
//!   "context": { "index": 3 }
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Result type alias for periodic cycle miner operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error categories for grouping related errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Event log errors (empty, unordered, malformed records).
    Input,
    /// Miner configuration errors.
    Config,
    /// Queries a fitted model cannot answer.
    Mining,
    /// File I/O and serialization errors.
    Io,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCategory::Input => write!(f, "input"),
            ErrorCategory::Config => write!(f, "config"),
            ErrorCategory::Mining => write!(f, "mining"),
            ErrorCategory::Io => write!(f, "io"),
        }
    }
}

/// Unified error type for the periodic cycle miner.
#[derive(Error, Debug)]
pub enum Error {
    // Input errors (10-19)
    #[error("event log is empty")]
    EmptyLog,

    #[error("record {index} has an empty event label")]
    EmptyLabel { index: usize },

    #[error("timestamp {timestamp} at record {index} precedes previous timestamp {previous}")]
    NonMonotonicTimestamp {
        index: usize,
        previous: i64,
        timestamp: i64,
    },

    #[error("malformed record on line {line}: {reason}")]
    MalformedRecord { line: usize, reason: String },

    // Configuration errors (20-29)
    #[error("configuration error: {0}")]
    Config(String),

    #[error("invalid value for {field}: {message}")]
    InvalidConfig { field: String, message: String },

    // Mining errors (30-39)
    #[error("residuals were not kept at fit time (set keep_residuals)")]
    ResidualsNotKept,

    #[error("mining failed: {0}")]
    Mining(String),

    // I/O errors (60-69)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Returns the error code for this error type.
    ///
    /// Error codes are stable and grouped by category:
    /// - 10-19: Input errors
    /// - 20-29: Configuration errors
    /// - 30-39: Mining errors
    /// - 60-69: I/O errors
    pub fn code(&self) -> u32 {
        match self {
            Error::EmptyLog => 10,
            Error::EmptyLabel { .. } => 11,
            Error::NonMonotonicTimestamp { .. } => 12,
            Error::MalformedRecord { .. } => 13,
            Error::Config(_) => 20,
            Error::InvalidConfig { .. } => 21,
            Error::ResidualsNotKept => 30,
            Error::Mining(_) => 31,
            Error::Io(_) => 60,
            Error::Json(_) => 61,
        }
    }

    /// Returns the error category for grouping and filtering.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::EmptyLog
            | Error::EmptyLabel { .. }
            | Error::NonMonotonicTimestamp { .. }
            | Error::MalformedRecord { .. } => ErrorCategory::Input,

            Error::Config(_) | Error::InvalidConfig { .. } => ErrorCategory::Config,

            Error::ResidualsNotKept | Error::Mining(_) => ErrorCategory::Mining,

            Error::Io(_) | Error::Json(_) => ErrorCategory::Io,
        }
    }

    /// Returns whether this error is potentially recoverable.
    ///
    /// Every input error is recoverable by fixing the log; nothing in the
    /// core is retried automatically.
    pub fn is_recoverable(&self) -> bool {
        match self {
            Error::EmptyLog => false,
            Error::EmptyLabel { .. } => true,
            Error::NonMonotonicTimestamp { .. } => true,
            Error::MalformedRecord { .. } => true,

            Error::Config(_) => true,
            Error::InvalidConfig { .. } => true,

            // Requires a new fit with different settings
            Error::ResidualsNotKept => true,
            Error::Mining(_) => false,

            Error::Io(_) => true,
            Error::Json(_) => true,
        }
    }

    /// Returns whether the error was raised before any mining started.
    pub fn is_input_error(&self) -> bool {
        self.category() == ErrorCategory::Input
    }

    /// Returns a human-readable remediation hint.
    pub fn remediation(&self) -> &'static str {
        match self {
            Error::EmptyLog => "Provide at least one (timestamp, label) occurrence.",
            Error::EmptyLabel { .. } => "Give every record a non-empty event label.",
            Error::NonMonotonicTimestamp { .. } => {
                "Sort the event log by timestamp, or load it with the unsorted reader."
            }
            Error::MalformedRecord { .. } => {
                "Each record needs an integer timestamp and a label. Check the input format flag."
            }
            Error::Config(_) => "Run 'pcm check' to validate the miner configuration.",
            Error::InvalidConfig { .. } => {
                "Use max_length >= 2 and 2 <= min_length <= max_length."
            }
            Error::ResidualsNotKept => "Fit again with keep_residuals enabled.",
            Error::Mining(_) => "Report the input and configuration that triggered this failure.",
            Error::Io(_) => "Check that the input file exists and is readable.",
            Error::Json(_) => "Invalid JSON. Check syntax with 'jq . <file>'.",
        }
    }

    /// Returns a short headline for human-readable output.
    pub fn headline(&self) -> &'static str {
        match self {
            Error::EmptyLog => "Empty Event Log",
            Error::EmptyLabel { .. } => "Empty Event Label",
            Error::NonMonotonicTimestamp { .. } => "Non-Monotonic Timestamps",
            Error::MalformedRecord { .. } => "Malformed Record",
            Error::Config(_) => "Configuration Error",
            Error::InvalidConfig { .. } => "Invalid Configuration",
            Error::ResidualsNotKept => "Residuals Not Kept",
            Error::Mining(_) => "Mining Error",
            Error::Io(_) => "I/O Error",
            Error::Json(_) => "JSON Parse Error",
        }
    }
}

/// Structured error response for JSON output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructuredError {
    /// Stable error code.
    pub code: u32,

    /// Error category for grouping.
    pub category: ErrorCategory,

    /// Human-readable error message.
    pub message: String,

    /// Whether the error is potentially recoverable.
    pub recoverable: bool,

    /// Additional structured context (e.g. record index, line).
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub context: HashMap<String, serde_json::Value>,
}

impl From<&Error> for StructuredError {
    fn from(err: &Error) -> Self {
        let mut context = HashMap::new();

        match err {
            Error::EmptyLabel { index } => {
                context.insert("index".to_string(), serde_json::json!(index));
            }
            Error::NonMonotonicTimestamp {
                index,
                previous,
                timestamp,
            } => {
                context.insert("index".to_string(), serde_json::json!(index));
                context.insert("previous".to_string(), serde_json::json!(previous));
                context.insert("timestamp".to_string(), serde_json::json!(timestamp));
            }
            Error::MalformedRecord { line, .. } => {
                context.insert("line".to_string(), serde_json::json!(line));
            }
            Error::InvalidConfig { field, .. } => {
                context.insert("field".to_string(), serde_json::json!(field));
            }
            _ => {}
        }

        StructuredError {
            code: err.code(),
            category: err.category(),
            message: err.to_string(),
            recoverable: err.is_recoverable(),
            context,
        }
    }
}

impl StructuredError {
    /// Serialize to JSON string.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| {
            format!(r#"{{"code":{},"error":"serialization_failed"}}"#, self.code)
        })
    }

    /// Serialize to pretty JSON string.
    pub fn to_json_pretty(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| self.to_json())
    }
}

/// Format an error for human-readable stderr output.
///
/// Output format:
/// ```text
/// ✗ [Headline]
///   Reason: [Error message]
///   Fix: [Remediation hint]
/// ```
pub fn format_error_human(err: &Error, use_color: bool) -> String {
    let (red, cyan, reset) = if use_color {
        ("\x1b[31m", "\x1b[36m", "\x1b[0m")
    } else {
        ("", "", "")
    };

    format!(
        "{red}✗{reset} {headline}\n  Reason: {message}\n  {cyan}Fix:{reset} {remediation}",
        red = red,
        cyan = cyan,
        reset = reset,
        headline = err.headline(),
        message = err,
        remediation = err.remediation()
    )
}
