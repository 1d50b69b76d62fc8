//! Periodic cycle miner common types, IDs, and errors.
//!
//! This crate provides foundational types shared across the miner crates:
//! - Occurrences and the validated event log
//! - Event label and fit identity types
//! - Common error types
//! - Output format selection

pub mod error;
pub mod event;
pub mod id;
pub mod output;

pub use error::{Error, ErrorCategory, Result, StructuredError};
pub use event::{EventLog, Occurrence, Timestamp};
pub use id::{EventLabel, FitId};
pub use output::OutputFormat;

/// Schema version of every JSON payload the miner emits.
pub const SCHEMA_VERSION: &str = "1.0.0";
