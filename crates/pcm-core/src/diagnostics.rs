//! Non-fatal conditions recorded during a fit.
//!
//! Diagnostics are results, not errors: the fit always completes. Each one
//! is kept on the fitted model and mirrored as a `tracing` event.

use serde::{Deserialize, Serialize};

use pcm_common::{EventLabel, Timestamp};

use crate::logging::{event_names, Stage};

/// Severity of a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warn,
}

/// A non-fatal condition observed while mining.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    /// `count` copies of the same (label, timestamp) were merged into one.
    DuplicateOccurrence {
        label: EventLabel,
        timestamp: Timestamp,
        count: usize,
    },
    /// No cycle of `requested_min_length` or more was worth its bits;
    /// shorter runs were tried instead.
    EarlyStopped {
        label: EventLabel,
        requested_min_length: usize,
    },
    /// Every occurrence of the label stays residual.
    NoCyclesDiscovered { label: EventLabel },
    /// Overlapping cycles were selected greedily; the cover may not be optimal.
    ApproximateCover { label: EventLabel },
}

impl Diagnostic {
    pub fn label(&self) -> &EventLabel {
        match self {
            Diagnostic::DuplicateOccurrence { label, .. }
            | Diagnostic::EarlyStopped { label, .. }
            | Diagnostic::NoCyclesDiscovered { label }
            | Diagnostic::ApproximateCover { label } => label,
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            Diagnostic::DuplicateOccurrence { .. } => Severity::Warn,
            _ => Severity::Info,
        }
    }

    /// Stable event name used when the diagnostic is logged.
    pub fn event_name(&self) -> &'static str {
        match self {
            Diagnostic::DuplicateOccurrence { .. } => event_names::INDEX_DUPLICATE,
            Diagnostic::EarlyStopped { .. } => event_names::GENERATE_EARLY_STOPPED,
            Diagnostic::NoCyclesDiscovered { .. } => event_names::SELECT_NO_CYCLES,
            Diagnostic::ApproximateCover { .. } => event_names::SELECT_APPROXIMATE,
        }
    }

    pub fn stage(&self) -> Stage {
        match self {
            Diagnostic::DuplicateOccurrence { .. } => Stage::Index,
            Diagnostic::EarlyStopped { .. } => Stage::Generate,
            Diagnostic::NoCyclesDiscovered { .. } | Diagnostic::ApproximateCover { .. } => {
                Stage::Select
            }
        }
    }

    /// One-line human message.
    pub fn message(&self) -> String {
        match self {
            Diagnostic::DuplicateOccurrence {
                label,
                timestamp,
                count,
            } => format!(
                "duplicate occurrence of '{}' at {} merged ({} copies)",
                label, timestamp, count
            ),
            Diagnostic::EarlyStopped {
                label,
                requested_min_length,
            } => format!(
                "early stopped: no cycle of length >= {} for '{}', trying shorter runs",
                requested_min_length, label
            ),
            Diagnostic::NoCyclesDiscovered { label } => {
                format!("no cycles discovered for '{}'", label)
            }
            Diagnostic::ApproximateCover { label } => {
                format!("overlapping cover for '{}' is approximate", label)
            }
        }
    }

    /// Mirror the diagnostic as a tracing event.
    pub fn emit(&self) {
        let label = self.label().as_str();
        let stage = self.stage();
        let message = self.message();
        match self {
            Diagnostic::DuplicateOccurrence {
                timestamp, count, ..
            } => tracing::warn!(
                target: event_names::INDEX_DUPLICATE,
                stage = %stage,
                label,
                timestamp = *timestamp,
                count = *count,
                "{}",
                message
            ),
            Diagnostic::EarlyStopped {
                requested_min_length,
                ..
            } => tracing::info!(
                target: event_names::GENERATE_EARLY_STOPPED,
                stage = %stage,
                label,
                requested_min_length = *requested_min_length,
                "{}",
                message
            ),
            Diagnostic::NoCyclesDiscovered { .. } => tracing::info!(
                target: event_names::SELECT_NO_CYCLES,
                stage = %stage,
                label,
                "{}",
                message
            ),
            Diagnostic::ApproximateCover { .. } => tracing::info!(
                target: event_names::SELECT_APPROXIMATE,
                stage = %stage,
                label,
                "{}",
                message
            ),
        }
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_is_warning() {
        let d = Diagnostic::DuplicateOccurrence {
            label: "backup".into(),
            timestamp: 60,
            count: 2,
        };
        assert_eq!(d.severity(), Severity::Warn);
        assert_eq!(d.event_name(), "index.duplicate");
        assert_eq!(d.stage(), Stage::Index);
        assert!(d.message().contains("merged"));
    }

    #[test]
    fn test_outcome_messages() {
        let stopped = Diagnostic::EarlyStopped {
            label: "a".into(),
            requested_min_length: 4,
        };
        assert!(stopped.message().starts_with("early stopped"));
        assert_eq!(stopped.severity(), Severity::Info);

        let none = Diagnostic::NoCyclesDiscovered { label: "a".into() };
        assert_eq!(none.to_string(), "no cycles discovered for 'a'");
        assert_eq!(none.event_name(), "select.no_cycles");
    }

    #[test]
    fn test_serialization_is_tagged() {
        let d = Diagnostic::ApproximateCover { label: "x".into() };
        let json = serde_json::to_string(&d).unwrap();
        assert_eq!(json, r#"{"kind":"approximate_cover","label":"x"}"#);
        let back: Diagnostic = serde_json::from_str(&json).unwrap();
        assert_eq!(back, d);
    }
}
