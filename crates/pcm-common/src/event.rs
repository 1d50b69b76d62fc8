//! Occurrences and the event log consumed by the miner.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::id::EventLabel;

/// Integer time unit (seconds, minutes, ... since an arbitrary epoch).
pub type Timestamp = i64;

/// A single occurrence of a labelled event.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Occurrence {
    /// Time of the occurrence.
    pub timestamp: Timestamp,
    /// Event label.
    pub label: EventLabel,
}

impl Occurrence {
    pub fn new(timestamp: Timestamp, label: impl Into<EventLabel>) -> Self {
        Self {
            timestamp,
            label: label.into(),
        }
    }
}

impl PartialOrd for Occurrence {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

/// Occurrences order by timestamp, then label.
impl Ord for Occurrence {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.timestamp
            .cmp(&other.timestamp)
            .then_with(|| self.label.cmp(&other.label))
    }
}

/// An ordered, validated sequence of occurrences.
///
/// Invariants: timestamps are non-decreasing and every label is non-blank.
/// Duplicate (label, timestamp) pairs are allowed here; the miner merges
/// them and reports each merge.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct EventLog {
    occurrences: Vec<Occurrence>,
}

impl EventLog {
    /// Validate an already time-ordered sequence of occurrences.
    pub fn new(occurrences: Vec<Occurrence>) -> Result<Self> {
        let mut previous: Option<Timestamp> = None;
        for (index, occ) in occurrences.iter().enumerate() {
            if occ.label.is_blank() {
                return Err(Error::EmptyLabel { index });
            }
            if let Some(prev) = previous {
                if occ.timestamp < prev {
                    return Err(Error::NonMonotonicTimestamp {
                        index,
                        previous: prev,
                        timestamp: occ.timestamp,
                    });
                }
            }
            previous = Some(occ.timestamp);
        }
        Ok(Self { occurrences })
    }

    /// Sort (stably, by timestamp) and then validate.
    pub fn from_unsorted(mut occurrences: Vec<Occurrence>) -> Result<Self> {
        occurrences.sort_by_key(|o| o.timestamp);
        Self::new(occurrences)
    }

    /// Build from `(timestamp, label)` pairs that are already time-ordered.
    pub fn from_pairs<I, L>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (Timestamp, L)>,
        L: Into<EventLabel>,
    {
        Self::new(
            pairs
                .into_iter()
                .map(|(ts, label)| Occurrence::new(ts, label))
                .collect(),
        )
    }

    /// Wrap occurrences already known to satisfy the log invariants.
    ///
    /// Used for logs rebuilt from a fitted model; the invariants are only
    /// checked in debug builds.
    pub fn from_sorted_unchecked(occurrences: Vec<Occurrence>) -> Self {
        debug_assert!(occurrences.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
        debug_assert!(occurrences.iter().all(|o| !o.label.is_blank()));
        Self { occurrences }
    }

    pub fn len(&self) -> usize {
        self.occurrences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.occurrences.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Occurrence> {
        self.occurrences.iter()
    }

    pub fn as_slice(&self) -> &[Occurrence] {
        &self.occurrences
    }

    /// Earliest and latest timestamp, or `None` for an empty log.
    pub fn time_bounds(&self) -> Option<(Timestamp, Timestamp)> {
        let first = self.occurrences.first()?.timestamp;
        let last = self.occurrences.last()?.timestamp;
        Some((first, last))
    }

    pub fn into_inner(self) -> Vec<Occurrence> {
        self.occurrences
    }
}

impl<'a> IntoIterator for &'a EventLog {
    type Item = &'a Occurrence;
    type IntoIter = std::slice::Iter<'a, Occurrence>;

    fn into_iter(self) -> Self::IntoIter {
        self.occurrences.iter()
    }
}

impl<'de> Deserialize<'de> for EventLog {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let occurrences = Vec::<Occurrence>::deserialize(deserializer)?;
        EventLog::new(occurrences).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_accepts_ordered_log() {
        let log = EventLog::from_pairs([(0, "a"), (0, "b"), (5, "a")]).unwrap();
        assert_eq!(log.len(), 3);
        assert_eq!(log.time_bounds(), Some((0, 5)));
    }

    #[test]
    fn test_new_rejects_decreasing_timestamps() {
        let err = EventLog::from_pairs([(10, "a"), (3, "a")]).unwrap_err();
        match err {
            Error::NonMonotonicTimestamp {
                index,
                previous,
                timestamp,
            } => {
                assert_eq!(index, 1);
                assert_eq!(previous, 10);
                assert_eq!(timestamp, 3);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_new_rejects_blank_label() {
        let err = EventLog::from_pairs([(1, "a"), (2, " ")]).unwrap_err();
        assert!(matches!(err, Error::EmptyLabel { index: 1 }));
    }

    #[test]
    fn test_from_unsorted_is_stable() {
        let log = EventLog::from_unsorted(vec![
            Occurrence::new(9, "x"),
            Occurrence::new(1, "b"),
            Occurrence::new(1, "a"),
        ])
        .unwrap();
        let labels: Vec<&str> = log.iter().map(|o| o.label.as_str()).collect();
        assert_eq!(labels, vec!["b", "a", "x"]);
    }

    #[test]
    fn test_empty_log_is_valid_value() {
        let log = EventLog::new(Vec::new()).unwrap();
        assert!(log.is_empty());
        assert_eq!(log.time_bounds(), None);
    }

    #[test]
    fn test_deserialize_validates() {
        let ok: EventLog =
            serde_json::from_str(r#"[{"timestamp":1,"label":"a"},{"timestamp":2,"label":"a"}]"#)
                .unwrap();
        assert_eq!(ok.len(), 2);

        let bad = serde_json::from_str::<EventLog>(
            r#"[{"timestamp":2,"label":"a"},{"timestamp":1,"label":"a"}]"#,
        );
        assert!(bad.is_err());
    }

    #[test]
    fn test_occurrence_ordering() {
        let mut occ = vec![
            Occurrence::new(2, "a"),
            Occurrence::new(1, "b"),
            Occurrence::new(1, "a"),
        ];
        occ.sort();
        assert_eq!(occ[0], Occurrence::new(1, "a"));
        assert_eq!(occ[2], Occurrence::new(2, "a"));
    }
}
