//! Event label and fit run identity types.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Name of a discrete event kind (e.g. `"wake_up"`).
///
/// Labels order lexicographically; every per-label output of the miner is
/// grouped in that order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventLabel(pub String);

impl EventLabel {
    /// Create a label from anything string-like.
    pub fn new<S: Into<String>>(value: S) -> Self {
        Self(value.into())
    }

    /// Access the label as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True when the label is empty or only whitespace.
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for EventLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for EventLabel {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for EventLabel {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Identifier for one fit invocation, carried in reports.
///
/// Format: `fit-YYYYMMDD-HHMMSS-XXXX`
/// Example: `fit-20260115-143022-a7xq`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FitId(pub String);

impl FitId {
    /// Generate a new fit ID.
    pub fn new() -> Self {
        let now = chrono::Utc::now();
        let suffix = generate_base32_suffix();
        FitId(format!(
            "fit-{}-{}-{}",
            now.format("%Y%m%d"),
            now.format("%H%M%S"),
            suffix
        ))
    }

    /// Parse an existing fit ID string.
    pub fn parse(s: &str) -> Option<Self> {
        if s.len() != 24 {
            return None;
        }
        let rest = s.strip_prefix("fit-")?;
        let bytes = rest.as_bytes();
        if bytes.get(8) != Some(&b'-') || bytes.get(15) != Some(&b'-') {
            return None;
        }
        let date = &rest[0..8];
        let time = &rest[9..15];
        let suffix = &rest[16..20];
        if !date.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        if !time.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        if !suffix.chars().all(|c| matches!(c, 'a'..='z' | '2'..='7')) {
            return None;
        }
        Some(FitId(s.to_string()))
    }
}

impl Default for FitId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for FitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

fn generate_base32_suffix() -> String {
    let uuid = uuid::Uuid::new_v4();
    let bytes = uuid.as_bytes();
    let mut value = ((bytes[0] as u32) << 16) | ((bytes[1] as u32) << 8) | (bytes[2] as u32);
    value &= 0x000F_FFFF;
    let alphabet = b"abcdefghijklmnopqrstuvwxyz234567";
    let mut out = String::with_capacity(4);
    for shift in [15_u32, 10, 5, 0] {
        let idx = ((value >> shift) & 0x1F) as usize;
        out.push(alphabet[idx] as char);
    }
    out
}
