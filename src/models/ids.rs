//! Shift identifiers.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

/// Identifier of an exam shift, e.g. "22 Jan S1".
///
/// Upstream ids arrive with irregular whitespace, so every constructor
/// collapses internal whitespace runs to a single space and trims the ends.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct ShiftId(String);

impl ShiftId {
    /// Create a new ShiftId, normalising whitespace.
    pub fn new(raw: impl AsRef<str>) -> Self {
        Self(raw.as_ref().split_whitespace().collect::<Vec<_>>().join(" "))
    }

    /// Get the ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Sort key approximating the order in which shifts were held.
    ///
    /// The first two digit groups of the whitespace-stripped id are read as
    /// `(day, session)` and combined as `day * 10 + session`. Ids without two
    /// digit groups sort first with key 0.
    pub fn chronological_key(&self) -> u64 {
        static PATTERN: OnceLock<Regex> = OnceLock::new();
        let re = PATTERN.get_or_init(|| Regex::new(r"(?i)(\d+)[-S]*(\d+)").unwrap());

        let compact: String = self.0.chars().filter(|c| !c.is_whitespace()).collect();
        let Some(caps) = re.captures(&compact) else {
            return 0;
        };

        let day: u64 = caps[1].parse().unwrap_or(0);
        let session: u64 = caps[2].parse().unwrap_or(0);
        day.saturating_mul(10).saturating_add(session)
    }
}

impl fmt::Display for ShiftId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for ShiftId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ShiftId({})", self.0)
    }
}

impl From<String> for ShiftId {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for ShiftId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<ShiftId> for String {
    fn from(id: ShiftId) -> Self {
        id.0
    }
}
