//! Bucketed score distributions and the raw per-shift records they come from.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Number of fixed score buckets covering [0, 300).
pub const BUCKET_COUNT: usize = 12;

/// Width of each bucket in marks.
pub const BUCKET_WIDTH: f64 = 25.0;

/// Highest attainable score.
pub const MAX_SCORE: f64 = 300.0;

/// Bucket labels in positional order (index 0 = lowest scores).
pub const BUCKET_LABELS: [&str; BUCKET_COUNT] = [
    "0-25", "25-50", "50-75", "75-100", "100-125", "125-150", "150-175", "175-200", "200-225",
    "225-250", "250-275", "275-300",
];

/// Index of the first "elite" bucket (scores >= 150).
pub const ELITE_BUCKET_START: usize = 6;

/// Per-bucket entry as delivered by the upstream feed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Segment {
    #[serde(rename = "provisionalCount", default)]
    pub provisional_count: Option<f64>,
}

/// One shift's aggregate record as delivered by the upstream feed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawShiftRecord {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,

    #[serde(rename = "avgProvisionalPhysicsMarks", default)]
    pub avg_physics: Option<f64>,

    #[serde(rename = "avgProvisionalChemistryMarks", default)]
    pub avg_chemistry: Option<f64>,

    #[serde(rename = "avgProvisionalMathematicsMarks", default)]
    pub avg_maths: Option<f64>,

    /// Keyed by bucket label; unknown labels are ignored, missing ones count as 0.
    #[serde(default)]
    pub segments: HashMap<String, Segment>,
}

impl RawShiftRecord {
    /// Build the record's distribution from its labelled segments.
    pub fn distribution(&self) -> BucketedDistribution {
        let mut counts = [0u64; BUCKET_COUNT];
        for (slot, label) in counts.iter_mut().zip(BUCKET_LABELS.iter()) {
            *slot = self
                .segments
                .get(*label)
                .and_then(|s| s.provisional_count)
                .map(sanitize_count)
                .unwrap_or(0);
        }
        BucketedDistribution::new(counts)
    }
}

/// Coerce a feed value into a candidate count. Non-finite or negative values become 0.
fn sanitize_count(value: f64) -> u64 {
    if value.is_finite() && value > 0.0 {
        value.round() as u64
    } else {
        0
    }
}

/// Candidate counts over the twelve fixed 25-mark buckets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BucketedDistribution {
    counts: [u64; BUCKET_COUNT],
}

impl BucketedDistribution {
    pub fn new(counts: [u64; BUCKET_COUNT]) -> Self {
        Self { counts }
    }

    pub fn counts(&self) -> &[u64; BUCKET_COUNT] {
        &self.counts
    }

    pub fn count(&self, index: usize) -> u64 {
        self.counts[index]
    }

    /// Total candidates across all buckets.
    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    /// Candidates in buckets strictly above `index`.
    pub fn count_above(&self, index: usize) -> u64 {
        self.counts[index + 1..].iter().sum()
    }

    /// Candidates scoring 150 or more.
    pub fn elite_count(&self) -> u64 {
        self.counts[ELITE_BUCKET_START..].iter().sum()
    }

    /// Bucket containing `score`; 300 maps into the last bucket.
    pub fn bucket_index(score: f64) -> usize {
        ((score / BUCKET_WIDTH).floor().max(0.0) as usize).min(BUCKET_COUNT - 1)
    }

    pub fn lower_bound(index: usize) -> f64 {
        index as f64 * BUCKET_WIDTH
    }

    pub fn upper_bound(index: usize) -> f64 {
        (index + 1) as f64 * BUCKET_WIDTH
    }

    pub fn midpoint(index: usize) -> f64 {
        Self::lower_bound(index) + BUCKET_WIDTH / 2.0
    }
}
