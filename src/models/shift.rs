//! Derived per-shift summaries and population roll-ups.

use serde::{Deserialize, Serialize};

use super::{BucketedDistribution, ShiftId};

/// Everything the predictor and display layers need about one shift.
///
/// Built once per refresh by the aggregator and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShiftSummary {
    pub id: ShiftId,

    /// Candidates in the sample (sum of all bucket counts)
    pub count: u64,

    /// Combined subject average, rounded to 1 dp
    pub avg: f64,

    pub physics: f64,
    pub chemistry: f64,
    pub maths: f64,

    /// Interpolated median, 2 dp
    pub median: f64,

    /// Standard deviation of the bucket-midpoint model, 2 dp
    pub sd: f64,

    /// Skewness, 3 dp
    pub skew: f64,

    /// Score at the top 6.5% of the sample (99th percentile proxy)
    pub predicted_99: f64,

    /// Score at the top 11.75% of the sample (98th percentile proxy)
    pub predicted_98: f64,

    /// Percentage of candidates scoring 150+, 2 dp
    pub elite_ratio: f64,

    pub distribution: BucketedDistribution,
}

/// The three examined subjects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Subject {
    Physics,
    Chemistry,
    Maths,
}

impl Subject {
    pub const ALL: [Subject; 3] = [Subject::Physics, Subject::Chemistry, Subject::Maths];

    /// Subject average for a shift.
    pub fn average(self, shift: &ShiftSummary) -> f64 {
        match self {
            Subject::Physics => shift.physics,
            Subject::Chemistry => shift.chemistry,
            Subject::Maths => shift.maths,
        }
    }

    /// Next subject in the P -> C -> M rotation.
    pub fn next(self) -> Self {
        match self {
            Subject::Physics => Subject::Chemistry,
            Subject::Chemistry => Subject::Maths,
            Subject::Maths => Subject::Physics,
        }
    }
}

impl std::fmt::Display for Subject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Subject::Physics => write!(f, "Physics"),
            Subject::Chemistry => write!(f, "Chemistry"),
            Subject::Maths => write!(f, "Maths"),
        }
    }
}

/// A shift's standing for one subject.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubjectStanding {
    pub id: ShiftId,
    pub average: f64,
    pub median: f64,
}

/// Hardest shifts for one subject, lowest average first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubjectRanking {
    pub subject: Subject,
    pub toughest: Vec<SubjectStanding>,
}

/// Roll-up across every retained shift.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PopulationOverview {
    pub shift_count: usize,
    pub total_candidates: u64,

    /// Mean of the per-shift medians, 1 dp
    pub mean_median: f64,

    /// Percentage of all candidates scoring 150+, 2 dp
    pub global_top_ratio: f64,

    pub hardest_shift: ShiftId,
    pub hardest_avg: f64,
    pub hardest_median: f64,
}
