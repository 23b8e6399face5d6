//! Statistics calculation engine.
//!
//! Pure functions over bucketed score distributions:
//! - Moments (mean, SD, skew) and the biased lower-range variant
//! - Interpolated median
//! - Score cutoffs for a target top percentage
//! - Marks-to-percentile prediction
//! - Aggregation of raw shift records into summaries
//!
//! Nothing in here performs I/O or logs; failures come back as sentinels or
//! [`CalcError`].

mod aggregate;
mod decay;
mod inverse;
mod median;
mod moments;
mod predict;

pub use aggregate::*;
pub use inverse::score_for_top_percentage;
pub use median::median;
pub use moments::{biased_stats, stats, BiasedMoments, Moments};
pub use predict::{predict, predict_percentile, PercentileOutcome};

use thiserror::Error;

/// Calculation errors.
#[derive(Debug, Error)]
pub enum CalcError {
    #[error("Invalid distribution: {0}")]
    InvalidDistribution(String),
}

// ── Sample thresholds ────────────────────────────────────────────

/// Smallest sample for which the cutoff solver predicts anything.
pub const MIN_SOLVER_SAMPLE: u64 = 50;

/// Shifts with this many candidates or fewer are discarded.
pub const MIN_SHIFT_SAMPLE: u64 = 100;

/// Floor applied to ranks and bucket counts inside the decay model.
pub const RANK_FLOOR: f64 = 0.5;

// ── Percentile markers ───────────────────────────────────────────

/// Share of the sample treated as the exam's top 1% (99th percentile).
pub const P99_SAMPLE_PCT: f64 = 6.5;

/// Share of the sample treated as the exam's top 2% (98th percentile).
pub const P98_SAMPLE_PCT: f64 = 11.75;

pub const P99_EXAM_PCT: f64 = 1.0;
pub const P98_EXAM_PCT: f64 = 2.0;
pub const P90_EXAM_PCT: f64 = 10.0;
pub const P80_EXAM_PCT: f64 = 20.0;

/// Extra top percentage added at score 0 by the quadratic fall-off.
pub const FLOOR_DROP_PCT: f64 = 75.0;

// ── Elite-zone curve shape ───────────────────────────────────────

/// Elite exponent is `BASE_EXPONENT + avg / BASE_EXPONENT_AVG_SCALE`.
pub const BASE_EXPONENT: f64 = 1.25;
pub const BASE_EXPONENT_AVG_SCALE: f64 = 1200.0;

/// Ultra-elite damping is `max(FLOOR, CEILING - avg / AVG_SCALE)`.
pub const ULTRA_DAMPING_CEILING: f64 = 1.25;
pub const ULTRA_DAMPING_AVG_SCALE: f64 = 280.0;
pub const ULTRA_DAMPING_FLOOR: f64 = 0.75;

/// Relative position where the ultra-elite curve meets the elite curve.
pub const ULTRA_ANCHOR: f64 = 0.4;

/// Relative positions between which the two curves are blended.
pub const BLEND_LOWER: f64 = 0.35;
pub const BLEND_UPPER: f64 = 0.65;

// ── Population anchor ────────────────────────────────────────────

/// Buckets (from the bottom) used by the biased moments: 0-200.
pub const BIASED_BUCKETS: usize = 8;

/// Multiplier for the 0-25 count, correcting under-registration.
pub const LOWEST_BUCKET_BIAS: f64 = 2.5;

/// The 90th percentile anchor sits this many biased SDs above the biased mean.
pub const P90_ANCHOR_SD: f64 = 0.38;

/// Width of the 90th-to-80th percentile buffer, in biased SDs.
pub const BUFFER_SD: f64 = 0.5;

// ── Display policy ───────────────────────────────────────────────

/// Scores at or above this always read as top-of-scale.
pub const TOP_SCORE_CLAMP: f64 = 290.0;

/// Percentile at which non-perfect scores are shown as "99.99+".
pub const SATURATION_PERCENTILE: f64 = 99.99;

/// Round `value` to `decimals` places.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
