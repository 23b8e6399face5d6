//! Marks-to-percentile prediction.
//!
//! The predictor first estimates what share of the selected shift's *sample*
//! scored above the input, using the same in-bucket decay model as the cutoff
//! solver. That sample share is then remapped to an exam-wide "top
//! percentage" in zones:
//!
//! - top 6.5% of the sample: a blend of two power curves ending at the 99th
//!   percentile marker
//! - 6.5% to 11.75%: linear between the 99th and 98th percentile markers
//! - below that: population zones anchored on the biased moments of the lower
//!   score range (exponential bridge, half-SD buffer, quadratic fall-off)

use serde::Serialize;

use crate::models::{BucketedDistribution, ShiftSummary, MAX_SCORE};

use super::decay::DecayWindow;
use super::moments::biased_stats;
use super::*;

/// Displayable result of a prediction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PercentileOutcome {
    /// Invalid score or no shift selected
    Unavailable,
    /// Non-perfect score whose percentile would round to the top of the scale
    AboveScale,
    Percentile(f64),
}

impl PercentileOutcome {
    pub fn value(&self) -> Option<f64> {
        match self {
            PercentileOutcome::Percentile(p) => Some(*p),
            _ => None,
        }
    }
}

impl std::fmt::Display for PercentileOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PercentileOutcome::Unavailable => write!(f, "---"),
            PercentileOutcome::AboveScale => write!(f, "99.99+"),
            PercentileOutcome::Percentile(p) => write!(f, "{:.2}%", p),
        }
    }
}

impl Serialize for PercentileOutcome {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Predict the displayed percentile for `score` in the selected shift.
pub fn predict(score: f64, selected: Option<&ShiftSummary>) -> PercentileOutcome {
    let Some(shift) = selected else {
        return PercentileOutcome::Unavailable;
    };
    let Some(percentile) = predict_percentile(score, shift) else {
        return PercentileOutcome::Unavailable;
    };

    if score < TOP_SCORE_CLAMP {
        if percentile >= SATURATION_PERCENTILE {
            PercentileOutcome::AboveScale
        } else {
            PercentileOutcome::Percentile(percentile)
        }
    } else {
        PercentileOutcome::Percentile(percentile.clamp(SATURATION_PERCENTILE, 100.0))
    }
}

/// Unformatted percentile for `score`, or None when the inputs are unusable.
pub fn predict_percentile(score: f64, shift: &ShiftSummary) -> Option<f64> {
    if !score.is_finite() || !(0.0..=MAX_SCORE).contains(&score) || shift.count == 0 {
        return None;
    }

    let dist = &shift.distribution;
    let index = BucketedDistribution::bucket_index(score);
    let window = DecayWindow::new(
        index,
        dist.count_above(index) as f64,
        dist.count(index) as f64,
    );

    let rank_within = window.rank_at(score);
    let sample_above_pct = rank_within / shift.count as f64 * 100.0;

    let top_exam_pct = if sample_above_pct <= P99_SAMPLE_PCT {
        elite_top_percentage(sample_above_pct / P99_SAMPLE_PCT, shift.avg)
    } else if sample_above_pct <= P98_SAMPLE_PCT {
        let t = (sample_above_pct - P99_SAMPLE_PCT) / (P98_SAMPLE_PCT - P99_SAMPLE_PCT);
        P99_EXAM_PCT + t * (P98_EXAM_PCT - P99_EXAM_PCT)
    } else {
        population_top_percentage(score, dist, shift.predicted_98)?
    };

    Some(100.0 - top_exam_pct)
}

/// Exam-wide top percentage for the top 6.5% of the sample.
///
/// `rel_pos` is 0 at the very top of the sample and 1 at the 99th percentile
/// marker. Above [`BLEND_UPPER`] the elite curve applies alone, below
/// [`BLEND_LOWER`] the damped ultra-elite curve does, and in between the two
/// are blended linearly. Both exponents depend on the shift's average.
fn elite_top_percentage(rel_pos: f64, avg: f64) -> f64 {
    let base_exp = BASE_EXPONENT + avg / BASE_EXPONENT_AVG_SCALE;
    let ultra_damping =
        (ULTRA_DAMPING_CEILING - avg / ULTRA_DAMPING_AVG_SCALE).max(ULTRA_DAMPING_FLOOR);

    let elite = rel_pos.powf(base_exp);
    let boundary = ULTRA_ANCHOR.powf(base_exp);
    let ultra = boundary * (rel_pos / ULTRA_ANCHOR).powf(ultra_damping);

    if rel_pos > BLEND_UPPER {
        elite
    } else if rel_pos < BLEND_LOWER {
        ultra
    } else {
        let weight = (rel_pos - BLEND_LOWER) / (BLEND_UPPER - BLEND_LOWER);
        elite * weight + ultra * (1.0 - weight)
    }
}

/// Exam-wide top percentage for the bulk of the population.
fn population_top_percentage(score: f64, dist: &BucketedDistribution, p98_score: f64) -> Option<f64> {
    let biased = biased_stats(dist).ok()?;
    let p90_anchor = biased.mean + P90_ANCHOR_SD * biased.sd;
    let buffer = BUFFER_SD * biased.sd;
    let cliff_edge = p90_anchor - buffer;

    let top = if score >= p90_anchor {
        // exponential bridge from the 98th to the 90th percentile marker
        let k = (P90_EXAM_PCT / P98_EXAM_PCT).ln() / (p98_score - p90_anchor).max(1.0);
        P98_EXAM_PCT * (k * (p98_score - score)).exp()
    } else if score >= cliff_edge {
        let t = (p90_anchor - score) / buffer.max(1.0);
        P90_EXAM_PCT + t * (P80_EXAM_PCT - P90_EXAM_PCT)
    } else {
        let t = (cliff_edge - score) / cliff_edge.max(1.0);
        P80_EXAM_PCT + FLOOR_DROP_PCT * t.powi(2)
    };

    Some(top)
}
