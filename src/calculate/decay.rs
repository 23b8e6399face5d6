//! Localized exponential-decay model of rank within a single bucket.
//!
//! Inside a 25-mark bucket, the number of candidates scoring above a point is
//! modelled as `rank(score) = r_top * e^(k * (score_high - score))` with
//! `k = ln(r_bottom / r_top) / 25`. Both the cutoff solver and the live
//! predictor go through this type so their answers agree near the markers.

use crate::models::{BucketedDistribution, BUCKET_WIDTH};

use super::RANK_FLOOR;

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct DecayWindow {
    /// Rank at the bucket's upper edge (floored)
    pub r_top: f64,
    /// Decay constant per mark
    pub k: f64,
    /// Upper edge of the bucket
    pub score_high: f64,
}

impl DecayWindow {
    /// Window for bucket `index` given how many candidates sit strictly above it.
    pub fn new(index: usize, count_above: f64, count_in_bucket: f64) -> Self {
        let r_top = count_above.max(RANK_FLOOR);
        let r_bottom = r_top + count_in_bucket.max(RANK_FLOOR);
        Self {
            r_top,
            k: (r_bottom / r_top).ln() / BUCKET_WIDTH,
            score_high: BucketedDistribution::upper_bound(index),
        }
    }

    /// Estimated number of candidates scoring above `score`.
    pub fn rank_at(&self, score: f64) -> f64 {
        self.r_top * (self.k * (self.score_high - score)).exp()
    }

    /// Score at which the estimated rank equals `rank`, clamped to the bucket.
    pub fn score_for_rank(&self, rank: f64) -> f64 {
        let distance_from_top = (rank / self.r_top).ln() / self.k;
        let score = self.score_high - distance_from_top;
        // NaN or infinite distances collapse onto the nearest edge
        if score.is_nan() {
            return self.score_high;
        }
        score.clamp(self.score_high - BUCKET_WIDTH, self.score_high)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rank_spans_bucket() {
        let window = DecayWindow::new(10, 5.0, 60.0);
        assert!((window.rank_at(275.0) - 5.0).abs() < 1e-9);
        assert!((window.rank_at(250.0) - 65.0).abs() < 1e-9);
    }

    #[test]
    fn test_score_for_rank_inverts_rank_at() {
        let window = DecayWindow::new(8, 120.0, 90.0);
        let score = 212.3;
        let rank = window.rank_at(score);
        assert!((window.score_for_rank(rank) - score).abs() < 1e-9);
    }

    #[test]
    fn test_floor_applies_to_empty_top() {
        let window = DecayWindow::new(11, 0.0, 0.0);
        assert_eq!(window.r_top, 0.5);
        assert!((window.rank_at(275.0) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_score_for_zero_rank_clamps_to_top_edge() {
        let window = DecayWindow::new(11, 0.0, 4.0);
        assert_eq!(window.score_for_rank(0.0), 300.0);
    }
}
