//! Score required to reach a given top percentage of the sample.

use crate::models::{BucketedDistribution, BUCKET_COUNT};

use super::decay::DecayWindow;
use super::{round_to, MIN_SOLVER_SAMPLE};

/// Score achieved by the top `target_pct` percent of the sample, 1 dp.
///
/// Returns 0 when the sample has fewer than [`MIN_SOLVER_SAMPLE`] candidates
/// (no reliable prediction) or when no bucket brackets the target rank.
pub fn score_for_top_percentage(dist: &BucketedDistribution, target_pct: f64) -> f64 {
    let total = dist.total();
    if total < MIN_SOLVER_SAMPLE {
        return 0.0;
    }

    let target_rank = total as f64 * (target_pct / 100.0);
    let mut rank_above = 0.0;

    for index in (0..BUCKET_COUNT).rev() {
        let count = dist.count(index) as f64;
        let rank_bottom = rank_above + count;

        if target_rank >= rank_above && target_rank <= rank_bottom {
            let window = DecayWindow::new(index, rank_above, count);
            return round_to(window.score_for_rank(target_rank), 1);
        }
        rank_above = rank_bottom;
    }

    0.0
}
