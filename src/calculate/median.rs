//! Median by linear interpolation inside the bucket holding the midpoint rank.

use crate::models::{BucketedDistribution, BUCKET_WIDTH};

use super::round_to;

/// Median score, 2 dp. Returns 0 for an empty distribution.
pub fn median(dist: &BucketedDistribution) -> f64 {
    let total = dist.total();
    if total == 0 {
        return 0.0;
    }

    let mid_rank = total as f64 / 2.0;
    let mut running = 0.0;

    for (i, &count) in dist.counts().iter().enumerate() {
        let count = count as f64;
        if running + count >= mid_rank {
            let fraction = (mid_rank - running) / count;
            return round_to(
                BucketedDistribution::lower_bound(i) + fraction * BUCKET_WIDTH,
                2,
            );
        }
        running += count;
    }

    0.0
}
