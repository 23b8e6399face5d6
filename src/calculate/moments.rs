//! Moments of a bucketed distribution, with each bucket's mass at its midpoint.

use serde::{Deserialize, Serialize};

use crate::models::{BucketedDistribution, BUCKET_COUNT};

use super::{CalcError, BIASED_BUCKETS, LOWEST_BUCKET_BIAS};

/// Mean, standard deviation and skewness of a distribution.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Moments {
    pub mean: f64,
    pub sd: f64,
    pub skew: f64,
}

/// Mean and standard deviation of the under-registration-corrected lower range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BiasedMoments {
    pub mean: f64,
    pub sd: f64,
}

/// Population moments over all twelve buckets.
///
/// An empty distribution yields all zeros. Skew is 0 when `sd` is 0.
pub fn stats(dist: &BucketedDistribution) -> Moments {
    let weights: Vec<f64> = dist.counts().iter().map(|&c| c as f64).collect();
    let Some((mean, variance, third)) = weighted_moments(&weights) else {
        return Moments::default();
    };

    let sd = variance.sqrt();
    let skew = if sd > 0.0 { third / sd.powi(3) } else { 0.0 };
    Moments { mean, sd, skew }
}

/// Moments of the 0-200 range with the lowest bucket weighted up.
///
/// Raw feeds under-register the very lowest scorers, so the 0-25 count is
/// multiplied by [`LOWEST_BUCKET_BIAS`] before weighting. Only used as the
/// population anchor in the predictor's lower zones.
pub fn biased_stats(dist: &BucketedDistribution) -> Result<BiasedMoments, CalcError> {
    let weights: Vec<f64> = dist.counts()[..BIASED_BUCKETS]
        .iter()
        .enumerate()
        .map(|(i, &c)| {
            if i == 0 {
                c as f64 * LOWEST_BUCKET_BIAS
            } else {
                c as f64
            }
        })
        .collect();

    let (mean, variance, _) = weighted_moments(&weights).ok_or_else(|| {
        CalcError::InvalidDistribution(format!(
            "no candidates in the lowest {} buckets",
            BIASED_BUCKETS
        ))
    })?;

    Ok(BiasedMoments {
        mean,
        sd: variance.sqrt(),
    })
}

/// Weighted mean, variance and third central moment over bucket midpoints.
/// Returns None when the total weight is zero.
fn weighted_moments(weights: &[f64]) -> Option<(f64, f64, f64)> {
    debug_assert!(weights.len() <= BUCKET_COUNT);

    let total: f64 = weights.iter().sum();
    if total <= 0.0 {
        return None;
    }

    let mean = weights
        .iter()
        .enumerate()
        .map(|(i, w)| w * BucketedDistribution::midpoint(i))
        .sum::<f64>()
        / total;

    let (second, third) = weights
        .iter()
        .enumerate()
        .fold((0.0, 0.0), |(second, third), (i, w)| {
            let deviation = BucketedDistribution::midpoint(i) - mean;
            (
                second + w * deviation.powi(2),
                third + w * deviation.powi(3),
            )
        });

    Some((mean, second / total, third / total))
}
