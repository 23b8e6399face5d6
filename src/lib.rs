//! # Shift Analytics
//!
//! Shift-wise difficulty statistics and a marks-to-percentile predictor for a
//! multi-shift standardized exam.
//!
//! ## Architecture
//!
//! - **models**: Core data structures (distributions, shift summaries, view state)
//! - **calculate**: Pure statistics engine (moments, median, cutoffs, percentile prediction)
//! - **fetch**: Raw record sources (comparative-scores API, offline file)
//! - **sync**: Refresh coordination with stale-result rejection
//! - **api**: REST API endpoints
//! - **config**: Configuration loading and validation

pub mod api;
pub mod calculate;
pub mod config;
pub mod fetch;
pub mod models;
pub mod sync;

pub use models::*;

use std::time::Duration;

/// Parse a human-friendly duration string (e.g., "6h", "15m", "90s").
pub fn parse_duration(s: &str) -> Option<Duration> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    let (num_str, multiplier) = if let Some(n) = s.strip_suffix('h') {
        (n, 3600)
    } else if let Some(n) = s.strip_suffix('m') {
        (n, 60)
    } else if let Some(n) = s.strip_suffix('s') {
        (n, 1)
    } else {
        // Default to seconds
        (s, 1)
    };

    let num: u64 = num_str.trim().parse().ok()?;
    num.checked_mul(multiplier).map(Duration::from_secs)
}
