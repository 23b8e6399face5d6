//! Raw shift records to sorted shift summaries, plus population roll-ups.

use crate::models::{
    PopulationOverview, RawShiftRecord, ShiftId, ShiftSummary, Subject, SubjectRanking,
    SubjectStanding,
};

use super::{
    median, round_to, score_for_top_percentage, stats, MIN_SHIFT_SAMPLE, P98_SAMPLE_PCT,
    P99_SAMPLE_PCT,
};

/// Number of shifts listed per subject ranking.
pub const SUBJECT_RANKING_LEN: usize = 3;

/// Summarise one raw record. Shifts with `MIN_SHIFT_SAMPLE` or fewer
/// candidates are too small to trust and yield None.
pub fn summarize(record: &RawShiftRecord) -> Option<ShiftSummary> {
    let distribution = record.distribution();
    let count = distribution.total();
    if count <= MIN_SHIFT_SAMPLE {
        return None;
    }

    let physics = record.avg_physics.unwrap_or(0.0);
    let chemistry = record.avg_chemistry.unwrap_or(0.0);
    let maths = record.avg_maths.unwrap_or(0.0);
    let moments = stats(&distribution);

    Some(ShiftSummary {
        id: ShiftId::new(&record.id),
        count,
        avg: round_to(physics + chemistry + maths, 1),
        physics,
        chemistry,
        maths,
        median: median(&distribution),
        sd: round_to(moments.sd, 2),
        skew: round_to(moments.skew, 3),
        predicted_99: score_for_top_percentage(&distribution, P99_SAMPLE_PCT),
        predicted_98: score_for_top_percentage(&distribution, P98_SAMPLE_PCT),
        elite_ratio: round_to(distribution.elite_count() as f64 / count as f64 * 100.0, 2),
        distribution,
    })
}

/// Summaries of every trustworthy shift, hardest (lowest combined average) first.
pub fn aggregate(records: &[RawShiftRecord]) -> Vec<ShiftSummary> {
    let mut shifts: Vec<ShiftSummary> = records.iter().filter_map(summarize).collect();
    shifts.sort_by(|a, b| a.avg.total_cmp(&b.avg));
    shifts
}

/// Totals across the retained shifts. None when there are no shifts.
///
/// Expects `shifts` in aggregator order; the first entry is reported as the
/// hardest shift.
pub fn population_overview(shifts: &[ShiftSummary]) -> Option<PopulationOverview> {
    let hardest = shifts.first()?;

    let total_candidates: u64 = shifts.iter().map(|s| s.count).sum();
    let median_sum: f64 = shifts.iter().map(|s| s.median).sum();
    let top_candidates: f64 = shifts
        .iter()
        .map(|s| s.elite_ratio * s.count as f64 / 100.0)
        .sum();

    let global_top_ratio = if total_candidates > 0 {
        round_to(top_candidates / total_candidates as f64 * 100.0, 2)
    } else {
        0.0
    };

    Some(PopulationOverview {
        shift_count: shifts.len(),
        total_candidates,
        mean_median: round_to(median_sum / shifts.len() as f64, 1),
        global_top_ratio,
        hardest_shift: hardest.id.clone(),
        hardest_avg: hardest.avg,
        hardest_median: hardest.median,
    })
}

/// Shift with the lowest average in `subject`.
pub fn toughest_for(subject: Subject, shifts: &[ShiftSummary]) -> Option<&ShiftSummary> {
    shifts
        .iter()
        .min_by(|a, b| subject.average(a).total_cmp(&subject.average(b)))
}

/// The toughest shifts per subject, lowest subject average first.
pub fn subject_rankings(shifts: &[ShiftSummary]) -> Vec<SubjectRanking> {
    Subject::ALL
        .iter()
        .map(|&subject| {
            let mut sorted: Vec<&ShiftSummary> = shifts.iter().collect();
            sorted.sort_by(|a, b| subject.average(a).total_cmp(&subject.average(b)));

            SubjectRanking {
                subject,
                toughest: sorted
                    .into_iter()
                    .take(SUBJECT_RANKING_LEN)
                    .map(|s| SubjectStanding {
                        id: s.id.clone(),
                        average: subject.average(s),
                        median: s.median,
                    })
                    .collect(),
            }
        })
        .collect()
}
