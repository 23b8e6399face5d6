//! Display-side view state.
//!
//! The engine holds no selection of its own: whoever renders shifts passes a
//! `ViewState` in, and replaces it wholesale when the user changes something.

use serde::{Deserialize, Serialize};

use super::{ShiftId, ShiftSummary};

/// Ordering used when laying shifts out side by side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortMode {
    /// Order in which the shifts were held
    #[default]
    Date,
    /// Ascending combined average (hardest first)
    Mean,
}

impl std::str::FromStr for SortMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "date" => Ok(SortMode::Date),
            "mean" => Ok(SortMode::Mean),
            other => Err(format!("unknown sort mode: {} (expected date or mean)", other)),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewState {
    pub selected: Option<ShiftId>,
    #[serde(default)]
    pub sort: SortMode,
}

impl ViewState {
    pub fn with_selected(self, id: ShiftId) -> Self {
        Self {
            selected: Some(id),
            ..self
        }
    }

    pub fn with_sort(self, sort: SortMode) -> Self {
        Self { sort, ..self }
    }

    /// Resolve the selection against the current shifts.
    ///
    /// An unknown or absent selection falls back to the first shift, which is
    /// the hardest one in aggregator order.
    pub fn resolve<'a>(&self, shifts: &'a [ShiftSummary]) -> Option<&'a ShiftSummary> {
        self.selected
            .as_ref()
            .and_then(|id| shifts.iter().find(|s| &s.id == id))
            .or_else(|| shifts.first())
    }

    /// A display-ordered copy of the shifts. The input order is untouched.
    pub fn ordered<'a>(&self, shifts: &'a [ShiftSummary]) -> Vec<&'a ShiftSummary> {
        let mut rows: Vec<&ShiftSummary> = shifts.iter().collect();
        match self.sort {
            SortMode::Date => rows.sort_by_key(|s| s.id.chronological_key()),
            SortMode::Mean => rows.sort_by(|a, b| a.avg.total_cmp(&b.avg)),
        }
        rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BucketedDistribution;

    fn shift(id: &str, avg: f64) -> ShiftSummary {
        ShiftSummary {
            id: id.into(),
            count: 200,
            avg,
            physics: avg / 3.0,
            chemistry: avg / 3.0,
            maths: avg / 3.0,
            median: avg,
            sd: 30.0,
            skew: 0.0,
            predicted_99: 0.0,
            predicted_98: 0.0,
            elite_ratio: 0.0,
            distribution: BucketedDistribution::default(),
        }
    }

    #[test]
    fn test_sort_mode_from_str() {
        assert_eq!("date".parse::<SortMode>(), Ok(SortMode::Date));
        assert_eq!("MEAN".parse::<SortMode>(), Ok(SortMode::Mean));
        assert!("median".parse::<SortMode>().is_err());
    }

    #[test]
    fn test_resolve_defaults_to_first_shift() {
        let shifts = vec![shift("22-S1", 80.0), shift("23-S1", 95.0)];
        let view = ViewState::default();
        assert_eq!(view.resolve(&shifts).unwrap().id.as_str(), "22-S1");

        let view = view.with_selected("23-S1".into());
        assert_eq!(view.resolve(&shifts).unwrap().id.as_str(), "23-S1");

        let view = ViewState::default().with_selected("nope".into());
        assert_eq!(view.resolve(&shifts).unwrap().id.as_str(), "22-S1");

        assert!(ViewState::default().resolve(&[]).is_none());
    }

    #[test]
    fn test_ordered_by_date_and_mean() {
        let shifts = vec![
            shift("24-S1", 70.0),
            shift("22-S2", 90.0),
            shift("22-S1", 110.0),
        ];

        let by_date: Vec<_> = ViewState::default()
            .ordered(&shifts)
            .iter()
            .map(|s| s.id.as_str())
            .collect();
        assert_eq!(by_date, vec!["22-S1", "22-S2", "24-S1"]);

        let by_mean: Vec<_> = ViewState::default()
            .with_sort(SortMode::Mean)
            .ordered(&shifts)
            .iter()
            .map(|s| s.id.as_str())
            .collect();
        assert_eq!(by_mean, vec!["24-S1", "22-S2", "22-S1"]);

        assert_eq!(shifts[0].id.as_str(), "24-S1");
    }
}
