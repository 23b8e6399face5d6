use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::state::AppState;
use crate::calculate::{predict, PercentileOutcome};
use crate::models::ShiftId;

use super::shifts::view_from_params;

#[derive(Debug, Deserialize)]
pub struct PredictParams {
    /// Raw marks as typed; anything unparseable predicts "---"
    pub score: Option<String>,
    pub shift: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PredictResponse {
    /// Shift the prediction was made against
    pub shift: Option<ShiftId>,
    pub score: Option<f64>,
    pub percentile: PercentileOutcome,
}

fn parse_score(raw: Option<&str>) -> Option<f64> {
    raw.and_then(|s| s.trim().parse::<f64>().ok())
        .filter(|s| s.is_finite())
}

pub async fn predict_score(
    State(state): State<AppState>,
    Query(params): Query<PredictParams>,
) -> Json<PredictResponse> {
    let score = parse_score(params.score.as_deref());

    // a selection never fails the request: unknown ids fall back
    let view = view_from_params(None, params.shift.as_deref()).unwrap_or_default();
    let shifts = state.coordinator.shifts().await;
    let selected = view.resolve(&shifts);

    let percentile = match score {
        Some(score) => predict(score, selected),
        None => PercentileOutcome::Unavailable,
    };

    Json(PredictResponse {
        shift: selected.map(|s| s.id.clone()),
        score,
        percentile,
    })
}
