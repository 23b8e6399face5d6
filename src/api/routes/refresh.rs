use axum::extract::State;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use crate::api::state::AppState;
use crate::api::ApiError;
use crate::sync::{RefreshOutcome, RefreshState};

#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub result: RefreshOutcome,
    pub state: RefreshState,
}

/// Run a refresh now and report whether its result was applied.
///
/// Runs alongside the periodic refresh; whichever was issued later wins.
pub async fn trigger_refresh(
    State(state): State<AppState>,
) -> Result<Json<RefreshResponse>, ApiError> {
    info!("Manual refresh requested");

    let result = state
        .coordinator
        .refresh(state.source.as_ref())
        .await
        .map_err(|e| {
            warn!("Manual refresh failed: {}", e);
            ApiError::Upstream(e.to_string())
        })?;

    Ok(Json(RefreshResponse {
        result,
        state: state.coordinator.state().await,
    }))
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    #[serde(flatten)]
    pub state: RefreshState,
    pub status: String,
    pub fetched_at: Option<DateTime<Utc>>,
}

pub async fn refresh_status(State(state): State<AppState>) -> Json<StatusResponse> {
    let refresh = state.coordinator.state().await;
    let snapshot = state.coordinator.snapshot().await;

    Json(StatusResponse {
        status: refresh.connectivity.to_string(),
        state: refresh,
        fetched_at: snapshot.map(|s| s.fetched_at),
    })
}
