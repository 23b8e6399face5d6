use axum::extract::{Query, State};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::api::state::AppState;
use crate::api::ApiError;
use crate::calculate::{population_overview, subject_rankings};
use crate::models::{
    PopulationOverview, ShiftId, ShiftSummary, SortMode, SubjectRanking, ViewState,
};
use crate::sync::Connectivity;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub shifts: usize,
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        shifts: state.coordinator.shifts().await.len(),
    })
}

#[derive(Debug, Deserialize)]
pub struct ShiftsParams {
    pub sort: Option<String>,
    pub selected: Option<String>,
}

/// A shift summary as shown in the leaderboard.
#[derive(Debug, Serialize)]
pub struct ShiftRow {
    #[serde(flatten)]
    pub summary: ShiftSummary,
    pub selected: bool,
}

#[derive(Debug, Serialize)]
pub struct ShiftsResponse {
    pub sort: SortMode,
    pub selected: Option<ShiftId>,
    pub fetched_at: Option<DateTime<Utc>>,
    pub shifts: Vec<ShiftRow>,
}

/// Build the view state described by query parameters.
pub(crate) fn view_from_params(
    sort: Option<&str>,
    selected: Option<&str>,
) -> Result<ViewState, ApiError> {
    let mut view = ViewState::default();
    if let Some(sort) = sort {
        view = view.with_sort(sort.parse().map_err(ApiError::BadRequest)?);
    }
    if let Some(id) = selected.filter(|s| !s.trim().is_empty()) {
        view = view.with_selected(ShiftId::new(id));
    }
    Ok(view)
}

pub async fn list_shifts(
    State(state): State<AppState>,
    Query(params): Query<ShiftsParams>,
) -> Result<Json<ShiftsResponse>, ApiError> {
    let view = view_from_params(params.sort.as_deref(), params.selected.as_deref())?;

    let snapshot = state.coordinator.snapshot().await;
    let shifts = state.coordinator.shifts().await;
    let selected = view.resolve(&shifts).map(|s| s.id.clone());

    let rows = view
        .ordered(&shifts)
        .into_iter()
        .map(|s| ShiftRow {
            selected: selected.as_ref() == Some(&s.id),
            summary: s.clone(),
        })
        .collect();

    Ok(Json(ShiftsResponse {
        sort: view.sort,
        selected,
        fetched_at: snapshot.map(|s| s.fetched_at),
        shifts: rows,
    }))
}

#[derive(Debug, Serialize)]
pub struct OverviewResponse {
    pub connectivity: Connectivity,
    pub status: String,
    pub fetched_at: Option<DateTime<Utc>>,
    pub overview: Option<PopulationOverview>,
}

pub async fn overview(State(state): State<AppState>) -> Json<OverviewResponse> {
    let refresh = state.coordinator.state().await;
    let snapshot = state.coordinator.snapshot().await;
    let shifts = state.coordinator.shifts().await;

    Json(OverviewResponse {
        connectivity: refresh.connectivity,
        status: refresh.connectivity.to_string(),
        fetched_at: snapshot.map(|s| s.fetched_at),
        overview: population_overview(&shifts),
    })
}

#[derive(Debug, Serialize)]
pub struct SubjectsResponse {
    pub subjects: Vec<SubjectRanking>,
}

pub async fn subjects(State(state): State<AppState>) -> Json<SubjectsResponse> {
    let shifts = state.coordinator.shifts().await;
    Json(SubjectsResponse {
        subjects: subject_rankings(&shifts),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::build_router;
    use crate::api::routes::test_support::*;
    use axum::http::StatusCode;
    use serde_json::Value;

    fn ids(json: &Value) -> Vec<String> {
        json["shifts"]
            .as_array()
            .unwrap()
            .iter()
            .map(|row| row["id"].as_str().unwrap().to_string())
            .collect()
    }

    #[test]
    fn test_view_from_params() {
        let view = view_from_params(Some("MEAN"), Some(" 22-S1 ")).unwrap();
        assert_eq!(view.sort, SortMode::Mean);
        assert_eq!(view.selected, Some(ShiftId::from("22-S1")));

        let view = view_from_params(None, Some("   ")).unwrap();
        assert_eq!(view, ViewState::default());

        assert!(matches!(
            view_from_params(Some("alphabetical"), None),
            Err(ApiError::BadRequest(_))
        ));
    }

    #[tokio::test]
    async fn test_health() {
        let app = build_router(loaded_state().await);
        let (status, json) = get_json(app, "/api/health").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "ok");
        assert_eq!(json["shifts"], 2);
    }

    #[tokio::test]
    async fn test_list_shifts_default_is_date_order() {
        let app = build_router(loaded_state().await);
        let (status, json) = get_json(app, "/api/shifts").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["sort"], "date");
        assert_eq!(ids(&json), vec!["22-S1", "24-S2"]);
        // the hardest shift is selected when nothing is requested
        assert_eq!(json["selected"], "24-S2");
        assert_eq!(json["shifts"][1]["selected"], true);
        assert_eq!(json["shifts"][0]["selected"], false);
        assert!(json["fetched_at"].is_string());
    }

    #[tokio::test]
    async fn test_list_shifts_mean_order_with_selection() {
        let app = build_router(loaded_state().await);
        let (status, json) = get_json(app, "/api/shifts?sort=mean&selected=22-S1").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(ids(&json), vec!["24-S2", "22-S1"]);
        assert_eq!(json["selected"], "22-S1");
        assert_eq!(json["shifts"][1]["selected"], true);
        assert_eq!(json["shifts"][1]["avg"], 150.0);
        assert_eq!(json["shifts"][1]["median"], 155.15);
    }

    #[tokio::test]
    async fn test_list_shifts_unknown_selection_falls_back() {
        let app = build_router(loaded_state().await);
        let (_, json) = get_json(app, "/api/shifts?selected=99-S9").await;
        assert_eq!(json["selected"], "24-S2");
    }

    #[tokio::test]
    async fn test_list_shifts_bad_sort() {
        let app = build_router(loaded_state().await);
        let (status, json) = get_json(app, "/api/shifts?sort=random").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"]["code"], "BAD_REQUEST");
    }

    #[tokio::test]
    async fn test_list_shifts_before_first_refresh() {
        let app = build_router(test_state(StaticSource::ok(Vec::new())));
        let (status, json) = get_json(app, "/api/shifts").await;

        assert_eq!(status, StatusCode::OK);
        assert!(json["shifts"].as_array().unwrap().is_empty());
        assert!(json["selected"].is_null());
        assert!(json["fetched_at"].is_null());
    }

    #[tokio::test]
    async fn test_overview() {
        let app = build_router(loaded_state().await);
        let (status, json) = get_json(app, "/api/overview").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["connectivity"], "live");
        assert_eq!(json["status"], "Live Feed Active");
        assert_eq!(json["overview"]["shift_count"], 2);
        assert_eq!(json["overview"]["total_candidates"], 1400);
        assert_eq!(json["overview"]["hardest_shift"], "24-S2");
        assert_eq!(json["overview"]["global_top_ratio"], 45.36);
    }

    #[tokio::test]
    async fn test_overview_pending() {
        let app = build_router(test_state(StaticSource::ok(Vec::new())));
        let (_, json) = get_json(app, "/api/overview").await;

        assert_eq!(json["connectivity"], "pending");
        assert_eq!(json["status"], "Syncing");
        assert!(json["overview"].is_null());
    }

    #[tokio::test]
    async fn test_subjects() {
        let app = build_router(loaded_state().await);
        let (status, json) = get_json(app, "/api/subjects").await;

        assert_eq!(status, StatusCode::OK);
        let subjects = json["subjects"].as_array().unwrap();
        assert_eq!(subjects.len(), 3);
        assert_eq!(subjects[0]["subject"], "physics");
        assert_eq!(subjects[0]["toughest"][0]["id"], "24-S2");
        assert_eq!(subjects[0]["toughest"][0]["average"], 30.0);
        assert_eq!(subjects[1]["toughest"][0]["id"], "24-S2");
        assert_eq!(subjects[2]["toughest"][0]["id"], "24-S2");
    }
}
