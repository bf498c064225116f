use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use std::sync::Arc;

use super::ApiError;
use crate::{
    extractors::AppJson,
    models::{
        AchievementsResponse, ActivityLog, HistoryQuery, LogActivityRequest, StatsResponse,
        VerifyLabRequest, VerifyLabResponse,
    },
    services::AppState,
};

pub async fn get_stats(
    State(state): State<Arc<AppState>>,
    Path(learner_id): Path<String>,
) -> Result<Json<StatsResponse>, ApiError> {
    Ok(Json(state.progress.stats_response(&learner_id).await?))
}

pub async fn reset_stats(
    State(state): State<Arc<AppState>>,
    Path(learner_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.progress.reset(&learner_id).await?;
    state.leaderboard.invalidate().await;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn log_activity(
    State(state): State<Arc<AppState>>,
    Path(learner_id): Path<String>,
    AppJson(req): AppJson<LogActivityRequest>,
) -> Result<impl IntoResponse, ApiError> {
    tracing::debug!("Logging {} activity for learner {}", req.kind, learner_id);

    let response = state.progress.log_activity(&learner_id, req).await?;
    state.leaderboard.invalidate().await;

    Ok((StatusCode::CREATED, Json(response)))
}

pub async fn list_activities(
    State(state): State<Arc<AppState>>,
    Path(learner_id): Path<String>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<Vec<ActivityLog>>, ApiError> {
    Ok(Json(state.progress.history(&learner_id, query.limit).await?))
}

pub async fn get_achievements(
    State(state): State<Arc<AppState>>,
    Path(learner_id): Path<String>,
) -> Result<Json<AchievementsResponse>, ApiError> {
    Ok(Json(state.progress.achievements(&learner_id).await?))
}

pub async fn verify_lab(
    State(state): State<Arc<AppState>>,
    Path((learner_id, lab_id)): Path<(String, String)>,
    AppJson(req): AppJson<VerifyLabRequest>,
) -> Result<Json<VerifyLabResponse>, ApiError> {
    let response = state
        .progress
        .verify_lab(&learner_id, &lab_id, &req.output)
        .await?;

    if response.logged.is_some() {
        state.leaderboard.invalidate().await;
    }

    Ok(Json(response))
}
