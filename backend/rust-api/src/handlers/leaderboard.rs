use axum::{
    extract::{Query, State},
    Json,
};
use std::sync::Arc;

use super::ApiError;
use crate::{
    models::{LeaderboardQuery, LeaderboardResponse},
    services::AppState,
};

pub async fn get_leaderboard(
    State(state): State<Arc<AppState>>,
    Query(query): Query<LeaderboardQuery>,
) -> Result<Json<LeaderboardResponse>, ApiError> {
    Ok(Json(state.leaderboard.top(query.limit).await?))
}
