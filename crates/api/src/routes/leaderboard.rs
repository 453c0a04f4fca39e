//! Global leaderboard.

use axum::{
    extract::{Query, State},
    Json,
};
use domain::models::leaderboard::{GlobalLeaderboard, GlobalLeaderboardQuery};

use crate::app::AppState;
use crate::error::ApiError;

/// GET /api/v1/leaderboard?limit=
pub async fn get_global_leaderboard(
    State(state): State<AppState>,
    Query(query): Query<GlobalLeaderboardQuery>,
) -> Result<Json<GlobalLeaderboard>, ApiError> {
    let limit = query
        .limit
        .map(usize::try_from)
        .transpose()
        .map_err(|_| ApiError::Validation("limit must be a positive number".to_string()))?;
    let leaderboard = state.leaderboard.get_global_leaderboard(limit).await?;
    Ok(Json(leaderboard))
}
