//! User statistics and badges across groups.

use axum::{
    extract::{Path, State},
    Json,
};
use domain::models::badge::UserBadges;
use domain::models::leaderboard::AggregatedUserStats;
use uuid::Uuid;

use crate::app::AppState;
use crate::error::ApiError;

/// GET /api/v1/users/:user_id/stats
pub async fn get_user_stats(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<AggregatedUserStats>, ApiError> {
    let stats = state.leaderboard.get_user_overall_stats(user_id).await?;
    Ok(Json(stats))
}

/// GET /api/v1/users/:user_id/badges
pub async fn get_user_badges(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<UserBadges>, ApiError> {
    let badges = state.badges.get_user_badges(user_id).await?;
    Ok(Json(badges))
}
