//! Prediction groups: creation, invite-code membership and leaderboards.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use domain::models::group::{
    CreateGroupRequest, GroupDetail, JoinGroupRequest, JoinGroupResponse, ListUserGroupsResponse,
};
use domain::models::{Group, Leaderboard, UserGroupStats};
use uuid::Uuid;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::ActingUser;

/// POST /api/v1/groups
///
/// The acting user becomes the creator and first member.
pub async fn create_group(
    State(state): State<AppState>,
    user: ActingUser,
    Json(request): Json<CreateGroupRequest>,
) -> Result<(StatusCode, Json<Group>), ApiError> {
    let group = state.groups.create_group(user.user_id, request).await?;
    Ok((StatusCode::CREATED, Json(group)))
}

/// GET /api/v1/groups
///
/// The acting user's groups, each with their score in it.
pub async fn list_groups(
    State(state): State<AppState>,
    user: ActingUser,
) -> Result<Json<ListUserGroupsResponse>, ApiError> {
    let data = state.groups.list_user_groups(user.user_id).await?;
    let count = data.len();
    Ok(Json(ListUserGroupsResponse { data, count }))
}

/// POST /api/v1/groups/join
pub async fn join_group(
    State(state): State<AppState>,
    user: ActingUser,
    Json(request): Json<JoinGroupRequest>,
) -> Result<Json<JoinGroupResponse>, ApiError> {
    let joined = state.groups.join_group(user.user_id, request).await?;
    Ok(Json(joined))
}

/// GET /api/v1/groups/:group_id
pub async fn get_group(
    State(state): State<AppState>,
    user: ActingUser,
    Path(group_id): Path<Uuid>,
) -> Result<Json<GroupDetail>, ApiError> {
    let detail = state.groups.get_group(user.user_id, group_id).await?;
    Ok(Json(detail))
}

/// POST /api/v1/groups/:group_id/leave
pub async fn leave_group(
    State(state): State<AppState>,
    user: ActingUser,
    Path(group_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.groups.leave_group(user.user_id, group_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/groups/:group_id/leaderboard
pub async fn get_leaderboard(
    State(state): State<AppState>,
    user: ActingUser,
    Path(group_id): Path<Uuid>,
) -> Result<Json<Leaderboard>, ApiError> {
    let leaderboard = state
        .leaderboard
        .get_leaderboard(user.user_id, group_id)
        .await?;
    Ok(Json(leaderboard))
}

/// GET /api/v1/groups/:group_id/users/:user_id/stats
pub async fn get_user_group_stats(
    State(state): State<AppState>,
    Path((group_id, user_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<UserGroupStats>, ApiError> {
    let stats = state
        .leaderboard
        .get_user_group_stats(user_id, group_id)
        .await?;
    Ok(Json(stats))
}
