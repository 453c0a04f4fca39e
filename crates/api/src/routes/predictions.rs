//! Per-group match predictions.

use axum::{
    extract::{Path, State},
    Json,
};
use domain::models::prediction::{ListPredictionsResponse, SubmitPredictionRequest};
use domain::models::Prediction;
use uuid::Uuid;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::ActingUser;

/// PUT /api/v1/groups/:group_id/matches/:match_id/prediction
///
/// Creates the acting user's prediction or replaces it while the match is open.
pub async fn submit_prediction(
    State(state): State<AppState>,
    user: ActingUser,
    Path((group_id, match_id)): Path<(Uuid, Uuid)>,
    Json(request): Json<SubmitPredictionRequest>,
) -> Result<Json<Prediction>, ApiError> {
    let prediction = state
        .predictions
        .submit_prediction(user.user_id, group_id, match_id, request)
        .await?;
    Ok(Json(prediction))
}

/// GET /api/v1/groups/:group_id/matches/:match_id/predictions
pub async fn list_predictions(
    State(state): State<AppState>,
    user: ActingUser,
    Path((group_id, match_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<ListPredictionsResponse>, ApiError> {
    let data = state
        .predictions
        .list_group_match_predictions(user.user_id, group_id, match_id)
        .await?;
    let count = data.len();
    Ok(Json(ListPredictionsResponse { data, count }))
}

/// GET /api/v1/groups/:group_id/predictions
pub async fn list_group_predictions(
    State(state): State<AppState>,
    user: ActingUser,
    Path(group_id): Path<Uuid>,
) -> Result<Json<ListPredictionsResponse>, ApiError> {
    let data = state
        .predictions
        .list_group_predictions(user.user_id, group_id)
        .await?;
    let count = data.len();
    Ok(Json(ListPredictionsResponse { data, count }))
}
