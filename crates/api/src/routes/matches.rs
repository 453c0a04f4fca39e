//! Match ingestion, lifecycle updates and on-demand scoring.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use domain::models::matches::{
    CreateMatchRequest, ListMatchesQuery, ListMatchesResponse, MatchResponse,
};
use domain::models::MatchUpdate;
use domain::services::ScoreMatchReport;
use domain::DomainError;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::metrics::{record_match_scored, record_scoring_conflict};

/// POST /api/v1/matches
pub async fn create_match(
    State(state): State<AppState>,
    Json(request): Json<CreateMatchRequest>,
) -> Result<(StatusCode, Json<MatchResponse>), ApiError> {
    let m = state.matches.create_match(request).await?;
    Ok((StatusCode::CREATED, Json(m.into())))
}

/// GET /api/v1/matches?status=
pub async fn list_matches(
    State(state): State<AppState>,
    Query(query): Query<ListMatchesQuery>,
) -> Result<Json<ListMatchesResponse>, ApiError> {
    let data: Vec<MatchResponse> = state
        .matches
        .list_matches(query.status)
        .await?
        .into_iter()
        .map(MatchResponse::from)
        .collect();
    let count = data.len();
    Ok(Json(ListMatchesResponse { data, count }))
}

/// GET /api/v1/matches/:match_id
pub async fn get_match(
    State(state): State<AppState>,
    Path(match_id): Path<Uuid>,
) -> Result<Json<MatchResponse>, ApiError> {
    let m = state.matches.get_match(match_id).await?;
    Ok(Json(m.into()))
}

/// PATCH /api/v1/matches/:match_id
///
/// A match that becomes finished is scored straight away. If that run
/// fails the match stays unscored and the poller retries it.
pub async fn update_match(
    State(state): State<AppState>,
    Path(match_id): Path<Uuid>,
    Json(update): Json<MatchUpdate>,
) -> Result<Json<MatchResponse>, ApiError> {
    let transition = state.matches.apply_update(match_id, update).await?;

    if transition.finished_now {
        match state.scoring.score_match(match_id).await {
            Ok(report) => record_match_scored("update", &report),
            Err(DomainError::ConcurrentScoringConflict(_)) => {
                record_scoring_conflict("update");
                warn!(match_id = %match_id, "Scoring already in progress");
            }
            Err(e) => error!(match_id = %match_id, error = %e, "Scoring after finish failed"),
        }
    }

    Ok(Json(transition.r#match.into()))
}

/// POST /api/v1/matches/:match_id/calculate-points
///
/// Refreshes the match from the feed when one is configured, then scores it.
pub async fn calculate_points(
    State(state): State<AppState>,
    Path(match_id): Path<Uuid>,
) -> Result<Json<ScoreMatchReport>, ApiError> {
    if let Some(feed) = &state.match_feed {
        if let Err(e) = feed.refresh(&state.matches, match_id).await {
            warn!(match_id = %match_id, error = %e, "Feed refresh failed, scoring stored state");
        }
    }

    let report = match state.scoring.score_match(match_id).await {
        Ok(report) => report,
        Err(e @ DomainError::ConcurrentScoringConflict(_)) => {
            record_scoring_conflict("endpoint");
            return Err(e.into());
        }
        Err(e) => return Err(e.into()),
    };
    record_match_scored("endpoint", &report);

    info!(
        match_id = %match_id,
        predictions = report.predictions_scored,
        correct = report.correct_predictions,
        exact = report.exact_scores,
        "Points calculated"
    );
    Ok(Json(report))
}
