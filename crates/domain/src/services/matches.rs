//! Match registration and lifecycle updates.

use chrono::Utc;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use super::store::MatchStore;
use crate::errors::{DomainError, StoreError};
use crate::models::matches::CreateMatchRequest;
use crate::models::{Match, MatchStatus, MatchUpdate};

/// Result of applying an update to a match.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchTransition {
    pub r#match: Match,
    /// Whether the stored match changed.
    pub changed: bool,
    /// Whether this update moved the match into `finished`.
    pub finished_now: bool,
}

pub struct MatchService {
    matches: Arc<dyn MatchStore>,
}

impl MatchService {
    pub fn new(matches: Arc<dyn MatchStore>) -> Self {
        Self { matches }
    }

    pub async fn create_match(&self, request: CreateMatchRequest) -> Result<Match, DomainError> {
        let m = request.into_match(Utc::now())?;
        match self.matches.insert_match(&m).await {
            Ok(()) => {}
            Err(StoreError::Conflict(_)) => {
                return Err(DomainError::Validation(format!(
                    "match {} already exists",
                    m.id
                )))
            }
            Err(e) => return Err(e.into()),
        }
        info!(
            match_id = %m.id,
            team_a = %m.team_a,
            team_b = %m.team_b,
            "Match registered"
        );
        Ok(m)
    }

    pub async fn get_match(&self, match_id: Uuid) -> Result<Match, DomainError> {
        self.matches
            .find_match(match_id)
            .await?
            .ok_or(DomainError::MatchNotFound(match_id))
    }

    pub async fn list_matches(
        &self,
        status: Option<MatchStatus>,
    ) -> Result<Vec<Match>, DomainError> {
        Ok(self.matches.list_matches(status).await?)
    }

    /// Applies a status/score change. Scoring is left to the caller.
    pub async fn apply_update(
        &self,
        match_id: Uuid,
        update: MatchUpdate,
    ) -> Result<MatchTransition, DomainError> {
        let current = self.get_match(match_id).await?;
        match current.apply_update(&update, Utc::now())? {
            Some(next) => {
                self.matches.update_match_state(&next).await?;
                info!(
                    match_id = %match_id,
                    from = %current.status,
                    to = %next.status,
                    "Match status changed"
                );
                Ok(MatchTransition {
                    finished_now: next.status == MatchStatus::Finished,
                    r#match: next,
                    changed: true,
                })
            }
            None => Ok(MatchTransition {
                r#match: current,
                changed: false,
                finished_now: false,
            }),
        }
    }
}
