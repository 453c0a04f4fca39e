//! Prediction submission and listing.

use chrono::Utc;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use super::store::{GroupStore, MatchStore, PredictionStore, PredictionWrite};
use crate::errors::DomainError;
use crate::models::prediction::SubmitPredictionRequest;
use crate::models::{Match, MatchStatus, NewPrediction, Prediction};

/// When predictions may still be created or edited.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PredictionPolicy {
    /// Accept edits once the match is live.
    pub allow_live_edits: bool,
}

impl PredictionPolicy {
    /// Statuses in which a prediction may be written.
    pub fn open_statuses(&self) -> &'static [MatchStatus] {
        if self.allow_live_edits {
            &[MatchStatus::Upcoming, MatchStatus::Live]
        } else {
            &[MatchStatus::Upcoming]
        }
    }

    pub fn accepts(&self, status: MatchStatus) -> bool {
        self.open_statuses().contains(&status)
    }
}

pub struct PredictionService {
    matches: Arc<dyn MatchStore>,
    groups: Arc<dyn GroupStore>,
    predictions: Arc<dyn PredictionStore>,
    policy: PredictionPolicy,
}

impl PredictionService {
    pub fn new(
        matches: Arc<dyn MatchStore>,
        groups: Arc<dyn GroupStore>,
        predictions: Arc<dyn PredictionStore>,
        policy: PredictionPolicy,
    ) -> Self {
        Self {
            matches,
            groups,
            predictions,
            policy,
        }
    }

    async fn require_member(&self, user_id: Uuid, group_id: Uuid) -> Result<(), DomainError> {
        self.groups
            .find_group(group_id)
            .await?
            .ok_or(DomainError::GroupNotFound(group_id))?;
        self.groups
            .find_membership(group_id, user_id)
            .await?
            .ok_or(DomainError::NotGroupMember { user_id, group_id })?;
        Ok(())
    }

    async fn require_match(&self, match_id: Uuid) -> Result<Match, DomainError> {
        self.matches
            .find_match(match_id)
            .await?
            .ok_or(DomainError::MatchNotFound(match_id))
    }

    /// Creates or replaces the user's prediction for a match within a group.
    ///
    /// The store re-checks the match status atomically with the write, so a
    /// match that finishes after the first check still rejects the prediction.
    pub async fn submit_prediction(
        &self,
        user_id: Uuid,
        group_id: Uuid,
        match_id: Uuid,
        request: SubmitPredictionRequest,
    ) -> Result<Prediction, DomainError> {
        request.validate()?;
        self.require_member(user_id, group_id).await?;
        let m = self.require_match(match_id).await?;

        if !self.policy.accepts(m.status) {
            return Err(DomainError::PredictionClosed {
                match_id,
                status: m.status,
            });
        }

        let write = self
            .predictions
            .upsert_prediction(
                &NewPrediction {
                    user_id,
                    match_id,
                    group_id,
                    predicted_winner: request.predicted_winner,
                    predicted_score_a: request.predicted_score_a,
                    predicted_score_b: request.predicted_score_b,
                    submitted_at: Utc::now(),
                },
                self.policy.open_statuses(),
            )
            .await?;
        let prediction = match write {
            PredictionWrite::Saved(prediction) => prediction,
            PredictionWrite::Closed(status) => {
                return Err(DomainError::PredictionClosed { match_id, status })
            }
            PredictionWrite::MatchMissing => return Err(DomainError::MatchNotFound(match_id)),
        };

        info!(
            user_id = %user_id,
            group_id = %group_id,
            match_id = %match_id,
            winner = %prediction.predicted_winner,
            "Prediction submitted"
        );
        Ok(prediction)
    }

    /// All predictions in a group for one match, visible to members only.
    pub async fn list_group_match_predictions(
        &self,
        user_id: Uuid,
        group_id: Uuid,
        match_id: Uuid,
    ) -> Result<Vec<Prediction>, DomainError> {
        self.require_member(user_id, group_id).await?;
        self.require_match(match_id).await?;
        Ok(self
            .predictions
            .list_group_match_predictions(group_id, match_id)
            .await?)
    }

    /// Every prediction made in the group, for members only.
    pub async fn list_group_predictions(
        &self,
        user_id: Uuid,
        group_id: Uuid,
    ) -> Result<Vec<Prediction>, DomainError> {
        self.require_member(user_id, group_id).await?;
        Ok(self.predictions.list_group_predictions(group_id).await?)
    }
}
