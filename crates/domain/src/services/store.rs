//! Storage abstractions consumed by the domain services.
//!
//! The persistence crate implements these traits over PostgreSQL;
//! [`InMemoryStore`](super::InMemoryStore) implements them for tests and local runs.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::errors::StoreError;
use crate::models::group::NewGroup;
use crate::models::{
    Group, GroupMembership, Match, MatchStatus, MemberScore, NewPrediction, Prediction,
    PredictionOutcome, User,
};

pub type StoreResult<T> = Result<T, StoreError>;

/// Scoring result for one prediction, ready to be persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoredPrediction {
    pub prediction_id: Uuid,
    pub user_id: Uuid,
    pub group_id: Uuid,
    pub outcome: PredictionOutcome,
}

/// Every outcome of one match, written atomically.
#[derive(Debug, Clone)]
pub struct ScoringBatch {
    pub match_id: Uuid,
    pub scored_at: DateTime<Utc>,
    pub outcomes: Vec<ScoredPrediction>,
}

impl ScoringBatch {
    /// Distinct (user, group) pairs touched by this batch, sorted.
    pub fn touched_members(&self) -> Vec<(Uuid, Uuid)> {
        let mut pairs: Vec<(Uuid, Uuid)> = self
            .outcomes
            .iter()
            .map(|o| (o.user_id, o.group_id))
            .collect();
        pairs.sort();
        pairs.dedup();
        pairs
    }
}

/// Outcome of a prediction write guarded by the match status.
#[derive(Debug, Clone, PartialEq)]
pub enum PredictionWrite {
    Saved(Prediction),
    /// The match had already moved to a status outside the accepted set.
    Closed(MatchStatus),
    MatchMissing,
}

/// Recomputed cumulative score of one member after scoring.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct MemberTotal {
    pub user_id: Uuid,
    pub group_id: Uuid,
    pub score: i32,
}

#[async_trait::async_trait]
pub trait MatchStore: Send + Sync {
    async fn find_match(&self, id: Uuid) -> StoreResult<Option<Match>>;

    /// Lists matches ordered by scheduled time, optionally filtered by status.
    async fn list_matches(&self, status: Option<MatchStatus>) -> StoreResult<Vec<Match>>;

    async fn insert_match(&self, m: &Match) -> StoreResult<()>;

    /// Persists status, scores and `updated_at` of an existing match.
    async fn update_match_state(&self, m: &Match) -> StoreResult<()>;
}

#[async_trait::async_trait]
pub trait GroupStore: Send + Sync {
    async fn find_group(&self, id: Uuid) -> StoreResult<Option<Group>>;

    async fn find_group_by_invite_code(&self, code: &str) -> StoreResult<Option<Group>>;

    async fn invite_code_exists(&self, code: &str) -> StoreResult<bool>;

    /// Inserts the group and its creator's membership (score 0) together.
    async fn create_group(&self, group: &NewGroup) -> StoreResult<Group>;

    async fn find_membership(
        &self,
        group_id: Uuid,
        user_id: Uuid,
    ) -> StoreResult<Option<GroupMembership>>;

    async fn add_member(
        &self,
        group_id: Uuid,
        user_id: Uuid,
        joined_at: DateTime<Utc>,
    ) -> StoreResult<GroupMembership>;

    /// Returns whether a membership was removed.
    async fn remove_member(&self, group_id: Uuid, user_id: Uuid) -> StoreResult<bool>;

    /// Member ids of a group in join order.
    async fn list_member_ids(&self, group_id: Uuid) -> StoreResult<Vec<Uuid>>;

    async fn list_member_scores(&self, group_id: Uuid) -> StoreResult<Vec<MemberScore>>;

    /// Every group the user belongs to, paired with the membership.
    async fn list_user_memberships(
        &self,
        user_id: Uuid,
    ) -> StoreResult<Vec<(Group, GroupMembership)>>;

    /// Per-user sums of group scores. `joined_at` is the user's earliest membership.
    async fn list_global_scores(&self) -> StoreResult<Vec<MemberScore>>;
}

#[async_trait::async_trait]
pub trait UserStore: Send + Sync {
    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>>;
}

#[async_trait::async_trait]
pub trait PredictionStore: Send + Sync {
    /// Inserts or replaces the prediction keyed by (user, match, group), but
    /// only while the match status is one of `open`.
    ///
    /// The status is read and the row written under one lock, so a match
    /// update can never land between the two.
    async fn upsert_prediction(
        &self,
        prediction: &NewPrediction,
        open: &[MatchStatus],
    ) -> StoreResult<PredictionWrite>;

    async fn list_match_predictions(&self, match_id: Uuid) -> StoreResult<Vec<Prediction>>;

    async fn list_group_match_predictions(
        &self,
        group_id: Uuid,
        match_id: Uuid,
    ) -> StoreResult<Vec<Prediction>>;

    async fn list_user_group_predictions(
        &self,
        user_id: Uuid,
        group_id: Uuid,
    ) -> StoreResult<Vec<Prediction>>;

    /// Every prediction in the group, oldest first.
    async fn list_group_predictions(&self, group_id: Uuid) -> StoreResult<Vec<Prediction>>;

    /// The user's predictions across all groups, oldest first.
    async fn list_user_predictions(&self, user_id: Uuid) -> StoreResult<Vec<Prediction>>;

    /// Writes every outcome and recomputes the cumulative score of each
    /// touched member as a sum over their predictions in that group.
    /// Either everything is applied or nothing is.
    async fn apply_scoring(&self, batch: &ScoringBatch) -> StoreResult<Vec<MemberTotal>>;
}
