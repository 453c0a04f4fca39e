//! In-memory implementation of every store trait.
//!
//! Backs the unit tests and the HTTP router tests, which run without a database.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::store::{
    GroupStore, MatchStore, MemberTotal, PredictionStore, PredictionWrite, ScoringBatch, StoreResult,
    UserStore,
};
use crate::errors::StoreError;
use crate::models::group::NewGroup;
use crate::models::{
    Group, GroupMembership, Match, MatchStatus, MemberScore, NewPrediction, Prediction, User,
};

#[derive(Default)]
struct State {
    users: HashMap<Uuid, User>,
    matches: HashMap<Uuid, Match>,
    groups: HashMap<Uuid, Group>,
    memberships: Vec<GroupMembership>,
    predictions: Vec<Prediction>,
}

impl State {
    fn display_name(&self, user_id: Uuid) -> String {
        self.users
            .get(&user_id)
            .map(|u| u.display_name.clone())
            .unwrap_or_default()
    }
}

/// Thread-safe store holding everything in process memory.
#[derive(Default)]
pub struct InMemoryStore {
    state: RwLock<State>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a user (registration itself lives outside this service).
    pub async fn add_user(&self, user: User) {
        self.state.write().await.users.insert(user.id, user);
    }

    /// Current membership rows, for assertions in tests.
    pub async fn memberships(&self) -> Vec<GroupMembership> {
        self.state.read().await.memberships.clone()
    }
}

#[async_trait::async_trait]
impl MatchStore for InMemoryStore {
    async fn find_match(&self, id: Uuid) -> StoreResult<Option<Match>> {
        Ok(self.state.read().await.matches.get(&id).cloned())
    }

    async fn list_matches(&self, status: Option<MatchStatus>) -> StoreResult<Vec<Match>> {
        let state = self.state.read().await;
        let mut matches: Vec<Match> = state
            .matches
            .values()
            .filter(|m| status.map_or(true, |s| m.status == s))
            .cloned()
            .collect();
        matches.sort_by(|a, b| a.scheduled_at.cmp(&b.scheduled_at).then(a.id.cmp(&b.id)));
        Ok(matches)
    }

    async fn insert_match(&self, m: &Match) -> StoreResult<()> {
        let mut state = self.state.write().await;
        if state.matches.contains_key(&m.id) {
            return Err(StoreError::Conflict(format!("match {} already exists", m.id)));
        }
        state.matches.insert(m.id, m.clone());
        Ok(())
    }

    async fn update_match_state(&self, m: &Match) -> StoreResult<()> {
        let mut state = self.state.write().await;
        match state.matches.get_mut(&m.id) {
            Some(existing) => {
                existing.status = m.status;
                existing.score_a = m.score_a;
                existing.score_b = m.score_b;
                existing.updated_at = m.updated_at;
                Ok(())
            }
            None => Err(StoreError::Backend(format!("match {} does not exist", m.id))),
        }
    }
}

#[async_trait::async_trait]
impl GroupStore for InMemoryStore {
    async fn find_group(&self, id: Uuid) -> StoreResult<Option<Group>> {
        Ok(self.state.read().await.groups.get(&id).cloned())
    }

    async fn find_group_by_invite_code(&self, code: &str) -> StoreResult<Option<Group>> {
        let state = self.state.read().await;
        Ok(state
            .groups
            .values()
            .find(|g| g.invite_code == code)
            .cloned())
    }

    async fn invite_code_exists(&self, code: &str) -> StoreResult<bool> {
        Ok(self.find_group_by_invite_code(code).await?.is_some())
    }

    async fn create_group(&self, new: &NewGroup) -> StoreResult<Group> {
        let mut state = self.state.write().await;
        if state.groups.values().any(|g| g.invite_code == new.invite_code) {
            return Err(StoreError::Conflict(format!(
                "invite code {} already in use",
                new.invite_code
            )));
        }
        let group = Group {
            id: new.id,
            name: new.name.clone(),
            description: new.description.clone(),
            invite_code: new.invite_code.clone(),
            created_by: new.created_by,
            created_at: new.created_at,
            updated_at: new.created_at,
        };
        state.groups.insert(group.id, group.clone());
        state.memberships.push(GroupMembership {
            group_id: group.id,
            user_id: new.created_by,
            score: 0,
            joined_at: new.created_at,
        });
        Ok(group)
    }

    async fn find_membership(
        &self,
        group_id: Uuid,
        user_id: Uuid,
    ) -> StoreResult<Option<GroupMembership>> {
        let state = self.state.read().await;
        Ok(state
            .memberships
            .iter()
            .find(|m| m.group_id == group_id && m.user_id == user_id)
            .cloned())
    }

    async fn add_member(
        &self,
        group_id: Uuid,
        user_id: Uuid,
        joined_at: DateTime<Utc>,
    ) -> StoreResult<GroupMembership> {
        let mut state = self.state.write().await;
        if state
            .memberships
            .iter()
            .any(|m| m.group_id == group_id && m.user_id == user_id)
        {
            return Err(StoreError::Conflict(format!(
                "user {} already in group {}",
                user_id, group_id
            )));
        }
        // A rejoining member picks up whatever their predictions in this group are worth.
        let score = state
            .predictions
            .iter()
            .filter(|p| p.group_id == group_id && p.user_id == user_id)
            .map(|p| p.points_earned)
            .sum();
        let membership = GroupMembership {
            group_id,
            user_id,
            score,
            joined_at,
        };
        state.memberships.push(membership.clone());
        Ok(membership)
    }

    async fn remove_member(&self, group_id: Uuid, user_id: Uuid) -> StoreResult<bool> {
        let mut state = self.state.write().await;
        let before = state.memberships.len();
        state
            .memberships
            .retain(|m| !(m.group_id == group_id && m.user_id == user_id));
        Ok(state.memberships.len() != before)
    }

    async fn list_member_ids(&self, group_id: Uuid) -> StoreResult<Vec<Uuid>> {
        let state = self.state.read().await;
        let mut members: Vec<&GroupMembership> = state
            .memberships
            .iter()
            .filter(|m| m.group_id == group_id)
            .collect();
        members.sort_by(|a, b| a.joined_at.cmp(&b.joined_at).then(a.user_id.cmp(&b.user_id)));
        Ok(members.into_iter().map(|m| m.user_id).collect())
    }

    async fn list_member_scores(&self, group_id: Uuid) -> StoreResult<Vec<MemberScore>> {
        let state = self.state.read().await;
        Ok(state
            .memberships
            .iter()
            .filter(|m| m.group_id == group_id)
            .map(|m| MemberScore {
                user_id: m.user_id,
                display_name: state.display_name(m.user_id),
                score: m.score,
                joined_at: m.joined_at,
            })
            .collect())
    }

    async fn list_user_memberships(
        &self,
        user_id: Uuid,
    ) -> StoreResult<Vec<(Group, GroupMembership)>> {
        let state = self.state.read().await;
        let mut rows: Vec<(Group, GroupMembership)> = state
            .memberships
            .iter()
            .filter(|m| m.user_id == user_id)
            .filter_map(|m| state.groups.get(&m.group_id).map(|g| (g.clone(), m.clone())))
            .collect();
        rows.sort_by(|a, b| a.1.joined_at.cmp(&b.1.joined_at));
        Ok(rows)
    }

    async fn list_global_scores(&self) -> StoreResult<Vec<MemberScore>> {
        let state = self.state.read().await;
        let mut totals: HashMap<Uuid, MemberScore> = HashMap::new();
        for m in &state.memberships {
            let entry = totals.entry(m.user_id).or_insert_with(|| MemberScore {
                user_id: m.user_id,
                display_name: state.display_name(m.user_id),
                score: 0,
                joined_at: m.joined_at,
            });
            entry.score += m.score;
            entry.joined_at = entry.joined_at.min(m.joined_at);
        }
        Ok(totals.into_values().collect())
    }
}

#[async_trait::async_trait]
impl UserStore for InMemoryStore {
    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        Ok(self.state.read().await.users.get(&id).cloned())
    }
}

#[async_trait::async_trait]
impl PredictionStore for InMemoryStore {
    async fn upsert_prediction(
        &self,
        new: &NewPrediction,
        open: &[MatchStatus],
    ) -> StoreResult<PredictionWrite> {
        let mut state = self.state.write().await;
        match state.matches.get(&new.match_id) {
            None => return Ok(PredictionWrite::MatchMissing),
            Some(m) if !open.contains(&m.status) => return Ok(PredictionWrite::Closed(m.status)),
            Some(_) => {}
        }
        if let Some(existing) = state.predictions.iter_mut().find(|p| {
            p.user_id == new.user_id && p.match_id == new.match_id && p.group_id == new.group_id
        }) {
            existing.predicted_winner = new.predicted_winner;
            existing.predicted_score_a = new.predicted_score_a;
            existing.predicted_score_b = new.predicted_score_b;
            existing.points_earned = 0;
            existing.is_correct = false;
            existing.is_exact_score = false;
            existing.updated_at = new.submitted_at;
            return Ok(PredictionWrite::Saved(existing.clone()));
        }
        let prediction = Prediction {
            id: Uuid::new_v4(),
            user_id: new.user_id,
            match_id: new.match_id,
            group_id: new.group_id,
            predicted_winner: new.predicted_winner,
            predicted_score_a: new.predicted_score_a,
            predicted_score_b: new.predicted_score_b,
            points_earned: 0,
            is_correct: false,
            is_exact_score: false,
            created_at: new.submitted_at,
            updated_at: new.submitted_at,
        };
        state.predictions.push(prediction.clone());
        Ok(PredictionWrite::Saved(prediction))
    }

    async fn list_match_predictions(&self, match_id: Uuid) -> StoreResult<Vec<Prediction>> {
        let state = self.state.read().await;
        Ok(state
            .predictions
            .iter()
            .filter(|p| p.match_id == match_id)
            .cloned()
            .collect())
    }

    async fn list_group_match_predictions(
        &self,
        group_id: Uuid,
        match_id: Uuid,
    ) -> StoreResult<Vec<Prediction>> {
        let state = self.state.read().await;
        Ok(state
            .predictions
            .iter()
            .filter(|p| p.group_id == group_id && p.match_id == match_id)
            .cloned()
            .collect())
    }

    async fn list_user_group_predictions(
        &self,
        user_id: Uuid,
        group_id: Uuid,
    ) -> StoreResult<Vec<Prediction>> {
        let state = self.state.read().await;
        Ok(state
            .predictions
            .iter()
            .filter(|p| p.user_id == user_id && p.group_id == group_id)
            .cloned()
            .collect())
    }

    async fn list_group_predictions(&self, group_id: Uuid) -> StoreResult<Vec<Prediction>> {
        let state = self.state.read().await;
        Ok(state
            .predictions
            .iter()
            .filter(|p| p.group_id == group_id)
            .cloned()
            .collect())
    }

    async fn list_user_predictions(&self, user_id: Uuid) -> StoreResult<Vec<Prediction>> {
        let state = self.state.read().await;
        Ok(state
            .predictions
            .iter()
            .filter(|p| p.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn apply_scoring(&self, batch: &ScoringBatch) -> StoreResult<Vec<MemberTotal>> {
        // The write lock is held for the whole batch, so readers never see it half applied.
        let mut state = self.state.write().await;
        for scored in &batch.outcomes {
            if let Some(p) = state
                .predictions
                .iter_mut()
                .find(|p| p.id == scored.prediction_id)
            {
                p.is_correct = scored.outcome.is_correct;
                p.is_exact_score = scored.outcome.is_exact_score;
                p.points_earned = scored.outcome.points_earned;
                p.updated_at = batch.scored_at;
            }
        }

        let mut totals = Vec::new();
        for (user_id, group_id) in batch.touched_members() {
            let score: i32 = state
                .predictions
                .iter()
                .filter(|p| p.user_id == user_id && p.group_id == group_id)
                .map(|p| p.points_earned)
                .sum();
            if let Some(m) = state
                .memberships
                .iter_mut()
                .find(|m| m.user_id == user_id && m.group_id == group_id)
            {
                m.score = score;
                totals.push(MemberTotal {
                    user_id,
                    group_id,
                    score,
                });
            }
        }
        Ok(totals)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TeamSide;

    fn new_match(status: MatchStatus) -> Match {
        let now = Utc::now();
        let finished = status == MatchStatus::Finished;
        Match {
            id: Uuid::new_v4(),
            team_a: "BLG".into(),
            team_b: "JD Gaming".into(),
            scheduled_at: now,
            tournament: "LPL".into(),
            status,
            score_a: finished.then_some(2),
            score_b: finished.then_some(0),
            created_at: now,
            updated_at: now,
        }
    }

    fn pick(match_id: Uuid) -> NewPrediction {
        NewPrediction {
            user_id: Uuid::new_v4(),
            match_id,
            group_id: Uuid::new_v4(),
            predicted_winner: TeamSide::TeamA,
            predicted_score_a: None,
            predicted_score_b: None,
            submitted_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_upsert_checks_match_status() {
        let store = InMemoryStore::new();
        let m = new_match(MatchStatus::Live);
        store.insert_match(&m).await.unwrap();

        let closed = store
            .upsert_prediction(&pick(m.id), &[MatchStatus::Upcoming])
            .await
            .unwrap();
        assert_eq!(closed, PredictionWrite::Closed(MatchStatus::Live));
        assert!(store.list_match_predictions(m.id).await.unwrap().is_empty());

        let saved = store
            .upsert_prediction(&pick(m.id), &[MatchStatus::Upcoming, MatchStatus::Live])
            .await
            .unwrap();
        assert!(matches!(saved, PredictionWrite::Saved(_)));
        assert_eq!(store.list_match_predictions(m.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_upsert_rejects_finished_and_missing_matches() {
        let store = InMemoryStore::new();
        let m = new_match(MatchStatus::Finished);
        store.insert_match(&m).await.unwrap();

        assert_eq!(
            store
                .upsert_prediction(&pick(m.id), &[MatchStatus::Upcoming, MatchStatus::Live])
                .await
                .unwrap(),
            PredictionWrite::Closed(MatchStatus::Finished)
        );
        assert_eq!(
            store
                .upsert_prediction(&pick(Uuid::new_v4()), &[MatchStatus::Upcoming])
                .await
                .unwrap(),
            PredictionWrite::MatchMissing
        );
    }
}
