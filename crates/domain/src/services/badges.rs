//! Badge computation over a user's predictions and group standings.

use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use super::leaderboard::{percent_rounded, rank_members};
use super::store::{GroupStore, MatchStore, PredictionStore, UserStore};
use crate::errors::DomainError;
use crate::models::badge::{award_badges, longest_streak, BadgeProgress, UserBadges};
use crate::models::{Match, MatchStatus, Prediction};

pub struct BadgeService {
    users: Arc<dyn UserStore>,
    groups: Arc<dyn GroupStore>,
    matches: Arc<dyn MatchStore>,
    predictions: Arc<dyn PredictionStore>,
}

impl BadgeService {
    pub fn new(
        users: Arc<dyn UserStore>,
        groups: Arc<dyn GroupStore>,
        matches: Arc<dyn MatchStore>,
        predictions: Arc<dyn PredictionStore>,
    ) -> Self {
        Self {
            users,
            groups,
            matches,
            predictions,
        }
    }

    /// Every badge with its unlocked state for the user.
    pub async fn get_user_badges(&self, user_id: Uuid) -> Result<UserBadges, DomainError> {
        self.users
            .find_user(user_id)
            .await?
            .ok_or(DomainError::UserNotFound(user_id))?;

        let predictions = self.predictions.list_user_predictions(user_id).await?;
        let finished: HashMap<Uuid, Match> = self
            .matches
            .list_matches(Some(MatchStatus::Finished))
            .await?
            .into_iter()
            .map(|m| (m.id, m))
            .collect();

        let outcomes = settled_in_match_order(&predictions, &finished);
        let correct = outcomes.iter().filter(|&&c| c).count();
        let progress = BadgeProgress {
            predictions: predictions.len(),
            exact_scores: predictions.iter().filter(|p| p.is_exact_score).count(),
            settled: outcomes.len(),
            accuracy: percent_rounded(correct as i64, outcomes.len() as i64),
            longest_streak: longest_streak(&outcomes),
            leads_a_group: self.leads_a_group(user_id).await?,
        };
        debug!(user_id = %user_id, progress = ?progress, "Badge progress computed");

        let badges = award_badges(&progress);
        Ok(UserBadges {
            user_id,
            unlocked_count: badges.iter().filter(|b| b.unlocked).count(),
            badges,
        })
    }

    async fn leads_a_group(&self, user_id: Uuid) -> Result<bool, DomainError> {
        for (group, membership) in self.groups.list_user_memberships(user_id).await? {
            if membership.score <= 0 {
                continue;
            }
            let entries = rank_members(self.groups.list_member_scores(group.id).await?);
            if entries.len() >= 2
                && entries
                    .iter()
                    .any(|e| e.user_id == user_id && e.rank == 1)
            {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

/// Correctness of predictions on finished matches, ordered by kick-off.
fn settled_in_match_order(predictions: &[Prediction], finished: &HashMap<Uuid, Match>) -> Vec<bool> {
    let mut settled: Vec<(&Match, &Prediction)> = predictions
        .iter()
        .filter_map(|p| finished.get(&p.match_id).map(|m| (m, p)))
        .collect();
    settled.sort_by(|(ma, pa), (mb, pb)| {
        ma.scheduled_at
            .cmp(&mb.scheduled_at)
            .then(ma.id.cmp(&mb.id))
            .then(pa.created_at.cmp(&pb.created_at))
    });
    settled.into_iter().map(|(_, p)| p.is_correct).collect()
}
