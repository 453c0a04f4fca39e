//! Leaderboards and per-user prediction statistics.

use std::sync::Arc;
use uuid::Uuid;

use super::store::{GroupStore, PredictionStore, UserStore};
use crate::errors::DomainError;
use crate::models::leaderboard::{AggregatedUserStats, GlobalLeaderboard, GroupScoreSummary};
use crate::models::{Leaderboard, LeaderboardEntry, MemberScore, Prediction, UserGroupStats};

/// Default and maximum size of the global leaderboard.
pub const DEFAULT_GLOBAL_LIMIT: usize = 50;
pub const MAX_GLOBAL_LIMIT: usize = 100;

/// Orders members by score (desc), join time (asc), then user id, and
/// assigns competition ranks: equal scores share a rank and the next rank
/// skips accordingly.
pub fn rank_members(mut members: Vec<MemberScore>) -> Vec<LeaderboardEntry> {
    members.sort_by(|a, b| {
        b.score
            .cmp(&a.score)
            .then(a.joined_at.cmp(&b.joined_at))
            .then(a.user_id.cmp(&b.user_id))
    });

    let mut entries: Vec<LeaderboardEntry> = Vec::with_capacity(members.len());
    for (position, member) in members.into_iter().enumerate() {
        let rank = match entries.last() {
            Some(prev) if prev.score == member.score => prev.rank,
            _ => position as u32 + 1,
        };
        entries.push(LeaderboardEntry {
            rank,
            user_id: member.user_id,
            display_name: member.display_name,
            score: member.score,
        });
    }
    entries
}

/// `round(100 * part / total)` with halves rounded up; 0 when `total` is 0.
pub fn percent_rounded(part: i64, total: i64) -> i64 {
    if total <= 0 {
        return 0;
    }
    (part * 200 + total) / (2 * total)
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct Tally {
    points: i32,
    total: i64,
    correct: i64,
    exact: i64,
}

impl Tally {
    fn of(predictions: &[Prediction]) -> Self {
        predictions.iter().fold(Tally::default(), |mut t, p| {
            t.points += p.points_earned;
            t.total += 1;
            t.correct += i64::from(p.is_correct);
            t.exact += i64::from(p.is_exact_score);
            t
        })
    }

    fn accuracy(&self) -> i64 {
        percent_rounded(self.correct, self.total)
    }
}

/// Read-only views over group scores and predictions.
pub struct LeaderboardService {
    groups: Arc<dyn GroupStore>,
    users: Arc<dyn UserStore>,
    predictions: Arc<dyn PredictionStore>,
}

impl LeaderboardService {
    pub fn new(
        groups: Arc<dyn GroupStore>,
        users: Arc<dyn UserStore>,
        predictions: Arc<dyn PredictionStore>,
    ) -> Self {
        Self {
            groups,
            users,
            predictions,
        }
    }

    /// The group's ranked members, visible to members only.
    pub async fn get_leaderboard(
        &self,
        viewer_id: Uuid,
        group_id: Uuid,
    ) -> Result<Leaderboard, DomainError> {
        self.groups
            .find_group(group_id)
            .await?
            .ok_or(DomainError::GroupNotFound(group_id))?;
        self.groups
            .find_membership(group_id, viewer_id)
            .await?
            .ok_or(DomainError::NotGroupMember {
                user_id: viewer_id,
                group_id,
            })?;

        let members = self.groups.list_member_scores(group_id).await?;
        Ok(Leaderboard {
            group_id,
            entries: rank_members(members),
        })
    }

    pub async fn get_user_group_stats(
        &self,
        user_id: Uuid,
        group_id: Uuid,
    ) -> Result<UserGroupStats, DomainError> {
        self.users
            .find_user(user_id)
            .await?
            .ok_or(DomainError::UserNotFound(user_id))?;
        self.groups
            .find_group(group_id)
            .await?
            .ok_or(DomainError::GroupNotFound(group_id))?;
        self.groups
            .find_membership(group_id, user_id)
            .await?
            .ok_or(DomainError::NotGroupMember { user_id, group_id })?;

        let predictions = self
            .predictions
            .list_user_group_predictions(user_id, group_id)
            .await?;
        let tally = Tally::of(&predictions);

        Ok(UserGroupStats {
            user_id,
            group_id,
            total_points: tally.points,
            correct_predictions: tally.correct,
            total_predictions: tally.total,
            exact_scores: tally.exact,
            accuracy: tally.accuracy(),
        })
    }

    /// Statistics over every group the user belongs to.
    pub async fn get_user_overall_stats(
        &self,
        user_id: Uuid,
    ) -> Result<AggregatedUserStats, DomainError> {
        self.users
            .find_user(user_id)
            .await?
            .ok_or(DomainError::UserNotFound(user_id))?;

        let memberships = self.groups.list_user_memberships(user_id).await?;
        let mut overall = Tally::default();
        let mut total_points = 0;
        let mut group_scores = Vec::with_capacity(memberships.len());

        for (group, membership) in &memberships {
            let predictions = self
                .predictions
                .list_user_group_predictions(user_id, group.id)
                .await?;
            let tally = Tally::of(&predictions);
            overall.total += tally.total;
            overall.correct += tally.correct;
            overall.exact += tally.exact;
            total_points += membership.score;

            group_scores.push(GroupScoreSummary {
                group_id: group.id,
                group_name: group.name.clone(),
                score: membership.score,
                correct_predictions: tally.correct,
                accuracy: tally.accuracy(),
            });
        }

        Ok(AggregatedUserStats {
            user_id,
            total_points,
            groups_count: memberships.len(),
            correct_predictions: overall.correct,
            total_predictions: overall.total,
            exact_scores: overall.exact,
            accuracy: overall.accuracy(),
            group_scores,
        })
    }

    /// Users ranked by the sum of their group scores.
    pub async fn get_global_leaderboard(
        &self,
        limit: Option<usize>,
    ) -> Result<GlobalLeaderboard, DomainError> {
        let limit = limit.unwrap_or(DEFAULT_GLOBAL_LIMIT);
        if limit == 0 || limit > MAX_GLOBAL_LIMIT {
            return Err(DomainError::Validation(format!(
                "limit must be between 1 and {}",
                MAX_GLOBAL_LIMIT
            )));
        }

        let mut entries = rank_members(self.groups.list_global_scores().await?);
        entries.truncate(limit);
        Ok(GlobalLeaderboard {
            count: entries.len(),
            entries,
        })
    }
}
