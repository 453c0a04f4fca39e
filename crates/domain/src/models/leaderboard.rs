//! Leaderboard and statistics views.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A member's cumulative score in one group, as read from the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberScore {
    pub user_id: Uuid,
    pub display_name: String,
    pub score: i32,
    pub joined_at: DateTime<Utc>,
}

/// One ranked row of a leaderboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct LeaderboardEntry {
    pub rank: u32,
    pub user_id: Uuid,
    pub display_name: String,
    pub score: i32,
}

/// Ranked members of a group.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct Leaderboard {
    pub group_id: Uuid,
    pub entries: Vec<LeaderboardEntry>,
}

/// Users ranked across all groups.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct GlobalLeaderboard {
    pub entries: Vec<LeaderboardEntry>,
    pub count: usize,
}

/// Query parameters for the global leaderboard.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GlobalLeaderboardQuery {
    pub limit: Option<i64>,
}

/// A user's prediction statistics within one group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct UserGroupStats {
    pub user_id: Uuid,
    pub group_id: Uuid,
    pub total_points: i32,
    pub correct_predictions: i64,
    pub total_predictions: i64,
    pub exact_scores: i64,
    pub accuracy: i64,
}

/// Per-group line of a user's aggregated statistics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct GroupScoreSummary {
    pub group_id: Uuid,
    pub group_name: String,
    pub score: i32,
    pub correct_predictions: i64,
    pub accuracy: i64,
}

/// A user's statistics aggregated over every group they belong to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct AggregatedUserStats {
    pub user_id: Uuid,
    pub total_points: i32,
    pub groups_count: usize,
    pub correct_predictions: i64,
    pub total_predictions: i64,
    pub exact_scores: i64,
    pub accuracy: i64,
    pub group_scores: Vec<GroupScoreSummary>,
}
