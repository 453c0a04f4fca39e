//! Achievement badges, derived from a user's prediction history.
//!
//! Badges are never stored: they are recomputed from predictions, match
//! results and group standings each time they are read.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Consecutive correct predictions needed for [`BadgeKind::WinningStreak`].
pub const WINNING_STREAK_LENGTH: usize = 5;
/// Accuracy (percent) needed for [`BadgeKind::Expert`].
pub const EXPERT_ACCURACY: i64 = 80;
/// Settled predictions needed before accuracy counts towards [`BadgeKind::Expert`].
pub const EXPERT_MIN_SETTLED: usize = 10;
/// Other badges needed for [`BadgeKind::Collector`].
pub const COLLECTOR_BADGES: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BadgeKind {
    FirstPrediction,
    PerfectScore,
    WinningStreak,
    GroupLeader,
    Expert,
    Collector,
}

impl BadgeKind {
    pub const ALL: [BadgeKind; 6] = [
        BadgeKind::FirstPrediction,
        BadgeKind::PerfectScore,
        BadgeKind::WinningStreak,
        BadgeKind::GroupLeader,
        BadgeKind::Expert,
        BadgeKind::Collector,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            BadgeKind::FirstPrediction => "First steps",
            BadgeKind::PerfectScore => "Perfect score",
            BadgeKind::WinningStreak => "Winning streak",
            BadgeKind::GroupLeader => "Group leader",
            BadgeKind::Expert => "Expert",
            BadgeKind::Collector => "Collector",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            BadgeKind::FirstPrediction => "Make your first prediction",
            BadgeKind::PerfectScore => "Predict an exact score",
            BadgeKind::WinningStreak => "Get 5 predictions in a row right",
            BadgeKind::GroupLeader => "Lead a group leaderboard",
            BadgeKind::Expert => "Reach 80% accuracy over at least 10 finished matches",
            BadgeKind::Collector => "Unlock 5 badges",
        }
    }
}

/// Facts about a user's history that badges are awarded on.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BadgeProgress {
    pub predictions: usize,
    pub exact_scores: usize,
    /// Predictions on finished matches.
    pub settled: usize,
    /// Rounded percentage of settled predictions that were correct.
    pub accuracy: i64,
    pub longest_streak: usize,
    /// First place (alone or tied) with a positive score in a group of two or more.
    pub leads_a_group: bool,
}

impl BadgeProgress {
    fn earns(&self, kind: BadgeKind) -> bool {
        match kind {
            BadgeKind::FirstPrediction => self.predictions > 0,
            BadgeKind::PerfectScore => self.exact_scores > 0,
            BadgeKind::WinningStreak => self.longest_streak >= WINNING_STREAK_LENGTH,
            BadgeKind::GroupLeader => self.leads_a_group,
            BadgeKind::Expert => {
                self.settled >= EXPERT_MIN_SETTLED && self.accuracy >= EXPERT_ACCURACY
            }
            // Depends on the others, see `award_badges`.
            BadgeKind::Collector => false,
        }
    }
}

/// Longest run of consecutive `true` values.
pub fn longest_streak(outcomes: &[bool]) -> usize {
    outcomes
        .iter()
        .fold((0, 0), |(best, run), &correct| {
            let run = if correct { run + 1 } else { 0 };
            (best.max(run), run)
        })
        .0
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct Badge {
    pub id: BadgeKind,
    pub name: &'static str,
    pub description: &'static str,
    pub unlocked: bool,
}

/// Every badge, each marked unlocked or not.
pub fn award_badges(progress: &BadgeProgress) -> Vec<Badge> {
    let mut badges: Vec<Badge> = BadgeKind::ALL
        .iter()
        .map(|&kind| Badge {
            id: kind,
            name: kind.name(),
            description: kind.description(),
            unlocked: progress.earns(kind),
        })
        .collect();

    let unlocked = badges.iter().filter(|b| b.unlocked).count();
    if let Some(collector) = badges.iter_mut().find(|b| b.id == BadgeKind::Collector) {
        collector.unlocked = unlocked >= COLLECTOR_BADGES;
    }
    badges
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct UserBadges {
    pub user_id: Uuid,
    pub unlocked_count: usize,
    pub badges: Vec<Badge>,
}
