//! Rules for simulated matches used in demos and local play.

use chrono::{DateTime, Utc};
use rand::seq::SliceRandom;
use rand::Rng;

use crate::models::matches::CreateMatchRequest;
use crate::models::{MatchResult, TeamSide};

/// Teams drawn for simulated matches.
pub const DEFAULT_TEAMS: &[&str] = &["T1", "Gen.G", "JD Gaming", "BLG", "G2", "Fnatic"];

pub const SIMULATED_TOURNAMENT: &str = "Simulated League";

pub const DEFAULT_WINNING_SCORE: i32 = 10;

/// Point-by-point match simulation.
#[derive(Debug, Clone)]
pub struct MatchSimulator {
    teams: Vec<String>,
    winning_score: i32,
}

impl MatchSimulator {
    /// `teams` must hold at least two names and `winning_score` must be positive.
    pub fn new(teams: Vec<String>, winning_score: i32) -> Option<Self> {
        if teams.len() < 2 || winning_score < 1 {
            return None;
        }
        Some(Self {
            teams,
            winning_score,
        })
    }

    pub fn with_winning_score(winning_score: i32) -> Option<Self> {
        Self::new(
            DEFAULT_TEAMS.iter().map(|t| t.to_string()).collect(),
            winning_score,
        )
    }

    pub fn winning_score(&self) -> i32 {
        self.winning_score
    }

    /// Awards one point to a random side. Returns true once either side
    /// has reached the winning score.
    pub fn next_point<R: Rng + ?Sized>(&self, tally: &mut MatchResult, rng: &mut R) -> bool {
        if self.is_over(tally) {
            return true;
        }
        match Self::pick_side(rng) {
            TeamSide::TeamA => tally.score_a += 1,
            TeamSide::TeamB => tally.score_b += 1,
        }
        self.is_over(tally)
    }

    pub fn is_over(&self, tally: &MatchResult) -> bool {
        tally.score_a >= self.winning_score || tally.score_b >= self.winning_score
    }

    fn pick_side<R: Rng + ?Sized>(rng: &mut R) -> TeamSide {
        if rng.gen_bool(0.5) {
            TeamSide::TeamA
        } else {
            TeamSide::TeamB
        }
    }

    /// A new match between two distinct random teams.
    pub fn random_match<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        scheduled_at: DateTime<Utc>,
    ) -> CreateMatchRequest {
        let mut picked = self.teams.choose_multiple(rng, 2);
        let team_a = picked.next().cloned().unwrap_or_default();
        let team_b = picked.next().cloned().unwrap_or_default();
        CreateMatchRequest {
            id: None,
            team_a,
            team_b,
            scheduled_at,
            tournament: SIMULATED_TOURNAMENT.to_string(),
        }
    }
}
