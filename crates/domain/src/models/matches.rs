//! Match domain models and lifecycle rules.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;
use validator::Validate;

use crate::errors::DomainError;

/// Lifecycle status of a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchStatus {
    Upcoming,
    #[serde(alias = "ongoing")]
    Live,
    #[serde(alias = "completed")]
    Finished,
    Cancelled,
}

impl MatchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchStatus::Upcoming => "upcoming",
            MatchStatus::Live => "live",
            MatchStatus::Finished => "finished",
            MatchStatus::Cancelled => "cancelled",
        }
    }

    /// Returns true once the status can no longer change.
    pub fn is_terminal(&self) -> bool {
        matches!(self, MatchStatus::Finished | MatchStatus::Cancelled)
    }

    /// Whether a match may move from `self` to `next`.
    ///
    /// Same-status updates are allowed for non-terminal states only; the
    /// caller handles idempotent re-application of a finished result.
    pub fn can_transition_to(&self, next: MatchStatus) -> bool {
        use MatchStatus::*;
        matches!(
            (self, next),
            (Upcoming, Upcoming)
                | (Upcoming, Live)
                | (Upcoming, Finished)
                | (Upcoming, Cancelled)
                | (Live, Live)
                | (Live, Finished)
        )
    }
}

impl FromStr for MatchStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "upcoming" => Ok(MatchStatus::Upcoming),
            "live" | "ongoing" => Ok(MatchStatus::Live),
            "finished" | "completed" => Ok(MatchStatus::Finished),
            "cancelled" | "canceled" => Ok(MatchStatus::Cancelled),
            _ => Err(format!("Invalid match status: {}", s)),
        }
    }
}

impl fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One side of a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TeamSide {
    TeamA,
    TeamB,
}

impl TeamSide {
    pub fn as_str(&self) -> &'static str {
        match self {
            TeamSide::TeamA => "team_a",
            TeamSide::TeamB => "team_b",
        }
    }
}

impl FromStr for TeamSide {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "team_a" => Ok(TeamSide::TeamA),
            "team_b" => Ok(TeamSide::TeamB),
            _ => Err(format!("Invalid team side: {}", s)),
        }
    }
}

impl fmt::Display for TeamSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A final (or running) series score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MatchResult {
    pub score_a: i32,
    pub score_b: i32,
}

impl MatchResult {
    pub fn new(score_a: i32, score_b: i32) -> Self {
        Self { score_a, score_b }
    }

    /// Winning side, or `None` for a draw.
    pub fn winner(&self) -> Option<TeamSide> {
        match self.score_a.cmp(&self.score_b) {
            std::cmp::Ordering::Greater => Some(TeamSide::TeamA),
            std::cmp::Ordering::Less => Some(TeamSide::TeamB),
            std::cmp::Ordering::Equal => None,
        }
    }
}

/// A League of Legends esports match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Match {
    pub id: Uuid,
    pub team_a: String,
    pub team_b: String,
    pub scheduled_at: DateTime<Utc>,
    pub tournament: String,
    pub status: MatchStatus,
    pub score_a: Option<i32>,
    pub score_b: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Match {
    /// The final result, present only for finished matches with both scores.
    pub fn final_result(&self) -> Option<MatchResult> {
        match (self.status, self.score_a, self.score_b) {
            (MatchStatus::Finished, Some(a), Some(b)) => Some(MatchResult::new(a, b)),
            _ => None,
        }
    }

    /// Derived winner; `None` until finished and for draws.
    pub fn winner(&self) -> Option<TeamSide> {
        self.final_result().and_then(|r| r.winner())
    }

    /// Applies a status/score update, enforcing the lifecycle rules.
    ///
    /// Returns `Ok(None)` when the update changes nothing.
    pub fn apply_update(
        &self,
        update: &MatchUpdate,
        now: DateTime<Utc>,
    ) -> Result<Option<Match>, DomainError> {
        let result = update.checked_result()?;

        if self.status == MatchStatus::Finished && update.status == MatchStatus::Finished {
            return if self.final_result() == result {
                Ok(None)
            } else {
                Err(DomainError::Validation(
                    "final score of a finished match cannot change".to_string(),
                ))
            };
        }
        if self.status == update.status {
            return Ok(None);
        }
        if !self.status.can_transition_to(update.status) {
            return Err(DomainError::InvalidTransition {
                from: self.status,
                to: update.status,
            });
        }

        let mut next = self.clone();
        next.status = update.status;
        next.score_a = result.map(|r| r.score_a);
        next.score_b = result.map(|r| r.score_b);
        next.updated_at = now;
        Ok(Some(next))
    }
}

/// A requested change of status (and final score when finishing).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct MatchUpdate {
    pub status: MatchStatus,

    #[validate(range(min = 0, max = 99, message = "Score must be between 0 and 99"))]
    pub score_a: Option<i32>,

    #[validate(range(min = 0, max = 99, message = "Score must be between 0 and 99"))]
    pub score_b: Option<i32>,
}

impl MatchUpdate {
    pub fn status(status: MatchStatus) -> Self {
        Self {
            status,
            score_a: None,
            score_b: None,
        }
    }

    pub fn finished(score_a: i32, score_b: i32) -> Self {
        Self {
            status: MatchStatus::Finished,
            score_a: Some(score_a),
            score_b: Some(score_b),
        }
    }

    /// Checks that scores are present exactly when the status is finished.
    pub fn checked_result(&self) -> Result<Option<MatchResult>, DomainError> {
        self.validate()?;
        match (self.status, self.score_a, self.score_b) {
            (MatchStatus::Finished, Some(a), Some(b)) => Ok(Some(MatchResult::new(a, b))),
            (MatchStatus::Finished, _, _) => Err(DomainError::Validation(
                "a finished match requires both final scores".to_string(),
            )),
            (_, None, None) => Ok(None),
            (status, _, _) => Err(DomainError::Validation(format!(
                "final scores are only accepted for finished matches (got {})",
                status
            ))),
        }
    }
}

/// Request payload for registering a match.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct CreateMatchRequest {
    /// Upstream identifier to reuse, if the match comes from a feed.
    pub id: Option<Uuid>,

    #[validate(custom(function = "shared::validation::validate_team_name"))]
    pub team_a: String,

    #[validate(custom(function = "shared::validation::validate_team_name"))]
    pub team_b: String,

    pub scheduled_at: DateTime<Utc>,

    #[validate(length(
        min = 1,
        max = 100,
        message = "Tournament must be between 1 and 100 characters"
    ))]
    pub tournament: String,
}

impl CreateMatchRequest {
    /// Builds the upcoming match this request describes.
    pub fn into_match(self, now: DateTime<Utc>) -> Result<Match, DomainError> {
        self.validate()?;
        if self.team_a.trim().eq_ignore_ascii_case(self.team_b.trim()) {
            return Err(DomainError::Validation(
                "a match needs two different teams".to_string(),
            ));
        }
        Ok(Match {
            id: self.id.unwrap_or_else(Uuid::new_v4),
            team_a: self.team_a.trim().to_string(),
            team_b: self.team_b.trim().to_string(),
            scheduled_at: self.scheduled_at,
            tournament: self.tournament,
            status: MatchStatus::Upcoming,
            score_a: None,
            score_b: None,
            created_at: now,
            updated_at: now,
        })
    }
}

/// Query parameters for listing matches.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ListMatchesQuery {
    pub status: Option<MatchStatus>,
}

/// Match as returned by the API, with the derived winner.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct MatchResponse {
    #[serde(flatten)]
    pub r#match: Match,
    pub winner: Option<TeamSide>,
}

impl From<Match> for MatchResponse {
    fn from(m: Match) -> Self {
        let winner = m.winner();
        Self { r#match: m, winner }
    }
}

/// Response for listing matches.
#[derive(Debug, Clone, Serialize)]
pub struct ListMatchesResponse {
    pub data: Vec<MatchResponse>,
    pub count: usize,
}
