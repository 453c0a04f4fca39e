//! Prediction entity (database row mapping).

use chrono::{DateTime, Utc};
use domain::models::{Prediction, TeamSide};
use domain::services::MemberTotal;
use sqlx::FromRow;
use uuid::Uuid;

/// Database enum for team_side that maps to PostgreSQL enum type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "team_side", rename_all = "snake_case")]
pub enum TeamSideDb {
    TeamA,
    TeamB,
}

impl From<TeamSideDb> for TeamSide {
    fn from(db_side: TeamSideDb) -> Self {
        match db_side {
            TeamSideDb::TeamA => TeamSide::TeamA,
            TeamSideDb::TeamB => TeamSide::TeamB,
        }
    }
}

impl From<TeamSide> for TeamSideDb {
    fn from(side: TeamSide) -> Self {
        match side {
            TeamSide::TeamA => TeamSideDb::TeamA,
            TeamSide::TeamB => TeamSideDb::TeamB,
        }
    }
}

/// Database row mapping for the predictions table.
#[derive(Debug, Clone, FromRow)]
pub struct PredictionEntity {
    pub id: Uuid,
    pub user_id: Uuid,
    pub match_id: Uuid,
    pub group_id: Uuid,
    pub predicted_winner: TeamSideDb,
    pub predicted_score_a: Option<i32>,
    pub predicted_score_b: Option<i32>,
    pub points_earned: i32,
    pub is_correct: bool,
    pub is_exact_score: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<PredictionEntity> for Prediction {
    fn from(entity: PredictionEntity) -> Self {
        Self {
            id: entity.id,
            user_id: entity.user_id,
            match_id: entity.match_id,
            group_id: entity.group_id,
            predicted_winner: entity.predicted_winner.into(),
            predicted_score_a: entity.predicted_score_a,
            predicted_score_b: entity.predicted_score_b,
            points_earned: entity.points_earned,
            is_correct: entity.is_correct,
            is_exact_score: entity.is_exact_score,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}

/// Recomputed membership score returned by the scoring transaction.
#[derive(Debug, Clone, FromRow)]
pub struct MemberTotalEntity {
    pub user_id: Uuid,
    pub group_id: Uuid,
    pub score: i32,
}

impl From<MemberTotalEntity> for MemberTotal {
    fn from(entity: MemberTotalEntity) -> Self {
        Self {
            user_id: entity.user_id,
            group_id: entity.group_id,
            score: entity.score,
        }
    }
}
