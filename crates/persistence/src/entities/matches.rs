//! Match entity (database row mapping).

use chrono::{DateTime, Utc};
use domain::models::{Match, MatchStatus};
use sqlx::FromRow;
use uuid::Uuid;

/// Database enum for match_status that maps to PostgreSQL enum type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "match_status", rename_all = "lowercase")]
pub enum MatchStatusDb {
    Upcoming,
    Live,
    Finished,
    Cancelled,
}

impl From<MatchStatusDb> for MatchStatus {
    fn from(db_status: MatchStatusDb) -> Self {
        match db_status {
            MatchStatusDb::Upcoming => MatchStatus::Upcoming,
            MatchStatusDb::Live => MatchStatus::Live,
            MatchStatusDb::Finished => MatchStatus::Finished,
            MatchStatusDb::Cancelled => MatchStatus::Cancelled,
        }
    }
}

impl From<MatchStatus> for MatchStatusDb {
    fn from(status: MatchStatus) -> Self {
        match status {
            MatchStatus::Upcoming => MatchStatusDb::Upcoming,
            MatchStatus::Live => MatchStatusDb::Live,
            MatchStatus::Finished => MatchStatusDb::Finished,
            MatchStatus::Cancelled => MatchStatusDb::Cancelled,
        }
    }
}

/// Database row mapping for the matches table.
#[derive(Debug, Clone, FromRow)]
pub struct MatchEntity {
    pub id: Uuid,
    pub team_a: String,
    pub team_b: String,
    pub scheduled_at: DateTime<Utc>,
    pub tournament: String,
    pub status: MatchStatusDb,
    pub score_a: Option<i32>,
    pub score_b: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<MatchEntity> for Match {
    fn from(entity: MatchEntity) -> Self {
        Self {
            id: entity.id,
            team_a: entity.team_a,
            team_b: entity.team_b,
            scheduled_at: entity.scheduled_at,
            tournament: entity.tournament,
            status: entity.status.into(),
            score_a: entity.score_a,
            score_b: entity.score_b,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}
