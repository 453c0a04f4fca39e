//! Match repository for database operations.

use domain::models::{Match, MatchStatus};
use domain::services::{MatchStore, StoreResult};
use sqlx::PgPool;
use uuid::Uuid;

use super::store_error;
use crate::entities::{MatchEntity, MatchStatusDb};
use crate::metrics::QueryTimer;

const MATCH_COLUMNS: &str = "id, team_a, team_b, scheduled_at, tournament, status, score_a, score_b, created_at, updated_at";

/// Repository for match-related database operations.
#[derive(Clone)]
pub struct MatchRepository {
    pool: PgPool,
}

impl MatchRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl MatchStore for MatchRepository {
    async fn find_match(&self, id: Uuid) -> StoreResult<Option<Match>> {
        let timer = QueryTimer::new("find_match");
        let result = sqlx::query_as::<_, MatchEntity>(&format!(
            "SELECT {} FROM matches WHERE id = $1",
            MATCH_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.finish(&result);
        Ok(result.map_err(store_error)?.map(Into::into))
    }

    async fn list_matches(&self, status: Option<MatchStatus>) -> StoreResult<Vec<Match>> {
        let timer = QueryTimer::new("list_matches");
        let result = sqlx::query_as::<_, MatchEntity>(&format!(
            r#"
            SELECT {}
            FROM matches
            WHERE ($1::match_status IS NULL OR status = $1)
            ORDER BY scheduled_at ASC, id ASC
            "#,
            MATCH_COLUMNS
        ))
        .bind(status.map(MatchStatusDb::from))
        .fetch_all(&self.pool)
        .await;
        timer.finish(&result);
        Ok(result
            .map_err(store_error)?
            .into_iter()
            .map(Into::into)
            .collect())
    }

    async fn insert_match(&self, m: &Match) -> StoreResult<()> {
        let timer = QueryTimer::new("insert_match");
        let result = sqlx::query(
            r#"
            INSERT INTO matches (id, team_a, team_b, scheduled_at, tournament, status, score_a, score_b, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(m.id)
        .bind(&m.team_a)
        .bind(&m.team_b)
        .bind(m.scheduled_at)
        .bind(&m.tournament)
        .bind(MatchStatusDb::from(m.status))
        .bind(m.score_a)
        .bind(m.score_b)
        .bind(m.created_at)
        .bind(m.updated_at)
        .execute(&self.pool)
        .await;
        timer.finish(&result);
        result.map_err(store_error)?;
        Ok(())
    }

    async fn update_match_state(&self, m: &Match) -> StoreResult<()> {
        let timer = QueryTimer::new("update_match_state");
        let result = sqlx::query(
            r#"
            UPDATE matches
            SET status = $2, score_a = $3, score_b = $4, updated_at = $5
            WHERE id = $1
            "#,
        )
        .bind(m.id)
        .bind(MatchStatusDb::from(m.status))
        .bind(m.score_a)
        .bind(m.score_b)
        .bind(m.updated_at)
        .execute(&self.pool)
        .await;
        timer.finish(&result);
        result.map_err(store_error)?;
        Ok(())
    }
}
