//! Prediction repository, including the scoring transaction.

use domain::models::{MatchStatus, NewPrediction, Prediction};
use domain::services::{MemberTotal, PredictionStore, PredictionWrite, ScoringBatch, StoreResult};
use sqlx::PgPool;
use uuid::Uuid;

use super::store_error;
use crate::entities::{MatchStatusDb, MemberTotalEntity, PredictionEntity, TeamSideDb};
use crate::metrics::QueryTimer;

const PREDICTION_COLUMNS: &str = "id, user_id, match_id, group_id, predicted_winner, predicted_score_a, predicted_score_b, points_earned, is_correct, is_exact_score, created_at, updated_at";

/// Key of the transaction-scoped advisory lock serializing scoring of one match.
pub fn advisory_lock_key(match_id: Uuid) -> i64 {
    let bytes = match_id.as_bytes();
    let mut head = [0u8; 8];
    head.copy_from_slice(&bytes[..8]);
    i64::from_be_bytes(head)
}

/// Repository for prediction-related database operations.
#[derive(Clone)]
pub struct PredictionRepository {
    pool: PgPool,
}

impl PredictionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch_where(
        &self,
        query_name: &'static str,
        filter: &str,
        a: Uuid,
        b: Option<Uuid>,
    ) -> StoreResult<Vec<Prediction>> {
        let timer = QueryTimer::new(query_name);
        let sql = format!(
            "SELECT {} FROM predictions WHERE {} ORDER BY created_at ASC, id ASC",
            PREDICTION_COLUMNS, filter
        );
        let mut query = sqlx::query_as::<_, PredictionEntity>(&sql).bind(a);
        if let Some(b) = b {
            query = query.bind(b);
        }
        let result = query.fetch_all(&self.pool).await;
        timer.finish(&result);
        Ok(result
            .map_err(store_error)?
            .into_iter()
            .map(Into::into)
            .collect())
    }
}

#[async_trait::async_trait]
impl PredictionStore for PredictionRepository {
    async fn upsert_prediction(
        &self,
        new: &NewPrediction,
        open: &[MatchStatus],
    ) -> StoreResult<PredictionWrite> {
        let timer = QueryTimer::new("upsert_prediction");
        let mut tx = self.pool.begin().await.map_err(store_error)?;

        // FOR SHARE blocks a concurrent status update until this transaction ends.
        let status: Option<MatchStatusDb> =
            sqlx::query_scalar("SELECT status FROM matches WHERE id = $1 FOR SHARE")
                .bind(new.match_id)
                .fetch_optional(&mut *tx)
                .await
                .map_err(store_error)?;
        let status = match status {
            Some(status) => MatchStatus::from(status),
            None => {
                timer.record();
                return Ok(PredictionWrite::MatchMissing);
            }
        };
        if !open.contains(&status) {
            timer.record();
            return Ok(PredictionWrite::Closed(status));
        }

        let prediction = sqlx::query_as::<_, PredictionEntity>(&format!(
            r#"
            INSERT INTO predictions (user_id, match_id, group_id, predicted_winner,
                                     predicted_score_a, predicted_score_b, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $7)
            ON CONFLICT (user_id, match_id, group_id) DO UPDATE SET
                predicted_winner = EXCLUDED.predicted_winner,
                predicted_score_a = EXCLUDED.predicted_score_a,
                predicted_score_b = EXCLUDED.predicted_score_b,
                points_earned = 0,
                is_correct = FALSE,
                is_exact_score = FALSE,
                updated_at = EXCLUDED.updated_at
            RETURNING {}
            "#,
            PREDICTION_COLUMNS
        ))
        .bind(new.user_id)
        .bind(new.match_id)
        .bind(new.group_id)
        .bind(TeamSideDb::from(new.predicted_winner))
        .bind(new.predicted_score_a)
        .bind(new.predicted_score_b)
        .bind(new.submitted_at)
        .fetch_one(&mut *tx)
        .await
        .map_err(store_error)?;

        tx.commit().await.map_err(store_error)?;
        timer.record();
        Ok(PredictionWrite::Saved(prediction.into()))
    }

    async fn list_match_predictions(&self, match_id: Uuid) -> StoreResult<Vec<Prediction>> {
        self.fetch_where("list_match_predictions", "match_id = $1", match_id, None)
            .await
    }

    async fn list_group_match_predictions(
        &self,
        group_id: Uuid,
        match_id: Uuid,
    ) -> StoreResult<Vec<Prediction>> {
        self.fetch_where(
            "list_group_match_predictions",
            "group_id = $1 AND match_id = $2",
            group_id,
            Some(match_id),
        )
        .await
    }

    async fn list_user_group_predictions(
        &self,
        user_id: Uuid,
        group_id: Uuid,
    ) -> StoreResult<Vec<Prediction>> {
        self.fetch_where(
            "list_user_group_predictions",
            "user_id = $1 AND group_id = $2",
            user_id,
            Some(group_id),
        )
        .await
    }

    async fn list_group_predictions(&self, group_id: Uuid) -> StoreResult<Vec<Prediction>> {
        self.fetch_where("list_group_predictions", "group_id = $1", group_id, None)
            .await
    }

    async fn list_user_predictions(&self, user_id: Uuid) -> StoreResult<Vec<Prediction>> {
        self.fetch_where("list_user_predictions", "user_id = $1", user_id, None)
            .await
    }

    async fn apply_scoring(&self, batch: &ScoringBatch) -> StoreResult<Vec<MemberTotal>> {
        let timer = QueryTimer::new("apply_scoring");
        let mut tx = self.pool.begin().await.map_err(store_error)?;

        // Serializes scoring of the same match across processes until commit.
        sqlx::query("SELECT pg_advisory_xact_lock($1)")
            .bind(advisory_lock_key(batch.match_id))
            .execute(&mut *tx)
            .await
            .map_err(store_error)?;

        let ids: Vec<Uuid> = batch.outcomes.iter().map(|o| o.prediction_id).collect();
        let correct: Vec<bool> = batch.outcomes.iter().map(|o| o.outcome.is_correct).collect();
        let exact: Vec<bool> = batch
            .outcomes
            .iter()
            .map(|o| o.outcome.is_exact_score)
            .collect();
        let points: Vec<i32> = batch
            .outcomes
            .iter()
            .map(|o| o.outcome.points_earned)
            .collect();

        sqlx::query(
            r#"
            UPDATE predictions AS p
            SET is_correct = s.is_correct,
                is_exact_score = s.is_exact_score,
                points_earned = s.points_earned,
                updated_at = $5
            FROM UNNEST($1::uuid[], $2::bool[], $3::bool[], $4::int4[])
                 AS s(id, is_correct, is_exact_score, points_earned)
            WHERE p.id = s.id
            "#,
        )
        .bind(&ids)
        .bind(&correct)
        .bind(&exact)
        .bind(&points)
        .bind(batch.scored_at)
        .execute(&mut *tx)
        .await
        .map_err(store_error)?;

        let (users, groups): (Vec<Uuid>, Vec<Uuid>) = batch.touched_members().into_iter().unzip();

        let totals = sqlx::query_as::<_, MemberTotalEntity>(
            r#"
            UPDATE group_memberships AS gm
            SET score = (
                SELECT COALESCE(SUM(p.points_earned), 0)::int4
                FROM predictions p
                WHERE p.user_id = gm.user_id AND p.group_id = gm.group_id
            )
            FROM UNNEST($1::uuid[], $2::uuid[]) AS t(user_id, group_id)
            WHERE gm.user_id = t.user_id AND gm.group_id = t.group_id
            RETURNING gm.user_id, gm.group_id, gm.score
            "#,
        )
        .bind(&users)
        .bind(&groups)
        .fetch_all(&mut *tx)
        .await
        .map_err(store_error)?;

        tx.commit().await.map_err(store_error)?;
        timer.record();

        let mut totals: Vec<MemberTotal> = totals.into_iter().map(Into::into).collect();
        totals.sort_by(|a, b| (a.user_id, a.group_id).cmp(&(b.user_id, b.group_id)));
        Ok(totals)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_advisory_lock_key_is_stable() {
        let id = Uuid::parse_str("0123456789abcdef0123456789abcdef").unwrap();
        assert_eq!(advisory_lock_key(id), 0x0123456789abcdef);
        assert_eq!(advisory_lock_key(id), advisory_lock_key(id));
    }

    #[test]
    fn test_advisory_lock_key_differs_per_match() {
        let a = Uuid::from_u128(1 << 64);
        let b = Uuid::from_u128(2 << 64);
        assert_ne!(advisory_lock_key(a), advisory_lock_key(b));
    }
}
