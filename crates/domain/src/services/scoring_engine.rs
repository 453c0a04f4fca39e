//! Scoring engine: turns a finished match into point awards.

use chrono::Utc;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::OwnedMutexGuard;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::scoring::{actual_winner, evaluate_prediction, ScoringConfig};
use super::store::{MatchStore, MemberTotal, PredictionStore, ScoredPrediction, ScoringBatch};
use crate::errors::DomainError;
use crate::models::TeamSide;

/// Default bound on waiting for another scoring run of the same match.
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(5);

/// Per-match mutual exclusion for scoring runs.
///
/// Different matches never contend; entries are dropped once unused.
pub struct MatchLocks {
    locks: Mutex<HashMap<Uuid, Arc<tokio::sync::Mutex<()>>>>,
    timeout: Duration,
}

impl MatchLocks {
    pub fn new(timeout: Duration) -> Self {
        Self {
            locks: Mutex::new(HashMap::new()),
            timeout,
        }
    }

    /// Waits for the lock of `match_id`, failing with
    /// [`DomainError::ConcurrentScoringConflict`] after the timeout.
    pub async fn acquire(&self, match_id: Uuid) -> Result<OwnedMutexGuard<()>, DomainError> {
        let lock = {
            let mut table = self.locks.lock().unwrap_or_else(|e| e.into_inner());
            table.retain(|_, l| Arc::strong_count(l) > 1);
            table
                .entry(match_id)
                .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
                .clone()
        };

        tokio::time::timeout(self.timeout, lock.lock_owned())
            .await
            .map_err(|_| DomainError::ConcurrentScoringConflict(match_id))
    }

    /// Number of matches with a live lock entry.
    pub fn len(&self) -> usize {
        self.locks.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for MatchLocks {
    fn default() -> Self {
        Self::new(DEFAULT_LOCK_TIMEOUT)
    }
}

/// Summary of one scoring run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScoreMatchReport {
    pub match_id: Uuid,
    pub actual_winner: Option<TeamSide>,
    pub predictions_scored: usize,
    pub correct_predictions: usize,
    pub exact_scores: usize,
    pub member_totals: Vec<MemberTotal>,
}

/// Scores every prediction of a finished match and refreshes member totals.
pub struct ScoringEngine {
    matches: Arc<dyn MatchStore>,
    predictions: Arc<dyn PredictionStore>,
    config: ScoringConfig,
    locks: MatchLocks,
}

impl ScoringEngine {
    pub fn new(
        matches: Arc<dyn MatchStore>,
        predictions: Arc<dyn PredictionStore>,
        config: ScoringConfig,
        lock_timeout: Duration,
    ) -> Self {
        Self {
            matches,
            predictions,
            config,
            locks: MatchLocks::new(lock_timeout),
        }
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    /// Recomputes the outcome of every prediction on `match_id`.
    ///
    /// Safe to call any number of times: the result depends only on the
    /// final score and the stored guesses.
    pub async fn score_match(&self, match_id: Uuid) -> Result<ScoreMatchReport, DomainError> {
        let _guard = self.locks.acquire(match_id).await?;

        let m = self
            .matches
            .find_match(match_id)
            .await?
            .ok_or(DomainError::MatchNotFound(match_id))?;

        let result = m.final_result().ok_or(DomainError::MatchNotFinished {
            match_id,
            status: m.status,
        })?;

        let predictions = self.predictions.list_match_predictions(match_id).await?;
        let outcomes: Vec<ScoredPrediction> = predictions
            .iter()
            .map(|p| ScoredPrediction {
                prediction_id: p.id,
                user_id: p.user_id,
                group_id: p.group_id,
                outcome: evaluate_prediction(p, &result, &self.config),
            })
            .collect();

        let batch = ScoringBatch {
            match_id,
            scored_at: Utc::now(),
            outcomes,
        };
        let member_totals = self.predictions.apply_scoring(&batch).await?;

        let report = ScoreMatchReport {
            match_id,
            actual_winner: actual_winner(&result),
            predictions_scored: batch.outcomes.len(),
            correct_predictions: batch.outcomes.iter().filter(|o| o.outcome.is_correct).count(),
            exact_scores: batch
                .outcomes
                .iter()
                .filter(|o| o.outcome.is_exact_score)
                .count(),
            member_totals,
        };

        if report.actual_winner.is_none() {
            debug!(match_id = %match_id, "Match ended in a draw, no prediction can score");
        }
        if report.member_totals.len() < batch.touched_members().len() {
            warn!(
                match_id = %match_id,
                "Some predictions belong to users who are no longer group members"
            );
        }
        info!(
            match_id = %match_id,
            predictions = report.predictions_scored,
            correct = report.correct_predictions,
            exact = report.exact_scores,
            "Match scored"
        );

        Ok(report)
    }
}
