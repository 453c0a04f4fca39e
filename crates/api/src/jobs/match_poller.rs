//! Periodic match refresh and scoring.

use std::collections::HashSet;
use std::sync::Arc;

use domain::models::MatchStatus;
use domain::services::{MatchService, ScoringEngine};
use domain::DomainError;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::scheduler::{Job, JobFrequency};
use crate::middleware::metrics::{record_match_scored, record_scoring_conflict};
use crate::services::MatchFeedClient;

const TRIGGER: &str = "poller";

/// Matches this process has already scored.
///
/// Starts empty, so each finished match is scored once more after a restart.
#[derive(Debug, Default)]
pub struct ScoredMatches {
    ids: Mutex<HashSet<Uuid>>,
}

impl ScoredMatches {
    pub async fn contains(&self, match_id: Uuid) -> bool {
        self.ids.lock().await.contains(&match_id)
    }

    pub async fn insert(&self, match_id: Uuid) {
        self.ids.lock().await.insert(match_id);
    }

    pub async fn len(&self) -> usize {
        self.ids.lock().await.len()
    }
}

pub struct MatchPollerJob {
    matches: Arc<MatchService>,
    scoring: Arc<ScoringEngine>,
    feed: Option<Arc<MatchFeedClient>>,
    interval_secs: u64,
    scored: ScoredMatches,
}

impl MatchPollerJob {
    pub fn new(
        matches: Arc<MatchService>,
        scoring: Arc<ScoringEngine>,
        feed: Option<Arc<MatchFeedClient>>,
        interval_secs: u64,
    ) -> Self {
        Self {
            matches,
            scoring,
            feed,
            interval_secs,
            scored: ScoredMatches::default(),
        }
    }

    pub fn scored(&self) -> &ScoredMatches {
        &self.scored
    }

    async fn refresh_open_matches(&self, feed: &MatchFeedClient) -> Result<(), String> {
        let mut open = self
            .matches
            .list_matches(Some(MatchStatus::Upcoming))
            .await
            .map_err(|e| e.to_string())?;
        open.extend(
            self.matches
                .list_matches(Some(MatchStatus::Live))
                .await
                .map_err(|e| e.to_string())?,
        );

        for m in open {
            match feed.refresh(&self.matches, m.id).await {
                Ok(transition) if transition.changed => {
                    debug!(match_id = %m.id, status = %transition.r#match.status, "Match refreshed from feed");
                }
                Ok(_) => {}
                Err(e) => warn!(match_id = %m.id, error = %e, "Match feed refresh failed"),
            }
        }
        Ok(())
    }

    /// Scores finished matches not yet in the cache. Returns the number of failures.
    async fn score_finished_matches(&self) -> Result<usize, String> {
        let finished = self
            .matches
            .list_matches(Some(MatchStatus::Finished))
            .await
            .map_err(|e| e.to_string())?;

        let mut failures = 0;
        for m in finished {
            if self.scored.contains(m.id).await {
                continue;
            }
            match self.scoring.score_match(m.id).await {
                Ok(report) => {
                    record_match_scored(TRIGGER, &report);
                    self.scored.insert(m.id).await;
                    info!(
                        match_id = %m.id,
                        predictions = report.predictions_scored,
                        "Finished match scored"
                    );
                }
                Err(DomainError::ConcurrentScoringConflict(_)) => {
                    // Someone else is scoring it; retry on the next tick.
                    record_scoring_conflict(TRIGGER);
                    warn!(match_id = %m.id, "Scoring already in progress, skipping");
                }
                Err(e) => {
                    failures += 1;
                    error!(match_id = %m.id, error = %e, "Failed to score match");
                }
            }
        }
        Ok(failures)
    }
}

#[async_trait::async_trait]
impl Job for MatchPollerJob {
    fn name(&self) -> &'static str {
        "match_poller"
    }

    fn frequency(&self) -> JobFrequency {
        JobFrequency::Seconds(self.interval_secs)
    }

    async fn execute(&self) -> Result<(), String> {
        if let Some(feed) = &self.feed {
            self.refresh_open_matches(feed).await?;
        }

        match self.score_finished_matches().await? {
            0 => Ok(()),
            n => Err(format!("{} finished match(es) could not be scored", n)),
        }
    }
}
