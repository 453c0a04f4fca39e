//! Plays simulated matches one point per tick and scores them at the end.

use std::sync::Arc;

use chrono::Utc;
use domain::models::{MatchResult, MatchStatus, MatchUpdate};
use domain::services::{MatchService, MatchSimulator, ScoringEngine};
use domain::DomainError;
use rand::rngs::StdRng;
use tokio::sync::Mutex;
use tracing::{info, warn};
use uuid::Uuid;

use super::scheduler::{Job, JobFrequency};
use crate::middleware::metrics::{record_match_scored, record_scoring_conflict};

const TRIGGER: &str = "simulation";

/// The match being played and its running tally.
///
/// The tally lives here rather than in the match row, so a stored match only
/// ever carries a score once it is finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LiveTally {
    pub match_id: Uuid,
    pub tally: MatchResult,
}

struct SimulationState {
    current: Option<LiveTally>,
    rng: StdRng,
}

pub struct MatchSimulationJob {
    matches: Arc<MatchService>,
    scoring: Arc<ScoringEngine>,
    simulator: MatchSimulator,
    interval_secs: u64,
    state: Mutex<SimulationState>,
}

impl MatchSimulationJob {
    pub fn new(
        matches: Arc<MatchService>,
        scoring: Arc<ScoringEngine>,
        simulator: MatchSimulator,
        interval_secs: u64,
        rng: StdRng,
    ) -> Self {
        Self {
            matches,
            scoring,
            simulator,
            interval_secs,
            state: Mutex::new(SimulationState { current: None, rng }),
        }
    }

    pub async fn current(&self) -> Option<LiveTally> {
        self.state.lock().await.current
    }

    /// Picks the match to play: one already live, else the earliest upcoming,
    /// else a freshly created one. The pick is moved to live.
    async fn start_match(&self, rng: &mut StdRng) -> Result<Uuid, DomainError> {
        if let Some(live) = self
            .matches
            .list_matches(Some(MatchStatus::Live))
            .await?
            .into_iter()
            .next()
        {
            return Ok(live.id);
        }

        let match_id = match self
            .matches
            .list_matches(Some(MatchStatus::Upcoming))
            .await?
            .into_iter()
            .next()
        {
            Some(upcoming) => upcoming.id,
            None => {
                let request = self.simulator.random_match(rng, Utc::now());
                self.matches.create_match(request).await?.id
            }
        };

        self.matches
            .apply_update(match_id, MatchUpdate::status(MatchStatus::Live))
            .await?;
        info!(match_id = %match_id, "Simulated match started");
        Ok(match_id)
    }

    async fn finish_match(&self, live: LiveTally) -> Result<(), DomainError> {
        let final_score = MatchUpdate::finished(live.tally.score_a, live.tally.score_b);
        self.matches.apply_update(live.match_id, final_score).await?;
        info!(
            match_id = %live.match_id,
            score_a = live.tally.score_a,
            score_b = live.tally.score_b,
            "Simulated match finished"
        );

        match self.scoring.score_match(live.match_id).await {
            Ok(report) => {
                record_match_scored(TRIGGER, &report);
                Ok(())
            }
            Err(DomainError::ConcurrentScoringConflict(id)) => {
                // The poller picks it up on its next pass.
                record_scoring_conflict(TRIGGER);
                warn!(match_id = %id, "Scoring already in progress, leaving to poller");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    async fn tick(&self) -> Result<(), DomainError> {
        let mut state = self.state.lock().await;
        let SimulationState { current, rng } = &mut *state;

        let mut live = match *current {
            Some(live) => live,
            None => {
                let match_id = self.start_match(rng).await?;
                *current = Some(LiveTally {
                    match_id,
                    tally: MatchResult::default(),
                });
                return Ok(());
            }
        };

        // The match may have been finished or cancelled through the API meanwhile.
        let stored = self.matches.get_match(live.match_id).await?;
        if stored.status != MatchStatus::Live {
            info!(match_id = %live.match_id, status = %stored.status, "Simulated match ended elsewhere");
            *current = None;
            return Ok(());
        }

        if self.simulator.next_point(&mut live.tally, rng) {
            *current = None;
            self.finish_match(live).await
        } else {
            *current = Some(live);
            Ok(())
        }
    }
}

#[async_trait::async_trait]
impl Job for MatchSimulationJob {
    fn name(&self) -> &'static str {
        "match_simulation"
    }

    fn frequency(&self) -> JobFrequency {
        JobFrequency::Seconds(self.interval_secs)
    }

    async fn execute(&self) -> Result<(), String> {
        self.tick().await.map_err(|e| e.to_string())
    }
}
