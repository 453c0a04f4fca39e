//! Client for the upstream match data service.
//!
//! The feed reports match state with loosely typed fields. Everything is
//! converted into a [`MatchUpdate`] at this boundary or rejected with the
//! offending field named.

use std::str::FromStr;
use std::time::Duration;

use domain::models::{MatchStatus, MatchUpdate};
use domain::services::{MatchService, MatchTransition};
use domain::DomainError;
use reqwest::Client;
use serde::Deserialize;
use shared::lenient::{parse_bounded_score, FieldParseError, LooseInt};
use shared::validation::MAX_SERIES_SCORE;
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use crate::config::MatchFeedConfig;

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("Match feed is disabled")]
    Disabled,

    #[error("Match feed URL not configured")]
    NotConfigured,

    #[error("Request timeout after {0}ms")]
    Timeout(u64),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Match feed returned status {0}")]
    UpstreamStatus(u16),

    #[error("Invalid `{field}` in feed payload: {reason}")]
    InvalidPayload { field: &'static str, reason: String },

    #[error(transparent)]
    Domain(#[from] DomainError),
}

impl From<FieldParseError> for FeedError {
    fn from(err: FieldParseError) -> Self {
        let field = match &err {
            FieldParseError::NotAnInteger { field, .. } | FieldParseError::OutOfRange { field, .. } => {
                *field
            }
        };
        FeedError::InvalidPayload {
            field,
            reason: err.to_string(),
        }
    }
}

/// Raw match state as the feed sends it.
#[derive(Debug, Clone, Deserialize)]
pub struct FeedMatchPayload {
    pub status: String,
    #[serde(default)]
    pub score_a: Option<LooseInt>,
    #[serde(default)]
    pub score_b: Option<LooseInt>,
}

impl FeedMatchPayload {
    /// Converts the payload into a typed update.
    ///
    /// Scores only matter for finished matches and are dropped otherwise.
    pub fn into_update(self) -> Result<MatchUpdate, FeedError> {
        let status =
            MatchStatus::from_str(&self.status).map_err(|_| FeedError::InvalidPayload {
                field: "status",
                reason: format!("unknown status {:?}", self.status),
            })?;

        if status != MatchStatus::Finished {
            return Ok(MatchUpdate::status(status));
        }

        let score_a = parse_bounded_score("score_a", self.score_a.as_ref(), MAX_SERIES_SCORE)?;
        let score_b = parse_bounded_score("score_b", self.score_b.as_ref(), MAX_SERIES_SCORE)?;
        match (score_a, score_b) {
            (Some(a), Some(b)) => Ok(MatchUpdate::finished(a, b)),
            (None, _) => Err(FeedError::InvalidPayload {
                field: "score_a",
                reason: "finished match without a final score".into(),
            }),
            (_, None) => Err(FeedError::InvalidPayload {
                field: "score_b",
                reason: "finished match without a final score".into(),
            }),
        }
    }
}

pub struct MatchFeedClient {
    client: Client,
    config: MatchFeedConfig,
}

impl MatchFeedClient {
    pub fn new(config: MatchFeedConfig) -> Result<Self, FeedError> {
        if !config.enabled {
            return Err(FeedError::Disabled);
        }
        if config.base_url.trim().is_empty() {
            return Err(FeedError::NotConfigured);
        }

        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()?;

        Ok(Self { client, config })
    }

    fn match_url(&self, match_id: Uuid) -> String {
        format!(
            "{}/matches/{}",
            self.config.base_url.trim_end_matches('/'),
            match_id
        )
    }

    /// Fetches the current state of one match.
    pub async fn fetch_match(&self, match_id: Uuid) -> Result<MatchUpdate, FeedError> {
        let url = self.match_url(match_id);
        debug!(match_id = %match_id, url = %url, "Fetching match from feed");

        let response = self.client.get(&url).send().await.map_err(|e| {
            if e.is_timeout() {
                FeedError::Timeout(self.config.timeout_ms)
            } else {
                FeedError::Http(e)
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FeedError::UpstreamStatus(status.as_u16()));
        }

        let payload: FeedMatchPayload = response.json().await?;
        payload.into_update()
    }

    /// Pulls the feed's view of a match and applies it locally.
    pub async fn refresh(
        &self,
        matches: &MatchService,
        match_id: Uuid,
    ) -> Result<MatchTransition, FeedError> {
        let update = self.fetch_match(match_id).await?;
        Ok(matches.apply_update(match_id, update).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn update_of(json: &str) -> Result<MatchUpdate, FeedError> {
        serde_json::from_str::<FeedMatchPayload>(json)
            .unwrap()
            .into_update()
    }

    fn feed_config(enabled: bool, base_url: &str) -> MatchFeedConfig {
        MatchFeedConfig {
            enabled,
            base_url: base_url.to_string(),
            timeout_ms: 1000,
        }
    }

    #[test]
    fn test_finished_with_string_scores() {
        let update = update_of(r#"{"status":"finished","score_a":"3","score_b":1}"#).unwrap();
        assert_eq!(update, MatchUpdate::finished(3, 1));
    }

    #[test]
    fn test_status_aliases() {
        let update = update_of(r#"{"status":"ongoing"}"#).unwrap();
        assert_eq!(update.status, MatchStatus::Live);
        let update = update_of(r#"{"status":"completed","score_a":2,"score_b":2}"#).unwrap();
        assert_eq!(update, MatchUpdate::finished(2, 2));
    }

    #[test]
    fn test_scores_dropped_when_not_finished() {
        let update = update_of(r#"{"status":"live","score_a":"1","score_b":"0"}"#).unwrap();
        assert_eq!(update, MatchUpdate::status(MatchStatus::Live));
    }

    #[test]
    fn test_garbage_score_names_field() {
        let err = update_of(r#"{"status":"finished","score_a":"2","score_b":"two"}"#).unwrap_err();
        assert!(matches!(err, FeedError::InvalidPayload { field: "score_b", .. }));
    }

    #[test]
    fn test_finished_without_scores_rejected() {
        let err = update_of(r#"{"status":"finished","score_a":"","score_b":null}"#).unwrap_err();
        assert!(matches!(err, FeedError::InvalidPayload { field: "score_a", .. }));
    }

    #[test]
    fn test_out_of_range_score_rejected() {
        let err = update_of(r#"{"status":"finished","score_a":-1,"score_b":0}"#).unwrap_err();
        assert!(matches!(err, FeedError::InvalidPayload { field: "score_a", .. }));
    }

    #[test]
    fn test_unknown_status_rejected() {
        let err = update_of(r#"{"status":"paused"}"#).unwrap_err();
        assert!(matches!(err, FeedError::InvalidPayload { field: "status", .. }));
    }

    #[test]
    fn test_client_requires_enabled_and_url() {
        assert!(matches!(
            MatchFeedClient::new(feed_config(false, "http://feed")),
            Err(FeedError::Disabled)
        ));
        assert!(matches!(
            MatchFeedClient::new(feed_config(true, "  ")),
            Err(FeedError::NotConfigured)
        ));
    }

    #[test]
    fn test_match_url_trims_trailing_slash() {
        let client = MatchFeedClient::new(feed_config(true, "http://feed.local/api/")).unwrap();
        let id = Uuid::nil();
        assert_eq!(
            client.match_url(id),
            format!("http://feed.local/api/matches/{}", id)
        );
    }
}
