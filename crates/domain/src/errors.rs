//! Domain error types.

use thiserror::Error;
use uuid::Uuid;

use crate::models::MatchStatus;

/// Error returned by store implementations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    /// A uniqueness or integrity constraint rejected the write.
    #[error("store conflict: {0}")]
    Conflict(String),

    /// Any other backend failure (connection, query, decoding).
    #[error("store backend error: {0}")]
    Backend(String),
}

/// Errors surfaced by domain services to their callers.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("match {0} not found")]
    MatchNotFound(Uuid),

    #[error("match {match_id} is not finished (status: {status})")]
    MatchNotFinished { match_id: Uuid, status: MatchStatus },

    #[error("group {0} not found")]
    GroupNotFound(Uuid),

    #[error("no group uses invite code {0}")]
    InviteCodeNotFound(String),

    #[error("user {0} not found")]
    UserNotFound(Uuid),

    #[error("user {user_id} is not a member of group {group_id}")]
    NotGroupMember { user_id: Uuid, group_id: Uuid },

    #[error("user {user_id} is already a member of group {group_id}")]
    AlreadyMember { user_id: Uuid, group_id: Uuid },

    #[error("the creator of group {0} cannot leave it")]
    CreatorCannotLeave(Uuid),

    #[error("scoring of match {0} is already in progress, retry later")]
    ConcurrentScoringConflict(Uuid),

    #[error("invalid match transition from {from} to {to}")]
    InvalidTransition { from: MatchStatus, to: MatchStatus },

    #[error("predictions are closed for match {match_id} (status: {status})")]
    PredictionClosed { match_id: Uuid, status: MatchStatus },

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("could not generate a unique invite code")]
    InviteCodeExhausted,

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<validator::ValidationErrors> for DomainError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut messages: Vec<String> = errors
            .field_errors()
            .iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| {
                    let detail = match &e.message {
                        Some(msg) => msg.to_string(),
                        None => e.code.to_string(),
                    };
                    // Struct-level checks are reported under "__all__".
                    if *field == "__all__" {
                        detail
                    } else {
                        format!("{}: {}", field, detail)
                    }
                })
            })
            .collect();
        messages.sort();
        DomainError::Validation(messages.join(", "))
    }
}
