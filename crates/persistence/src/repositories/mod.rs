//! Repository implementations for database operations.
//!
//! Each repository implements the matching domain store trait.

pub mod group;
pub mod matches;
pub mod prediction;
pub mod user;

pub use group::GroupRepository;
pub use matches::MatchRepository;
pub use prediction::{advisory_lock_key, PredictionRepository};
pub use user::UserRepository;

use domain::StoreError;

/// PostgreSQL unique_violation.
const UNIQUE_VIOLATION: &str = "23505";

/// Maps a sqlx error into the storage error the domain understands.
pub(crate) fn store_error(err: sqlx::Error) -> StoreError {
    match &err {
        sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some(UNIQUE_VIOLATION) => {
            StoreError::Conflict(db_err.message().to_string())
        }
        _ => StoreError::Backend(err.to_string()),
    }
}
