//! Database entity definitions.
//!
//! Entities are direct mappings to database rows.

pub mod group;
pub mod matches;
pub mod prediction;
pub mod user;

pub use group::{GroupEntity, GroupMembershipEntity, MemberScoreEntity, UserGroupEntity};
pub use matches::{MatchEntity, MatchStatusDb};
pub use prediction::{MemberTotalEntity, PredictionEntity, TeamSideDb};
pub use user::UserEntity;
