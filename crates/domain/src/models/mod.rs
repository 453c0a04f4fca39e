//! Domain models for League of Prono.

pub mod badge;
pub mod group;
pub mod leaderboard;
pub mod matches;
pub mod prediction;
pub mod user;

pub use group::{Group, GroupMembership};
pub use leaderboard::{Leaderboard, LeaderboardEntry, MemberScore, UserGroupStats};
pub use matches::{Match, MatchResult, MatchStatus, MatchUpdate, TeamSide};
pub use prediction::{NewPrediction, Prediction, PredictionOutcome};
pub use user::User;
