//! Domain services for League of Prono.
//!
//! Services contain business logic that operates on domain models.

pub mod badges;
pub mod groups;
pub mod leaderboard;
pub mod matches;
pub mod memory_store;
pub mod predictions;
pub mod scoring;
pub mod scoring_engine;
pub mod simulation;
pub mod store;

pub use badges::BadgeService;
pub use groups::GroupService;
pub use leaderboard::{percent_rounded, rank_members, LeaderboardService};
pub use matches::{MatchService, MatchTransition};
pub use memory_store::InMemoryStore;
pub use predictions::{PredictionPolicy, PredictionService};
pub use scoring::{evaluate_prediction, ScoringConfig};
pub use scoring_engine::{MatchLocks, ScoreMatchReport, ScoringEngine};
pub use simulation::MatchSimulator;
pub use store::{
    GroupStore, MatchStore, MemberTotal, PredictionStore, PredictionWrite, ScoredPrediction,
    ScoringBatch,
    StoreResult, UserStore,
};
