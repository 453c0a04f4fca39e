//! HTTP route handlers.

pub mod groups;
pub mod health;
pub mod leaderboard;
pub mod matches;
pub mod predictions;
pub mod users;
