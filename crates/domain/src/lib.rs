//! Domain layer for the League of Prono backend.
//!
//! This crate contains:
//! - Domain models (Match, Group, Prediction, User, leaderboard views)
//! - Store traits the persistence layer implements, plus an in-memory store
//! - Business logic services (scoring engine, leaderboard, predictions, groups)
//! - Domain error types

pub mod errors;
pub mod models;
pub mod services;

pub use errors::{DomainError, StoreError};
