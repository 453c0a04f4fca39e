//! Persistence layer for the League of Prono backend.
//!
//! This crate contains:
//! - Database connection management
//! - SQL migrations
//! - Entity definitions (database row mappings)
//! - Repository implementations of the domain store traits

pub mod db;
pub mod entities;
pub mod metrics;
pub mod repositories;
