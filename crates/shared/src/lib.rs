//! Shared utilities and common types for the League of Prono backend.
//!
//! This crate provides common functionality used across all other crates:
//! - Boundary validation (invite codes, scores, team names)
//! - Strict parsing of loosely typed upstream fields

pub mod lenient;
pub mod validation;
