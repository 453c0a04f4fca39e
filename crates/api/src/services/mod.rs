//! External service integrations.

pub mod match_feed;

pub use match_feed::{FeedError, MatchFeedClient};
