//! User domain model.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A registered player. Accounts are created by the web tier; this service only reads them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct User {
    pub id: Uuid,
    pub display_name: String,
    pub email: String,
}
