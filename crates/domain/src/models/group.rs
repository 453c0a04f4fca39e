//! Group domain models for private prediction circles.

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use shared::validation::{INVITE_CODE_ALPHABET, INVITE_CODE_LENGTH};
use uuid::Uuid;
use validator::Validate;

/// A private group of users sharing a leaderboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Group {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub invite_code: String,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A user's membership in a group, carrying the cumulative group score.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct GroupMembership {
    pub group_id: Uuid,
    pub user_id: Uuid,
    pub score: i32,
    pub joined_at: DateTime<Utc>,
}

/// Data needed to insert a new group together with its creator's membership.
#[derive(Debug, Clone)]
pub struct NewGroup {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub invite_code: String,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Generates a random invite code of uppercase letters and digits.
pub fn generate_invite_code<R: Rng + ?Sized>(rng: &mut R) -> String {
    (0..INVITE_CODE_LENGTH)
        .map(|_| {
            let idx = rng.gen_range(0..INVITE_CODE_ALPHABET.len());
            INVITE_CODE_ALPHABET[idx] as char
        })
        .collect()
}

/// Request payload for creating a group.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct CreateGroupRequest {
    #[validate(length(
        min = 1,
        max = 100,
        message = "Name must be between 1 and 100 characters"
    ))]
    pub name: String,

    #[validate(length(max = 500, message = "Description must be at most 500 characters"))]
    pub description: Option<String>,
}

/// Request payload for joining a group by invite code.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct JoinGroupRequest {
    #[validate(length(min = 1, message = "Invite code is required"))]
    pub invite_code: String,
}

/// Response for group detail.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct GroupDetail {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub invite_code: String,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub members: Vec<Uuid>,
    pub member_count: usize,
}

impl GroupDetail {
    pub fn new(group: Group, members: Vec<Uuid>) -> Self {
        Self {
            id: group.id,
            name: group.name,
            description: group.description,
            invite_code: group.invite_code,
            created_by: group.created_by,
            created_at: group.created_at,
            member_count: members.len(),
            members,
        }
    }
}

/// Response for joining a group.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct JoinGroupResponse {
    pub group_id: Uuid,
    pub group_name: String,
    pub joined_at: DateTime<Utc>,
}

/// One of the acting user's groups, with their score in it.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct UserGroupSummary {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub invite_code: String,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub members: Vec<Uuid>,
    pub score: i32,
    pub joined_at: DateTime<Utc>,
}

impl UserGroupSummary {
    pub fn new(group: Group, membership: &GroupMembership, members: Vec<Uuid>) -> Self {
        Self {
            id: group.id,
            name: group.name,
            description: group.description,
            invite_code: group.invite_code,
            created_by: group.created_by,
            created_at: group.created_at,
            members,
            score: membership.score,
            joined_at: membership.joined_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ListUserGroupsResponse {
    pub data: Vec<UserGroupSummary>,
    pub count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_generated_invite_code_is_valid() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            let code = generate_invite_code(&mut rng);
            assert_eq!(code.len(), INVITE_CODE_LENGTH);
            assert!(shared::validation::validate_invite_code(&code).is_ok());
        }
    }

    #[test]
    fn test_generated_invite_codes_differ() {
        let mut rng = StdRng::seed_from_u64(42);
        let a = generate_invite_code(&mut rng);
        let b = generate_invite_code(&mut rng);
        assert_ne!(a, b);
    }

    #[test]
    fn test_create_group_request_validation() {
        let ok = CreateGroupRequest {
            name: "Friday LCK".into(),
            description: None,
        };
        assert!(ok.validate().is_ok());

        let empty = CreateGroupRequest {
            name: String::new(),
            description: None,
        };
        assert!(empty.validate().is_err());

        let long_desc = CreateGroupRequest {
            name: "ok".into(),
            description: Some("x".repeat(501)),
        };
        assert!(long_desc.validate().is_err());
    }

    #[test]
    fn test_group_detail_counts_members() {
        let now = Utc::now();
        let group = Group {
            id: Uuid::new_v4(),
            name: "Worlds watch party".into(),
            description: None,
            invite_code: "ABCDE12345".into(),
            created_by: Uuid::new_v4(),
            created_at: now,
            updated_at: now,
        };
        let detail = GroupDetail::new(group, vec![Uuid::new_v4(), Uuid::new_v4()]);
        assert_eq!(detail.member_count, 2);
    }
}
