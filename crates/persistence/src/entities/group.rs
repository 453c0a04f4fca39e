//! Group entity (database row mapping).

use chrono::{DateTime, Utc};
use domain::models::{Group, GroupMembership, MemberScore};
use sqlx::FromRow;
use uuid::Uuid;

/// Database row mapping for the groups table.
#[derive(Debug, Clone, FromRow)]
pub struct GroupEntity {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub invite_code: String,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<GroupEntity> for Group {
    fn from(entity: GroupEntity) -> Self {
        Self {
            id: entity.id,
            name: entity.name,
            description: entity.description,
            invite_code: entity.invite_code,
            created_by: entity.created_by,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}

/// Database row mapping for the group_memberships table.
#[derive(Debug, Clone, FromRow)]
pub struct GroupMembershipEntity {
    pub group_id: Uuid,
    pub user_id: Uuid,
    pub score: i32,
    pub joined_at: DateTime<Utc>,
}

impl From<GroupMembershipEntity> for GroupMembership {
    fn from(entity: GroupMembershipEntity) -> Self {
        Self {
            group_id: entity.group_id,
            user_id: entity.user_id,
            score: entity.score,
            joined_at: entity.joined_at,
        }
    }
}

/// Membership joined with the user's display name.
#[derive(Debug, Clone, FromRow)]
pub struct MemberScoreEntity {
    pub user_id: Uuid,
    pub display_name: String,
    pub score: i32,
    pub joined_at: DateTime<Utc>,
}

impl From<MemberScoreEntity> for MemberScore {
    fn from(entity: MemberScoreEntity) -> Self {
        Self {
            user_id: entity.user_id,
            display_name: entity.display_name,
            score: entity.score,
            joined_at: entity.joined_at,
        }
    }
}

/// Group joined with one user's membership in it.
#[derive(Debug, Clone, FromRow)]
pub struct UserGroupEntity {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub invite_code: String,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub user_id: Uuid,
    pub score: i32,
    pub joined_at: DateTime<Utc>,
}

impl From<UserGroupEntity> for (Group, GroupMembership) {
    fn from(entity: UserGroupEntity) -> Self {
        let membership = GroupMembership {
            group_id: entity.id,
            user_id: entity.user_id,
            score: entity.score,
            joined_at: entity.joined_at,
        };
        let group = Group {
            id: entity.id,
            name: entity.name,
            description: entity.description,
            invite_code: entity.invite_code,
            created_by: entity.created_by,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        };
        (group, membership)
    }
}
