//! Group lifecycle: create, join by invite code, leave, view.

use chrono::Utc;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

use super::store::{GroupStore, UserStore};
use crate::errors::{DomainError, StoreError};
use crate::models::group::{
    generate_invite_code, CreateGroupRequest, GroupDetail, JoinGroupRequest, JoinGroupResponse,
    NewGroup, UserGroupSummary,
};
use crate::models::Group;

/// Attempts at drawing an unused invite code before giving up.
pub const MAX_INVITE_CODE_ATTEMPTS: usize = 100;

pub struct GroupService {
    groups: Arc<dyn GroupStore>,
    users: Arc<dyn UserStore>,
}

impl GroupService {
    pub fn new(groups: Arc<dyn GroupStore>, users: Arc<dyn UserStore>) -> Self {
        Self { groups, users }
    }

    async fn generate_unique_code(&self) -> Result<String, DomainError> {
        for _ in 0..MAX_INVITE_CODE_ATTEMPTS {
            let code = generate_invite_code(&mut rand::thread_rng());
            if !self.groups.invite_code_exists(&code).await? {
                return Ok(code);
            }
        }
        Err(DomainError::InviteCodeExhausted)
    }

    /// Creates a group owned by `creator`, who becomes its first member.
    pub async fn create_group(
        &self,
        creator: Uuid,
        request: CreateGroupRequest,
    ) -> Result<Group, DomainError> {
        request.validate()?;
        self.users
            .find_user(creator)
            .await?
            .ok_or(DomainError::UserNotFound(creator))?;

        // The unique index is the final arbiter; a lost race just draws again.
        for _ in 0..MAX_INVITE_CODE_ATTEMPTS {
            let new = NewGroup {
                id: Uuid::new_v4(),
                name: request.name.trim().to_string(),
                description: request.description.clone(),
                invite_code: self.generate_unique_code().await?,
                created_by: creator,
                created_at: Utc::now(),
            };
            match self.groups.create_group(&new).await {
                Ok(group) => {
                    info!(group_id = %group.id, created_by = %creator, "Group created");
                    return Ok(group);
                }
                Err(StoreError::Conflict(reason)) => {
                    warn!(reason = %reason, "Invite code collided, retrying");
                }
                Err(e) => return Err(e.into()),
            }
        }
        Err(DomainError::InviteCodeExhausted)
    }

    pub async fn join_group(
        &self,
        user_id: Uuid,
        request: JoinGroupRequest,
    ) -> Result<JoinGroupResponse, DomainError> {
        request.validate()?;
        self.users
            .find_user(user_id)
            .await?
            .ok_or(DomainError::UserNotFound(user_id))?;

        let code = shared::validation::normalize_invite_code(&request.invite_code);
        let group = self
            .groups
            .find_group_by_invite_code(&code)
            .await?
            .ok_or_else(|| DomainError::InviteCodeNotFound(code.clone()))?;

        if self.groups.find_membership(group.id, user_id).await?.is_some() {
            return Err(DomainError::AlreadyMember {
                user_id,
                group_id: group.id,
            });
        }

        let membership = match self.groups.add_member(group.id, user_id, Utc::now()).await {
            Ok(m) => m,
            Err(StoreError::Conflict(_)) => {
                return Err(DomainError::AlreadyMember {
                    user_id,
                    group_id: group.id,
                })
            }
            Err(e) => return Err(e.into()),
        };

        info!(group_id = %group.id, user_id = %user_id, "User joined group");
        Ok(JoinGroupResponse {
            group_id: group.id,
            group_name: group.name,
            joined_at: membership.joined_at,
        })
    }

    pub async fn leave_group(&self, user_id: Uuid, group_id: Uuid) -> Result<(), DomainError> {
        let group = self
            .groups
            .find_group(group_id)
            .await?
            .ok_or(DomainError::GroupNotFound(group_id))?;

        if group.created_by == user_id {
            return Err(DomainError::CreatorCannotLeave(group_id));
        }
        if !self.groups.remove_member(group_id, user_id).await? {
            return Err(DomainError::NotGroupMember { user_id, group_id });
        }

        info!(group_id = %group_id, user_id = %user_id, "User left group");
        Ok(())
    }

    /// Group detail with member ids, for members only.
    pub async fn get_group(&self, user_id: Uuid, group_id: Uuid) -> Result<GroupDetail, DomainError> {
        let group = self
            .groups
            .find_group(group_id)
            .await?
            .ok_or(DomainError::GroupNotFound(group_id))?;
        self.groups
            .find_membership(group_id, user_id)
            .await?
            .ok_or(DomainError::NotGroupMember { user_id, group_id })?;

        let members = self.groups.list_member_ids(group_id).await?;
        Ok(GroupDetail::new(group, members))
    }

    /// The user's groups in join order, each with the user's score there.
    pub async fn list_user_groups(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<UserGroupSummary>, DomainError> {
        self.users
            .find_user(user_id)
            .await?
            .ok_or(DomainError::UserNotFound(user_id))?;

        let memberships = self.groups.list_user_memberships(user_id).await?;
        let mut summaries = Vec::with_capacity(memberships.len());
        for (group, membership) in memberships {
            let members = self.groups.list_member_ids(group.id).await?;
            summaries.push(UserGroupSummary::new(group, &membership, members));
        }
        Ok(summaries)
    }
}
