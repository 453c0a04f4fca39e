//! Group repository for database operations.

use chrono::{DateTime, Utc};
use domain::models::group::NewGroup;
use domain::models::{Group, GroupMembership, MemberScore};
use domain::services::{GroupStore, StoreResult};
use sqlx::PgPool;
use uuid::Uuid;

use super::store_error;
use crate::entities::{GroupEntity, GroupMembershipEntity, MemberScoreEntity, UserGroupEntity};
use crate::metrics::QueryTimer;

/// Repository for groups and their memberships.
#[derive(Clone)]
pub struct GroupRepository {
    pool: PgPool,
}

impl GroupRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl GroupStore for GroupRepository {
    async fn find_group(&self, id: Uuid) -> StoreResult<Option<Group>> {
        let timer = QueryTimer::new("find_group");
        let result = sqlx::query_as::<_, GroupEntity>(
            r#"
            SELECT id, name, description, invite_code, created_by, created_at, updated_at
            FROM groups
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.finish(&result);
        Ok(result.map_err(store_error)?.map(Into::into))
    }

    async fn find_group_by_invite_code(&self, code: &str) -> StoreResult<Option<Group>> {
        let timer = QueryTimer::new("find_group_by_invite_code");
        let result = sqlx::query_as::<_, GroupEntity>(
            r#"
            SELECT id, name, description, invite_code, created_by, created_at, updated_at
            FROM groups
            WHERE invite_code = $1
            "#,
        )
        .bind(code)
        .fetch_optional(&self.pool)
        .await;
        timer.finish(&result);
        Ok(result.map_err(store_error)?.map(Into::into))
    }

    async fn invite_code_exists(&self, code: &str) -> StoreResult<bool> {
        let timer = QueryTimer::new("invite_code_exists");
        let result: Result<bool, sqlx::Error> =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM groups WHERE invite_code = $1)")
                .bind(code)
                .fetch_one(&self.pool)
                .await;
        timer.finish(&result);
        result.map_err(store_error)
    }

    async fn create_group(&self, new: &NewGroup) -> StoreResult<Group> {
        let timer = QueryTimer::new("create_group");

        // Group and creator membership are created atomically.
        let mut tx = self.pool.begin().await.map_err(store_error)?;

        let group = sqlx::query_as::<_, GroupEntity>(
            r#"
            INSERT INTO groups (id, name, description, invite_code, created_by, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $6)
            RETURNING id, name, description, invite_code, created_by, created_at, updated_at
            "#,
        )
        .bind(new.id)
        .bind(&new.name)
        .bind(&new.description)
        .bind(&new.invite_code)
        .bind(new.created_by)
        .bind(new.created_at)
        .fetch_one(&mut *tx)
        .await
        .map_err(store_error)?;

        sqlx::query(
            r#"
            INSERT INTO group_memberships (group_id, user_id, score, joined_at)
            VALUES ($1, $2, 0, $3)
            "#,
        )
        .bind(group.id)
        .bind(new.created_by)
        .bind(new.created_at)
        .execute(&mut *tx)
        .await
        .map_err(store_error)?;

        tx.commit().await.map_err(store_error)?;
        timer.record();
        Ok(group.into())
    }

    async fn find_membership(
        &self,
        group_id: Uuid,
        user_id: Uuid,
    ) -> StoreResult<Option<GroupMembership>> {
        let timer = QueryTimer::new("find_membership");
        let result = sqlx::query_as::<_, GroupMembershipEntity>(
            r#"
            SELECT group_id, user_id, score, joined_at
            FROM group_memberships
            WHERE group_id = $1 AND user_id = $2
            "#,
        )
        .bind(group_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await;
        timer.finish(&result);
        Ok(result.map_err(store_error)?.map(Into::into))
    }

    async fn add_member(
        &self,
        group_id: Uuid,
        user_id: Uuid,
        joined_at: DateTime<Utc>,
    ) -> StoreResult<GroupMembership> {
        let timer = QueryTimer::new("add_member");
        // A rejoining member starts from whatever their predictions here are already worth.
        let result = sqlx::query_as::<_, GroupMembershipEntity>(
            r#"
            INSERT INTO group_memberships (group_id, user_id, score, joined_at)
            VALUES (
                $1, $2,
                (SELECT COALESCE(SUM(points_earned), 0)::int4
                 FROM predictions WHERE group_id = $1 AND user_id = $2),
                $3
            )
            RETURNING group_id, user_id, score, joined_at
            "#,
        )
        .bind(group_id)
        .bind(user_id)
        .bind(joined_at)
        .fetch_one(&self.pool)
        .await;
        timer.finish(&result);
        Ok(result.map_err(store_error)?.into())
    }

    async fn remove_member(&self, group_id: Uuid, user_id: Uuid) -> StoreResult<bool> {
        let timer = QueryTimer::new("remove_member");
        let result = sqlx::query("DELETE FROM group_memberships WHERE group_id = $1 AND user_id = $2")
            .bind(group_id)
            .bind(user_id)
            .execute(&self.pool)
            .await;
        timer.finish(&result);
        Ok(result.map_err(store_error)?.rows_affected() > 0)
    }

    async fn list_member_ids(&self, group_id: Uuid) -> StoreResult<Vec<Uuid>> {
        let timer = QueryTimer::new("list_member_ids");
        let result: Result<Vec<Uuid>, sqlx::Error> = sqlx::query_scalar(
            r#"
            SELECT user_id
            FROM group_memberships
            WHERE group_id = $1
            ORDER BY joined_at ASC, user_id ASC
            "#,
        )
        .bind(group_id)
        .fetch_all(&self.pool)
        .await;
        timer.finish(&result);
        result.map_err(store_error)
    }

    async fn list_member_scores(&self, group_id: Uuid) -> StoreResult<Vec<MemberScore>> {
        let timer = QueryTimer::new("list_member_scores");
        let result = sqlx::query_as::<_, MemberScoreEntity>(
            r#"
            SELECT gm.user_id, u.display_name, gm.score, gm.joined_at
            FROM group_memberships gm
            JOIN users u ON u.id = gm.user_id
            WHERE gm.group_id = $1
            "#,
        )
        .bind(group_id)
        .fetch_all(&self.pool)
        .await;
        timer.finish(&result);
        Ok(result
            .map_err(store_error)?
            .into_iter()
            .map(Into::into)
            .collect())
    }

    async fn list_user_memberships(
        &self,
        user_id: Uuid,
    ) -> StoreResult<Vec<(Group, GroupMembership)>> {
        let timer = QueryTimer::new("list_user_memberships");
        let result = sqlx::query_as::<_, UserGroupEntity>(
            r#"
            SELECT g.id, g.name, g.description, g.invite_code, g.created_by, g.created_at,
                   g.updated_at, gm.user_id, gm.score, gm.joined_at
            FROM group_memberships gm
            JOIN groups g ON g.id = gm.group_id
            WHERE gm.user_id = $1
            ORDER BY gm.joined_at ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await;
        timer.finish(&result);
        Ok(result
            .map_err(store_error)?
            .into_iter()
            .map(Into::into)
            .collect())
    }

    async fn list_global_scores(&self) -> StoreResult<Vec<MemberScore>> {
        let timer = QueryTimer::new("list_global_scores");
        let result = sqlx::query_as::<_, MemberScoreEntity>(
            r#"
            SELECT gm.user_id, u.display_name,
                   SUM(gm.score)::int4 AS score,
                   MIN(gm.joined_at) AS joined_at
            FROM group_memberships gm
            JOIN users u ON u.id = gm.user_id
            GROUP BY gm.user_id, u.display_name
            "#,
        )
        .fetch_all(&self.pool)
        .await;
        timer.finish(&result);
        Ok(result
            .map_err(store_error)?
            .into_iter()
            .map(Into::into)
            .collect())
    }
}
