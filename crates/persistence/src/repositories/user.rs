//! User repository for database operations.

use domain::models::User;
use domain::services::{StoreResult, UserStore};
use sqlx::PgPool;
use uuid::Uuid;

use super::store_error;
use crate::entities::UserEntity;
use crate::metrics::QueryTimer;

/// Read access to users registered by the web tier.
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl UserStore for UserRepository {
    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        let timer = QueryTimer::new("find_user");
        let result = sqlx::query_as::<_, UserEntity>(
            r#"
            SELECT id, display_name, email
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.finish(&result);
        Ok(result.map_err(store_error)?.map(Into::into))
    }
}
