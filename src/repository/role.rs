//! Role assignment repository

use crate::domain::RoleAssignment;
use crate::error::Result;
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RoleRepository: Send + Sync {
    /// All assignments held by a user, ordered by role kind ascending
    async fn find_by_user(&self, user_id: Uuid) -> Result<Vec<RoleAssignment>>;
}

pub struct RoleRepositoryImpl {
    pool: PgPool,
}

impl RoleRepositoryImpl {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RoleRepository for RoleRepositoryImpl {
    async fn find_by_user(&self, user_id: Uuid) -> Result<Vec<RoleAssignment>> {
        let roles = sqlx::query_as::<_, RoleAssignment>(
            r#"
            SELECT user_id, tenant_id, role, granted_at
            FROM user_roles
            WHERE user_id = $1
            ORDER BY role ASC, granted_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(roles)
    }
}
