//! Host registry repository

use crate::domain::HostMapping;
use crate::error::{AppError, Result};
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait HostRepository: Send + Sync {
    /// Mapping whose primary host equals `host` or whose extra hosts contain it
    async fn find_by_host(&self, host: &str) -> Result<Option<HostMapping>>;
    /// Attach `host` to the tenant: primary host for a new mapping, extra host otherwise.
    /// Attaching a host the tenant already serves is a no-op.
    async fn add_host(&self, tenant_id: Uuid, host: &str) -> Result<HostMapping>;
}

pub struct HostRepositoryImpl {
    pool: PgPool,
}

impl HostRepositoryImpl {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl HostRepository for HostRepositoryImpl {
    async fn find_by_host(&self, host: &str) -> Result<Option<HostMapping>> {
        let mapping = sqlx::query_as::<_, HostMapping>(
            r#"
            SELECT tenant_id, primary_host, extra_hosts
            FROM tenant_hosts
            WHERE primary_host = $1 OR $1 = ANY(extra_hosts)
            LIMIT 1
            "#,
        )
        .bind(host)
        .fetch_optional(&self.pool)
        .await?;

        Ok(mapping)
    }

    async fn add_host(&self, tenant_id: Uuid, host: &str) -> Result<HostMapping> {
        let mapping = sqlx::query_as::<_, HostMapping>(
            r#"
            INSERT INTO tenant_hosts (tenant_id, primary_host, extra_hosts, created_at, updated_at)
            VALUES ($1, $2, '{}', NOW(), NOW())
            ON CONFLICT (tenant_id) DO UPDATE
            SET extra_hosts = CASE
                    WHEN tenant_hosts.primary_host = $2 OR $2 = ANY(tenant_hosts.extra_hosts)
                        THEN tenant_hosts.extra_hosts
                    ELSE array_append(tenant_hosts.extra_hosts, $2)
                END,
                updated_at = NOW()
            RETURNING tenant_id, primary_host, extra_hosts
            "#,
        )
        .bind(tenant_id)
        .bind(host)
        .fetch_optional(&self.pool)
        .await?;

        mapping.ok_or_else(|| {
            AppError::Internal(anyhow::anyhow!("Failed to register host {}", host))
        })
    }
}
