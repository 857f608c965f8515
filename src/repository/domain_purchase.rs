//! Domain purchase repository

use crate::domain::{CreateDomainPurchaseInput, DomainPurchase, DomainStatus};
use crate::error::{AppError, Result};
use async_trait::async_trait;
use serde_json::{Map, Value};
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DomainPurchaseRepository: Send + Sync {
    async fn create(&self, input: &CreateDomainPurchaseInput) -> Result<DomainPurchase>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<DomainPurchase>>;
    /// Purchases waiting on DNS with fewer than `max_attempts` checks
    async fn list_retry_candidates(&self, max_attempts: i32) -> Result<Vec<DomainPurchase>>;
    /// Move `id` from `from` to `to`. Returns false when the purchase was not in `from`.
    async fn transition_status(&self, id: Uuid, from: DomainStatus, to: DomainStatus)
        -> Result<bool>;
    /// Add one to the check counter and merge `patch` into metadata. Returns the new count.
    async fn record_check_attempt(&self, id: Uuid, patch: Map<String, Value>) -> Result<i32>;
    /// Merge `patch` into metadata, keeping unrelated keys
    async fn merge_metadata(&self, id: Uuid, patch: Map<String, Value>) -> Result<()>;
}

pub struct DomainPurchaseRepositoryImpl {
    pool: PgPool,
}

impl DomainPurchaseRepositoryImpl {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DomainPurchaseRepository for DomainPurchaseRepositoryImpl {
    async fn create(&self, input: &CreateDomainPurchaseInput) -> Result<DomainPurchase> {
        let id = Uuid::new_v4();

        sqlx::query(
            r#"
            INSERT INTO domain_purchases
                (id, tenant_id, domain, status, dns_check_attempts, metadata, created_at, updated_at)
            VALUES ($1, $2, $3, 'pending', 0, '{}'::jsonb, NOW(), NOW())
            "#,
        )
        .bind(id)
        .bind(input.tenant_id)
        .bind(&input.domain)
        .execute(&self.pool)
        .await?;

        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to create domain purchase")))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<DomainPurchase>> {
        let purchase = sqlx::query_as::<_, DomainPurchase>(
            r#"
            SELECT id, tenant_id, domain, status, dns_check_attempts, metadata, created_at, updated_at
            FROM domain_purchases
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(purchase)
    }

    async fn list_retry_candidates(&self, max_attempts: i32) -> Result<Vec<DomainPurchase>> {
        let purchases = sqlx::query_as::<_, DomainPurchase>(
            r#"
            SELECT id, tenant_id, domain, status, dns_check_attempts, metadata, created_at, updated_at
            FROM domain_purchases
            WHERE status = 'dns_pending' AND dns_check_attempts < $1
            "#,
        )
        .bind(max_attempts)
        .fetch_all(&self.pool)
        .await?;

        Ok(purchases)
    }

    async fn transition_status(
        &self,
        id: Uuid,
        from: DomainStatus,
        to: DomainStatus,
    ) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE domain_purchases
            SET status = $3, updated_at = NOW()
            WHERE id = $1 AND status = $2
            "#,
        )
        .bind(id)
        .bind(from)
        .bind(to)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn record_check_attempt(&self, id: Uuid, patch: Map<String, Value>) -> Result<i32> {
        let row: Option<(i32,)> = sqlx::query_as(
            r#"
            UPDATE domain_purchases
            SET dns_check_attempts = dns_check_attempts + 1,
                metadata = COALESCE(metadata, '{}'::jsonb) || $2,
                updated_at = NOW()
            WHERE id = $1
            RETURNING dns_check_attempts
            "#,
        )
        .bind(id)
        .bind(Json(&patch))
        .fetch_optional(&self.pool)
        .await?;

        row.map(|(attempts,)| attempts)
            .ok_or_else(|| AppError::NotFound(format!("Domain purchase {} not found", id)))
    }

    async fn merge_metadata(&self, id: Uuid, patch: Map<String, Value>) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE domain_purchases
            SET metadata = COALESCE(metadata, '{}'::jsonb) || $2, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(Json(&patch))
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "Domain purchase {} not found",
                id
            )));
        }

        Ok(())
    }
}
