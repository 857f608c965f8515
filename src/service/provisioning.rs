//! Custom domain provisioning lifecycle
//!
//! `pending -> dns_pending -> active`, with `failed` reachable from either
//! non-terminal state. Only `attempt_completion` moves a purchase to
//! `active`, and only after DNS points at the platform and the host has been
//! attached to the purchasing tenant.

use crate::domain::{
    normalize_host, CompletionOutcome, CreateDomainPurchaseInput, DomainPurchase, DomainStatus,
    FailDomainInput, META_FAILED_AT, META_FAILURE_REASON,
};
use crate::error::{AppError, Result};
use crate::repository::{DomainPurchaseRepository, HostRepository};
use crate::service::dns::DnsChecker;
use chrono::Utc;
use metrics::counter;
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;
use validator::Validate;

pub struct DomainProvisioningService<D, H, C>
where
    D: DomainPurchaseRepository,
    H: HostRepository,
    C: DnsChecker,
{
    domain_repo: Arc<D>,
    host_repo: Arc<H>,
    dns: Arc<C>,
}

impl<D, H, C> DomainProvisioningService<D, H, C>
where
    D: DomainPurchaseRepository,
    H: HostRepository,
    C: DnsChecker,
{
    pub fn new(domain_repo: Arc<D>, host_repo: Arc<H>, dns: Arc<C>) -> Self {
        Self {
            domain_repo,
            host_repo,
            dns,
        }
    }

    /// Record a new purchase in `pending`
    pub async fn create(&self, mut input: CreateDomainPurchaseInput) -> Result<DomainPurchase> {
        input.domain = normalize_host(&input.domain);
        input.validate()?;

        if let Some(owner) = self.host_repo.find_by_host(&input.domain).await? {
            if owner.tenant_id != input.tenant_id {
                return Err(AppError::Conflict(format!(
                    "Domain '{}' is already in use",
                    input.domain
                )));
            }
        }

        let purchase = self.domain_repo.create(&input).await?;
        info!(
            purchase_id = %purchase.id,
            tenant_id = %purchase.tenant_id,
            domain = %purchase.domain,
            "Domain purchase recorded"
        );
        Ok(purchase)
    }

    pub async fn get(&self, id: Uuid) -> Result<DomainPurchase> {
        self.domain_repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Domain purchase {} not found", id)))
    }

    /// Registrar confirmed the purchase; start waiting on DNS
    pub async fn mark_registered(&self, id: Uuid) -> Result<DomainPurchase> {
        if !self
            .domain_repo
            .transition_status(id, DomainStatus::Pending, DomainStatus::DnsPending)
            .await?
        {
            let current = self.get(id).await?;
            return Err(AppError::Conflict(format!(
                "Domain purchase {} is {}, expected pending",
                id, current.status
            )));
        }

        info!(purchase_id = %id, "Domain registered, awaiting DNS");
        self.get(id).await
    }

    /// Try to finish provisioning.
    ///
    /// Safe to call repeatedly: an already active purchase reports success
    /// without touching anything, and "DNS not there yet" is a plain `false`.
    pub async fn attempt_completion(&self, id: Uuid) -> Result<CompletionOutcome> {
        let purchase = self.get(id).await?;

        match purchase.status {
            DomainStatus::Active => return Ok(CompletionOutcome::succeeded()),
            DomainStatus::Pending | DomainStatus::Failed => {
                debug!(purchase_id = %id, status = %purchase.status, "Purchase not awaiting DNS");
                return Ok(CompletionOutcome::not_yet());
            }
            DomainStatus::DnsPending => {}
        }

        let host = normalize_host(&purchase.domain);
        if !self.dns.is_propagated(&host).await {
            debug!(purchase_id = %id, domain = %host, "DNS not propagated yet");
            return Ok(CompletionOutcome::not_yet());
        }

        if let Some(owner) = self.host_repo.find_by_host(&host).await? {
            if owner.tenant_id != purchase.tenant_id {
                return Err(AppError::Conflict(format!(
                    "Host '{}' is already attached to another tenant",
                    host
                )));
            }
        }

        // Host first: a crash between the two writes leaves the purchase in
        // dns_pending and the next attempt re-adds the host as a no-op.
        self.host_repo.add_host(purchase.tenant_id, &host).await?;

        if !self
            .domain_repo
            .transition_status(id, DomainStatus::DnsPending, DomainStatus::Active)
            .await?
        {
            let current = self.get(id).await?;
            debug!(purchase_id = %id, status = %current.status, "Purchase moved concurrently");
            return Ok(CompletionOutcome {
                success: current.status == DomainStatus::Active,
            });
        }

        counter!("shopfront_domains_activated_total").increment(1);
        info!(
            purchase_id = %id,
            tenant_id = %purchase.tenant_id,
            domain = %host,
            "Custom domain activated"
        );
        Ok(CompletionOutcome::succeeded())
    }

    /// Abandon a purchase that has not gone live
    pub async fn mark_failed(&self, id: Uuid, input: FailDomainInput) -> Result<DomainPurchase> {
        input.validate()?;

        let purchase = self.get(id).await?;
        if purchase.status.is_terminal() {
            return Err(AppError::Conflict(format!(
                "Domain purchase {} is already {}",
                id, purchase.status
            )));
        }

        if !self
            .domain_repo
            .transition_status(id, purchase.status, DomainStatus::Failed)
            .await?
        {
            return Err(AppError::Conflict(format!(
                "Domain purchase {} changed state concurrently",
                id
            )));
        }

        let mut patch = Map::new();
        patch.insert(
            META_FAILED_AT.to_string(),
            Value::String(Utc::now().to_rfc3339()),
        );
        if let Some(reason) = input.reason {
            patch.insert(META_FAILURE_REASON.to_string(), Value::String(reason));
        }
        self.domain_repo.merge_metadata(id, patch).await?;

        info!(purchase_id = %id, "Domain purchase marked failed");
        self.get(id).await
    }
}
