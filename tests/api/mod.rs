//! API integration tests infrastructure
//!
//! In-memory repositories and a scripted DNS checker so handlers and
//! services run without a database or network.

pub mod http;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::{Map, Value};
use shopfront_core::config::JwtConfig;
use shopfront_core::domain::{
    CreateDomainPurchaseInput, DomainPurchase, DomainStatus, HostMapping, RoleAssignment,
};
use shopfront_core::error::{AppError, Result};
use shopfront_core::jwt::JwtManager;
use shopfront_core::repository::{DomainPurchaseRepository, HostRepository, RoleRepository};
use shopfront_core::service::DnsChecker;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;
use uuid::Uuid;

// ============================================================================
// Test Configuration
// ============================================================================

pub fn test_jwt_config() -> JwtConfig {
    JwtConfig {
        secret: "test-secret-key-for-api-testing-purposes".to_string(),
        issuer: "https://shopfront.test/auth/v1".to_string(),
        audience: "authenticated".to_string(),
    }
}

pub fn create_test_jwt_manager() -> JwtManager {
    JwtManager::new(test_jwt_config())
}

/// Access token for `user_id`, optionally carrying a profile metadata tenant
pub fn create_test_token(user_id: Uuid, metadata_tenant: Option<Uuid>) -> String {
    create_test_jwt_manager()
        .create_access_token(user_id, Some("owner@example.com"), metadata_tenant)
        .expect("Failed to create test access token")
}

fn store_unavailable() -> AppError {
    AppError::Internal(anyhow::anyhow!("store unavailable"))
}

// ============================================================================
// Test Repository Implementations
// ============================================================================

#[derive(Default)]
pub struct TestRoleRepository {
    assignments: RwLock<Vec<RoleAssignment>>,
    fail: AtomicBool,
}

impl TestRoleRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_assignment(&self, assignment: RoleAssignment) {
        self.assignments.write().await.push(assignment);
    }

    /// Make every lookup fail
    pub fn set_unavailable(&self, unavailable: bool) {
        self.fail.store(unavailable, Ordering::SeqCst);
    }
}

#[async_trait]
impl RoleRepository for TestRoleRepository {
    async fn find_by_user(&self, user_id: Uuid) -> Result<Vec<RoleAssignment>> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(store_unavailable());
        }
        let assignments = self.assignments.read().await;
        Ok(assignments
            .iter()
            .filter(|a| a.user_id == user_id)
            .cloned()
            .collect())
    }
}

#[derive(Default)]
pub struct TestHostRepository {
    mappings: RwLock<Vec<HostMapping>>,
    fail: AtomicBool,
}

impl TestHostRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_mapping(&self, mapping: HostMapping) {
        self.mappings.write().await.push(mapping);
    }

    pub async fn mappings(&self) -> Vec<HostMapping> {
        self.mappings.read().await.clone()
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.fail.store(unavailable, Ordering::SeqCst);
    }
}

#[async_trait]
impl HostRepository for TestHostRepository {
    async fn find_by_host(&self, host: &str) -> Result<Option<HostMapping>> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(store_unavailable());
        }
        let mappings = self.mappings.read().await;
        Ok(mappings.iter().find(|m| m.serves(host)).cloned())
    }

    async fn add_host(&self, tenant_id: Uuid, host: &str) -> Result<HostMapping> {
        let mut mappings = self.mappings.write().await;
        if mappings
            .iter()
            .any(|m| m.tenant_id != tenant_id && m.serves(host))
        {
            return Err(AppError::Conflict(format!("Host '{}' already taken", host)));
        }

        match mappings.iter_mut().find(|m| m.tenant_id == tenant_id) {
            Some(mapping) => {
                if !mapping.serves(host) {
                    mapping.extra_hosts.push(host.to_string());
                }
                Ok(mapping.clone())
            }
            None => {
                let mapping = HostMapping::new(tenant_id, host);
                mappings.push(mapping.clone());
                Ok(mapping)
            }
        }
    }
}

#[derive(Default)]
pub struct TestDomainPurchaseRepository {
    purchases: RwLock<Vec<DomainPurchase>>,
    fail_candidates: AtomicBool,
}

impl TestDomainPurchaseRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_purchase(&self, purchase: DomainPurchase) {
        self.purchases.write().await.push(purchase);
    }

    pub async fn get(&self, id: Uuid) -> Option<DomainPurchase> {
        self.purchases
            .read()
            .await
            .iter()
            .find(|p| p.id == id)
            .cloned()
    }

    /// Make the candidate query fail
    pub fn set_candidates_unavailable(&self, unavailable: bool) {
        self.fail_candidates.store(unavailable, Ordering::SeqCst);
    }
}

#[async_trait]
impl DomainPurchaseRepository for TestDomainPurchaseRepository {
    async fn create(&self, input: &CreateDomainPurchaseInput) -> Result<DomainPurchase> {
        let purchase = DomainPurchase {
            tenant_id: input.tenant_id,
            domain: input.domain.clone(),
            ..Default::default()
        };
        self.purchases.write().await.push(purchase.clone());
        Ok(purchase)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<DomainPurchase>> {
        Ok(self.get(id).await)
    }

    async fn list_retry_candidates(&self, max_attempts: i32) -> Result<Vec<DomainPurchase>> {
        if self.fail_candidates.load(Ordering::SeqCst) {
            return Err(store_unavailable());
        }
        let purchases = self.purchases.read().await;
        Ok(purchases
            .iter()
            .filter(|p| p.status == DomainStatus::DnsPending && p.dns_check_attempts < max_attempts)
            .cloned()
            .collect())
    }

    async fn transition_status(
        &self,
        id: Uuid,
        from: DomainStatus,
        to: DomainStatus,
    ) -> Result<bool> {
        let mut purchases = self.purchases.write().await;
        match purchases.iter_mut().find(|p| p.id == id && p.status == from) {
            Some(purchase) => {
                purchase.status = to;
                purchase.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn record_check_attempt(&self, id: Uuid, patch: Map<String, Value>) -> Result<i32> {
        let mut purchases = self.purchases.write().await;
        let purchase = purchases
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| AppError::NotFound(format!("Domain purchase {} not found", id)))?;
        purchase.dns_check_attempts += 1;
        purchase.metadata.extend(patch);
        Ok(purchase.dns_check_attempts)
    }

    async fn merge_metadata(&self, id: Uuid, patch: Map<String, Value>) -> Result<()> {
        let mut purchases = self.purchases.write().await;
        let purchase = purchases
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| AppError::NotFound(format!("Domain purchase {} not found", id)))?;
        purchase.metadata.extend(patch);
        Ok(())
    }
}

/// DNS checker that reports the listed domains as propagated
#[derive(Default)]
pub struct TestDnsChecker {
    propagated: RwLock<HashSet<String>>,
}

impl TestDnsChecker {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn propagate(&self, domain: &str) {
        self.propagated.write().await.insert(domain.to_string());
    }
}

#[async_trait]
impl DnsChecker for TestDnsChecker {
    async fn is_propagated(&self, domain: &str) -> bool {
        self.propagated.read().await.contains(domain)
    }
}

/// A purchase already registered and waiting on DNS
pub fn dns_pending_purchase(tenant_id: Uuid, domain: &str, attempts: i32) -> DomainPurchase {
    DomainPurchase {
        tenant_id,
        domain: domain.to_string(),
        status: DomainStatus::DnsPending,
        dns_check_attempts: attempts,
        ..Default::default()
    }
}
