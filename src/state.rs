//! Application state traits for dependency injection
//!
//! Handlers are generic over `HasServices`, so the same router runs against
//! the Postgres-backed `AppState` in production and in-memory repositories in
//! tests.

use crate::config::Config;
use crate::jwt::JwtManager;
use crate::middleware::crawler::CrawlerDiversion;
use crate::repository::{DomainPurchaseRepository, HostRepository, RoleRepository};
use crate::service::{
    DnsChecker, DomainProvisioningService, RetryScheduler, SubdomainAvailabilityService,
    TenantResolver,
};

pub trait HasServices: Clone + Send + Sync + 'static {
    /// The role assignment repository type
    type RoleRepo: RoleRepository + 'static;
    /// The host registry repository type
    type HostRepo: HostRepository + 'static;
    /// The domain purchase repository type
    type DomainRepo: DomainPurchaseRepository + 'static;
    /// The DNS checker type
    type Dns: DnsChecker + 'static;

    fn config(&self) -> &Config;

    fn tenant_resolver(&self) -> &TenantResolver<Self::RoleRepo>;

    fn availability_service(&self) -> &SubdomainAvailabilityService<Self::HostRepo>;

    fn provisioning_service(
        &self,
    ) -> &DomainProvisioningService<Self::DomainRepo, Self::HostRepo, Self::Dns>;

    fn retry_scheduler(&self) -> &RetryScheduler<Self::DomainRepo, Self::HostRepo, Self::Dns>;

    fn jwt_manager(&self) -> &JwtManager;

    /// Crawler classification and render-service client
    fn crawler(&self) -> &CrawlerDiversion;

    /// Check if the backing store is reachable
    fn check_ready(&self) -> impl std::future::Future<Output = bool> + Send;
}
