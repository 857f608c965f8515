//! Business logic layer

pub mod availability;
pub mod crawler;
pub mod dns;
pub mod provisioning;
pub mod retry_scheduler;
pub mod tenant_resolver;

pub use availability::SubdomainAvailabilityService;
pub use crawler::{CrawlerAgentMatcher, CrawlerRenderClient, RenderedPage};
pub use dns::{DnsChecker, SystemDnsChecker};
pub use provisioning::DomainProvisioningService;
pub use retry_scheduler::RetryScheduler;
pub use tenant_resolver::TenantResolver;
