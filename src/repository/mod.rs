//! Data access layer (Repository pattern)
//!
//! Tables live in Postgres with row-level security enabled; the service
//! connects with a role that bypasses RLS and scopes every query itself.

pub mod domain_purchase;
pub mod host;
pub mod role;

pub use domain_purchase::DomainPurchaseRepository;
pub use host::HostRepository;
pub use role::RoleRepository;
