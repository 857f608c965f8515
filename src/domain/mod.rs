//! Domain models for Shopfront Core

pub mod domain_purchase;
pub mod host;
pub mod role;
pub mod tenant;

pub use domain_purchase::*;
pub use host::*;
pub use role::*;
pub use tenant::*;
