//! HTTP middleware for Shopfront Core
//!
//! - `AuthUser` extractor for bearer-token authenticated handlers
//! - Crawler diversion to the pre-render service
//! - Request ID and metrics observability layer

pub mod auth;
pub mod crawler;
pub mod metrics;

pub use auth::AuthUser;
pub use crawler::{crawler_diversion_middleware, CrawlerDiversion};
pub use metrics::ObservabilityLayer;
