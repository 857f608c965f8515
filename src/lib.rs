//! Shopfront Core - storefront edge backend
//!
//! Resolves which tenant a request belongs to, answers subdomain
//! availability, drives custom domains from purchase to live, and sends
//! crawler traffic to a pre-render service.

pub mod api;
pub mod config;
pub mod domain;
pub mod error;
pub mod jwt;
pub mod middleware;
pub mod repository;
pub mod server;
pub mod service;
pub mod state;
pub mod telemetry;

// Re-export commonly used types
pub use config::Config;
pub use error::{AppError, Result};
