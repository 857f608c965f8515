//! Subdomain availability checks for storefront sign-up

use crate::domain::{normalize_subdomain, AvailabilityResponse};
use crate::error::{AppError, Result};
use crate::repository::HostRepository;
use std::sync::Arc;
use tracing::error;

pub struct SubdomainAvailabilityService<H: HostRepository> {
    host_repo: Arc<H>,
    root_domain: String,
}

impl<H: HostRepository> SubdomainAvailabilityService<H> {
    pub fn new(host_repo: Arc<H>, root_domain: impl Into<String>) -> Self {
        Self {
            host_repo,
            root_domain: root_domain.into(),
        }
    }

    /// Report whether `candidate`, once normalized, is free under the root domain.
    ///
    /// The answer is a bare boolean: a taken name never reveals who holds it.
    pub async fn check(&self, candidate: &str) -> Result<AvailabilityResponse> {
        let label = normalize_subdomain(candidate).ok_or_else(|| {
            AppError::BadRequest(
                "Subdomain must contain between 1 and 63 letters, digits or hyphens".to_string(),
            )
        })?;
        let host = format!("{}.{}", label, self.root_domain);

        let existing = self.host_repo.find_by_host(&host).await.map_err(|e| {
            error!(host = %host, error = %e, "Host registry lookup failed");
            e
        })?;

        Ok(AvailabilityResponse {
            available: existing.is_none(),
        })
    }
}
