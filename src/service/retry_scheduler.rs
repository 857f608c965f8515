//! Periodic DNS re-checks for purchases stuck in `dns_pending`

use crate::domain::{RetryReport, RetryResult, META_LAST_RETRY_AT, META_RETRIES_EXHAUSTED_AT};
use crate::error::Result;
use crate::repository::{DomainPurchaseRepository, HostRepository};
use crate::service::dns::DnsChecker;
use crate::service::provisioning::DomainProvisioningService;
use chrono::Utc;
use metrics::counter;
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};

pub struct RetryScheduler<D, H, C>
where
    D: DomainPurchaseRepository,
    H: HostRepository,
    C: DnsChecker,
{
    domain_repo: Arc<D>,
    provisioning: Arc<DomainProvisioningService<D, H, C>>,
    max_attempts: i32,
}

impl<D, H, C> RetryScheduler<D, H, C>
where
    D: DomainPurchaseRepository,
    H: HostRepository,
    C: DnsChecker,
{
    pub fn new(
        domain_repo: Arc<D>,
        provisioning: Arc<DomainProvisioningService<D, H, C>>,
        max_attempts: i32,
    ) -> Self {
        Self {
            domain_repo,
            provisioning,
            max_attempts,
        }
    }

    pub fn max_attempts(&self) -> i32 {
        self.max_attempts
    }

    /// Run one retry pass over every purchase still under the attempt ceiling.
    ///
    /// Each candidate gets one completion attempt and its counter is bumped
    /// whatever the outcome. Per-domain failures land in the report; only a
    /// failure to fetch the candidate list fails the pass.
    pub async fn run_once(&self) -> Result<RetryReport> {
        let candidates = self
            .domain_repo
            .list_retry_candidates(self.max_attempts)
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to fetch DNS retry candidates");
                e
            })?;

        let mut report = RetryReport {
            checked: candidates.len(),
            results: Vec::with_capacity(candidates.len()),
        };

        for purchase in candidates {
            let outcome = self.provisioning.attempt_completion(purchase.id).await;
            let succeeded = matches!(&outcome, Ok(o) if o.success);
            // Flag up front when the count read for this pass already reaches the ceiling
            let flagged = !succeeded && purchase.dns_check_attempts + 1 >= self.max_attempts;

            let now = Value::String(Utc::now().to_rfc3339());
            let mut patch = Map::new();
            patch.insert(META_LAST_RETRY_AT.to_string(), now.clone());
            if flagged {
                patch.insert(META_RETRIES_EXHAUSTED_AT.to_string(), now.clone());
            }

            let recorded = self.domain_repo.record_check_attempt(purchase.id, patch).await;

            // Overlapping passes may have bumped the counter since the read;
            // the count returned by the store decides exhaustion.
            let exhausted = !succeeded && matches!(&recorded, Ok(n) if *n >= self.max_attempts);
            if exhausted && !flagged {
                let mut late = Map::new();
                late.insert(META_RETRIES_EXHAUSTED_AT.to_string(), now);
                if let Err(e) = self.domain_repo.merge_metadata(purchase.id, late).await {
                    error!(
                        purchase_id = %purchase.id,
                        error = %e,
                        "Failed to flag exhausted DNS retries"
                    );
                }
            }

            let result = match (outcome, recorded) {
                (Ok(o), Ok(attempt)) => RetryResult {
                    domain: purchase.domain.clone(),
                    success: o.success,
                    attempt: Some(attempt),
                    error: None,
                },
                (Ok(o), Err(e)) => {
                    error!(domain = %purchase.domain, error = %e, "Failed to record DNS check attempt");
                    RetryResult {
                        domain: purchase.domain.clone(),
                        success: o.success,
                        attempt: None,
                        error: Some(format!("failed to record attempt: {}", e)),
                    }
                }
                (Err(e), recorded) => {
                    warn!(domain = %purchase.domain, error = %e, "Completion attempt failed");
                    RetryResult {
                        domain: purchase.domain.clone(),
                        success: false,
                        attempt: recorded.ok(),
                        error: Some(e.to_string()),
                    }
                }
            };

            let label = if result.error.is_some() {
                "error"
            } else if result.success {
                "activated"
            } else {
                "not_propagated"
            };
            counter!("shopfront_dns_retries_total", "result" => label).increment(1);

            if exhausted {
                counter!("shopfront_dns_retries_exhausted_total").increment(1);
                warn!(
                    purchase_id = %purchase.id,
                    domain = %purchase.domain,
                    attempts = ?result.attempt,
                    "DNS retries exhausted, purchase needs manual attention"
                );
            }

            report.results.push(result);
        }

        info!(
            checked = report.checked,
            activated = report.results.iter().filter(|r| r.success).count(),
            "DNS retry pass finished"
        );
        Ok(report)
    }
}

impl<D, H, C> RetryScheduler<D, H, C>
where
    D: DomainPurchaseRepository + 'static,
    H: HostRepository + 'static,
    C: DnsChecker + 'static,
{
    /// Run `run_once` every `period` until the returned task is aborted.
    /// A pass that overruns its slot skips the missed ticks instead of bunching them.
    pub fn spawn_periodic(self: Arc<Self>, period: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                ticker.tick().await;
                if let Err(e) = self.run_once().await {
                    error!(error = %e, "DNS retry pass failed");
                }
            }
        })
    }
}
