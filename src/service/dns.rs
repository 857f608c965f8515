//! DNS propagation checks for custom domains

use async_trait::async_trait;
use std::net::IpAddr;
use std::time::Duration;
use tracing::debug;

/// Answers "does this domain point at the platform yet?"
///
/// A lookup failure or timeout is reported as `false`: the domain simply has
/// not propagated, and the retry scheduler will ask again later.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DnsChecker: Send + Sync {
    async fn is_propagated(&self, domain: &str) -> bool;
}

/// Resolver-backed checker using the system's DNS configuration
pub struct SystemDnsChecker {
    expected_targets: Vec<IpAddr>,
    timeout: Duration,
}

impl SystemDnsChecker {
    /// With no expected targets, any successful resolution counts as propagated.
    pub fn new(expected_targets: Vec<IpAddr>, timeout: Duration) -> Self {
        Self {
            expected_targets,
            timeout,
        }
    }

    fn matches(&self, addrs: &[IpAddr]) -> bool {
        if addrs.is_empty() {
            return false;
        }
        if self.expected_targets.is_empty() {
            return true;
        }
        addrs.iter().any(|ip| self.expected_targets.contains(ip))
    }
}

#[async_trait]
impl DnsChecker for SystemDnsChecker {
    async fn is_propagated(&self, domain: &str) -> bool {
        let lookup = tokio::net::lookup_host(format!("{}:443", domain));

        let addrs: Vec<IpAddr> = match tokio::time::timeout(self.timeout, lookup).await {
            Ok(Ok(iter)) => iter.map(|sock| sock.ip()).collect(),
            Ok(Err(e)) => {
                debug!(domain = %domain, error = %e, "DNS lookup failed");
                return false;
            }
            Err(_) => {
                debug!(domain = %domain, timeout_ms = self.timeout.as_millis() as u64, "DNS lookup timed out");
                return false;
            }
        };

        let propagated = self.matches(&addrs);
        debug!(domain = %domain, resolved = ?addrs, propagated, "DNS lookup finished");
        propagated
    }
}
