//! Prometheus metrics setup and metric definitions

use anyhow::Context;
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

/// Install the Prometheus recorder and return a handle for rendering metrics.
pub fn install_prometheus_recorder() -> anyhow::Result<PrometheusHandle> {
    // Seconds; sub-millisecond buckets for the availability endpoint
    let buckets = [
        0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
    ];

    PrometheusBuilder::new()
        .set_buckets(&buckets)
        .context("failed to set histogram buckets")?
        .install_recorder()
        .context("failed to install Prometheus recorder")
}

/// Register metric descriptions and emit initial zero values so Prometheus output
/// includes HELP/TYPE lines for all metrics from startup (not just after first use).
pub fn describe_metrics() {
    // HTTP metrics
    describe_counter!("shopfront_http_requests_total", "Total number of HTTP requests");
    describe_histogram!(
        "shopfront_http_request_duration_seconds",
        "HTTP request duration in seconds"
    );
    describe_gauge!(
        "shopfront_http_requests_in_flight",
        "Number of HTTP requests currently being processed"
    );

    // Tenant resolution
    describe_counter!(
        "shopfront_tenant_resolution_fallback_total",
        "Tenant resolutions that fell back to profile metadata"
    );

    // Domain provisioning
    describe_counter!(
        "shopfront_domains_activated_total",
        "Custom domains moved to active"
    );
    describe_counter!(
        "shopfront_dns_retries_total",
        "DNS retry attempts by outcome (activated/not_propagated/error)"
    );
    describe_counter!(
        "shopfront_dns_retries_exhausted_total",
        "Domain purchases that reached the DNS check ceiling"
    );

    // Crawler diversion
    describe_counter!(
        "shopfront_crawler_requests_total",
        "Crawler requests by outcome (rendered/render_failed)"
    );

    counter!("shopfront_tenant_resolution_fallback_total", "reason" => "store_error").absolute(0);
    counter!("shopfront_domains_activated_total").absolute(0);
    counter!("shopfront_dns_retries_total", "result" => "activated").absolute(0);
    counter!("shopfront_dns_retries_exhausted_total").absolute(0);
    counter!("shopfront_crawler_requests_total", "result" => "rendered").absolute(0);
    counter!("shopfront_crawler_requests_total", "result" => "render_failed").absolute(0);
    gauge!("shopfront_http_requests_in_flight").set(0.0);
}
