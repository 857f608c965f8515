use anyhow::Result;
use shopfront_core::{config::Config, server, telemetry};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let config = Config::from_env()?;

    let prometheus_handle = telemetry::init(&config.telemetry)?;

    info!(
        root_domain = %config.platform.root_domain,
        max_dns_check_attempts = config.provisioning.max_dns_check_attempts,
        "Starting Shopfront Core"
    );

    server::run(config, prometheus_handle).await
}
