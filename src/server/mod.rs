//! Server initialization and routing

use crate::api;
use crate::config::Config;
use crate::error::AppError;
use crate::jwt::JwtManager;
use crate::middleware::{crawler_diversion_middleware, CrawlerDiversion, ObservabilityLayer};
use crate::repository::{
    domain_purchase::DomainPurchaseRepositoryImpl, host::HostRepositoryImpl,
    role::RoleRepositoryImpl,
};
use crate::service::{
    DomainProvisioningService, RetryScheduler, SubdomainAvailabilityService, SystemDnsChecker,
    TenantResolver,
};
use crate::state::HasServices;
use anyhow::{Context, Result};
use axum::{
    http::{HeaderName, Method},
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use sqlx::{postgres::PgPoolOptions, PgPool};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};

type DomainService =
    DomainProvisioningService<DomainPurchaseRepositoryImpl, HostRepositoryImpl, SystemDnsChecker>;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub db_pool: PgPool,
    pub tenant_resolver: Arc<TenantResolver<RoleRepositoryImpl>>,
    pub availability_service: Arc<SubdomainAvailabilityService<HostRepositoryImpl>>,
    pub provisioning_service: Arc<DomainService>,
    pub retry_scheduler:
        Arc<RetryScheduler<DomainPurchaseRepositoryImpl, HostRepositoryImpl, SystemDnsChecker>>,
    pub jwt_manager: JwtManager,
    pub crawler: CrawlerDiversion,
}

impl HasServices for AppState {
    type RoleRepo = RoleRepositoryImpl;
    type HostRepo = HostRepositoryImpl;
    type DomainRepo = DomainPurchaseRepositoryImpl;
    type Dns = SystemDnsChecker;

    fn config(&self) -> &Config {
        &self.config
    }

    fn tenant_resolver(&self) -> &TenantResolver<Self::RoleRepo> {
        &self.tenant_resolver
    }

    fn availability_service(&self) -> &SubdomainAvailabilityService<Self::HostRepo> {
        &self.availability_service
    }

    fn provisioning_service(&self) -> &DomainService {
        &self.provisioning_service
    }

    fn retry_scheduler(&self) -> &RetryScheduler<Self::DomainRepo, Self::HostRepo, Self::Dns> {
        &self.retry_scheduler
    }

    fn jwt_manager(&self) -> &JwtManager {
        &self.jwt_manager
    }

    fn crawler(&self) -> &CrawlerDiversion {
        &self.crawler
    }

    async fn check_ready(&self) -> bool {
        sqlx::query("SELECT 1")
            .execute(&self.db_pool)
            .await
            .is_ok()
    }
}

/// Run the server
pub async fn run(config: Config, prometheus_handle: Option<PrometheusHandle>) -> Result<()> {
    let db_pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .min_connections(config.database.min_connections)
        .connect(&config.database.url)
        .await
        .context("Failed to connect to database")?;

    info!("Connected to database");

    if config.database.run_migrations {
        sqlx::migrate!("./migrations")
            .run(&db_pool)
            .await
            .context("Failed to run database migrations")?;
        info!("Database migrations applied");
    }

    // Create repositories
    let role_repo = Arc::new(RoleRepositoryImpl::new(db_pool.clone()));
    let host_repo = Arc::new(HostRepositoryImpl::new(db_pool.clone()));
    let domain_repo = Arc::new(DomainPurchaseRepositoryImpl::new(db_pool.clone()));

    let dns_checker = Arc::new(SystemDnsChecker::new(
        config.provisioning.expected_targets.clone(),
        Duration::from_millis(config.provisioning.dns_lookup_timeout_ms),
    ));

    // Create services
    let tenant_resolver = Arc::new(TenantResolver::new(role_repo));
    let availability_service = Arc::new(SubdomainAvailabilityService::new(
        host_repo.clone(),
        config.platform.root_domain.clone(),
    ));
    let provisioning_service = Arc::new(DomainProvisioningService::new(
        domain_repo.clone(),
        host_repo,
        dns_checker,
    ));
    let retry_scheduler = Arc::new(RetryScheduler::new(
        domain_repo,
        provisioning_service.clone(),
        config.provisioning.max_dns_check_attempts,
    ));

    let crawler = CrawlerDiversion::from_config(&config.crawler)?;
    if crawler.is_enabled() {
        info!("Crawler diversion enabled");
    } else {
        info!("CRAWLER_RENDER_URL not set, crawler diversion disabled");
    }

    let state = AppState {
        config: Arc::new(config.clone()),
        db_pool,
        tenant_resolver,
        availability_service,
        provisioning_service,
        retry_scheduler: retry_scheduler.clone(),
        jwt_manager: JwtManager::new(config.jwt.clone()),
        crawler,
    };

    let retry_task = match config.provisioning.retry_interval_secs {
        0 => None,
        secs => {
            info!(interval_secs = secs, "Starting in-process DNS retry loop");
            Some(retry_scheduler.spawn_periodic(Duration::from_secs(secs)))
        }
    };

    let app = build_router(state, prometheus_handle);

    let http_addr = config.http_addr();
    let listener = TcpListener::bind(&http_addr).await?;
    info!("HTTP server started on {}", http_addr);

    let served = axum::serve(listener, app).await;

    if let Some(task) = retry_task {
        task.abort();
    }
    served?;

    Ok(())
}

/// Build the HTTP router with generic state type
///
/// Generic over the state so tests run the production router against
/// in-memory repositories.
pub fn build_router<S: HasServices>(state: S, prometheus_handle: Option<PrometheusHandle>) -> Router {
    // Endpoints callable from browsers on any origin
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::POST, Method::OPTIONS])
        .allow_headers(cors_headers(&state.config().cors.allowed_headers));

    let public = Router::new()
        .route(
            "/api/v1/subdomains/availability",
            post(api::availability::check::<S>),
        )
        .route("/api/v1/domains/retry-dns", post(api::domain::retry_dns::<S>))
        .layer(cors);

    let metrics = Router::new()
        .route("/metrics", get(api::metrics::metrics_handler))
        .with_state(Arc::new(prometheus_handle));

    let crawler = state.crawler().clone();

    Router::new()
        // Health endpoints
        .route("/health", get(api::health::health))
        .route("/ready", get(api::health::ready::<S>))
        // Tenant resolution
        .route("/api/v1/me/tenant", get(api::tenant::current::<S>))
        // Domain provisioning
        .route("/api/v1/domains", post(api::domain::create::<S>))
        .route("/api/v1/domains/{id}", get(api::domain::get::<S>))
        .route(
            "/api/v1/domains/{id}/registered",
            post(api::domain::mark_registered::<S>),
        )
        .route(
            "/api/v1/domains/{id}/complete",
            post(api::domain::complete::<S>),
        )
        .route("/api/v1/domains/{id}/fail", post(api::domain::mark_failed::<S>))
        .merge(public)
        .with_state(state)
        .merge(metrics)
        .fallback(not_found)
        // Add middleware
        .layer(from_fn_with_state(crawler, crawler_diversion_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(ObservabilityLayer)
}

async fn not_found() -> AppError {
    AppError::NotFound("Route not found".to_string())
}

fn cors_headers(names: &[String]) -> Vec<HeaderName> {
    names
        .iter()
        .filter_map(|name| match HeaderName::try_from(name.as_str()) {
            Ok(header) => Some(header),
            Err(_) => {
                warn!(header = %name, "Ignoring invalid CORS header name");
                None
            }
        })
        .collect()
}
