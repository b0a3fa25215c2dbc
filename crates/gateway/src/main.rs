//! CyberSentry API Gateway
//!
//! The entry point for all public API requests.
//! Handles:
//! - Article view logging with geo enrichment
//! - News publishing, listing and detail reads
//! - Public fraud cases and contact messages
//! - Rate limiting of write endpoints
//! - Observability (logging, metrics)

mod handlers;
mod middleware;

use axum::{
    error_handling::HandleErrorLayer,
    extract::DefaultBodyLimit,
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
    Router,
};
use cybersentry_common::{
    analytics::{DisabledLocator, GeoLocator, IdentityHasher, IpApiLocator, ViewTracker},
    config::AppConfig,
    db::DbPool,
    media::{self, ImageStore},
    metrics, ContentStore, MemoryStore, Repository,
};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tower::{limit::GlobalConcurrencyLimitLayer, timeout::TimeoutLayer, ServiceBuilder};
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::middleware::rate_limit::{rate_limit_middleware, RateLimitState};

/// Room for the text fields of a multipart publish next to the image
const FORM_OVERHEAD_BYTES: usize = 1024 * 1024;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: Arc<dyn ContentStore>,
    pub tracker: ViewTracker,
    pub images: Arc<dyn ImageStore>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Load configuration
    let config = Arc::new(AppConfig::load()?);

    init_tracing(&config);

    info!(
        service = %config.observability.service_name,
        "Starting CyberSentry API Gateway v{}",
        cybersentry_common::VERSION
    );

    // Initialize metrics
    if config.observability.metrics_port != 0 {
        PrometheusBuilder::new()
            .with_http_listener(([0, 0, 0, 0], config.observability.metrics_port))
            .set_buckets(metrics::LATENCY_BUCKETS)?
            .install()?;
        info!(port = config.observability.metrics_port, "Prometheus exporter listening");
    }
    metrics::register_metrics();

    let store = connect_store(&config).await?;

    let geo: Arc<dyn GeoLocator> = if config.geo.enabled {
        Arc::new(IpApiLocator::new(config.geo.base_url.as_str(), config.geo_timeout())?)
    } else {
        info!("Geo lookups disabled");
        Arc::new(DisabledLocator)
    };

    if config.identity.hash_salt.is_empty() {
        warn!("identity.hash_salt is empty; client identities are unsalted hashes");
    }

    let tracker = ViewTracker::new(
        store.clone(),
        geo,
        IdentityHasher::new(config.identity.hash_salt.as_str()),
        config.geo.trust_platform_headers,
    );

    let images: Arc<dyn ImageStore> = Arc::from(media::from_config(&config.media)?);
    if !images.is_enabled() {
        warn!("Object storage not configured; articles will publish without images");
    }

    // Create app state
    let state = AppState {
        config: config.clone(),
        store,
        tracker,
        images,
    };

    // Build the router
    let app = create_router(state);

    // Start the server
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.observability.log_level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    if config.observability.json_logging {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Open the configured content store
async fn connect_store(config: &AppConfig) -> anyhow::Result<Arc<dyn ContentStore>> {
    if config.database.in_memory {
        warn!("Using in-memory content store; data is lost on restart");
        return Ok(Arc::new(MemoryStore::new()));
    }

    info!("Connecting to database...");
    let db = DbPool::new(&config.database).await?;

    if config.database.run_migrations {
        db.migrate().await?;
    }

    Ok(Arc::new(Repository::new(db)))
}

/// Create the main application router
fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Request ID propagation
    let request_id = SetRequestIdLayer::x_request_id(MakeRequestUuid);
    let propagate_id = PropagateRequestIdLayer::x_request_id();

    let upload_limit = state.config.media.max_image_bytes + FORM_OVERHEAD_BYTES;

    // Submissions are limited per client; view logging never is
    let mut write_routes = Router::new()
        .route("/api/publish-news", post(handlers::news::publish_news))
        .route(
            "/api/publish-news/upload",
            post(handlers::news::publish_news_upload).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route("/api/contact", post(handlers::contact::submit_contact));

    if state.config.rate_limit.enabled {
        let limiter = RateLimitState::from_config(&state.config.rate_limit);
        write_routes = write_routes.route_layer(from_fn_with_state(limiter, rate_limit_middleware));
    }

    let open_routes = Router::new()
        .route("/api/log-article-view", post(handlers::views::log_article_view))

        // Health endpoints
        .route("/health", get(handlers::health::health))
        .route("/ready", get(handlers::health::ready))

        // News endpoints
        .route("/api/news", get(handlers::news::list_news))
        .route("/api/news/{id}", get(handlers::news::get_news))

        // Fraud case endpoints
        .route("/api/cases", get(handlers::cases::list_cases))
        .route("/api/cases/{id}", get(handlers::cases::get_case));

    let timeout = state.config.request_timeout();
    let max_concurrent = state.config.server.max_concurrent_requests.max(1);

    // Compose the app; the last layer added runs first
    Router::new()
        .merge(write_routes)
        .merge(open_routes)
        .fallback(handlers::not_found)
        // Unexpected failures become a generic 500
        .layer(CatchPanicLayer::custom(handlers::panic_response))
        // Slow requests end with a 408 envelope
        .layer(
            ServiceBuilder::new()
                .layer(HandleErrorLayer::new(handlers::layer_error))
                .layer(TimeoutLayer::new(timeout)),
        )
        // Concurrency limit for backpressure, shared by every route
        .layer(GlobalConcurrencyLimitLayer::new(max_concurrent))
        .layer(from_fn(middleware::metrics::track_metrics))
        .layer(propagate_id)
        .layer(request_id)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, starting shutdown..."),
        _ = terminate => info!("Received SIGTERM, starting shutdown..."),
    }
}
