//! Server initialization and routing
//!
//! This module handles the Axum server setup including:
//! - Router configuration
//! - Middleware stack (request IDs, logging, timeouts, compression, CORS)
//! - Graceful shutdown handling

use crate::config::ServerConfig;
use crate::middleware::{log_requests, request_id};
use crate::routes::{analyze, health, index_page, not_found};
use crate::state::ServerState;
use anyhow::Context;
use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::http::StatusCode;
use axum::middleware::from_fn;
use axum::routing::{get, post};
use metrics_exporter_prometheus::PrometheusBuilder;
use semantic::SemanticEncoder;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

/// Build the Axum router with all routes and middleware
///
/// Middleware, outermost first: trace, request ID, request logging, CORS,
/// compression, timeout, body limit.
pub fn build_router(state: Arc<ServerState>) -> Router {
    let cors = if state.config.enable_cors {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        CorsLayer::new()
    };

    Router::new()
        .route("/", get(index_page))
        .route("/analyze", post(analyze::analyze))
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        .route("/metrics", get(health::metrics))
        .fallback(not_found)
        .layer(DefaultBodyLimit::max(state.config.max_body_size()))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            state.config.timeout(),
        ))
        .layer(CompressionLayer::new())
        .layer(cors)
        .layer(from_fn(log_requests))
        .layer(from_fn(request_id))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the Helios HTTP server
///
/// Blocks until the server is shut down via SIGTERM or Ctrl+C.
///
/// # Initialization
///
/// 1. Sets up structured JSON logging (`RUST_LOG` overrides `log_level`)
/// 2. Builds the embedding provider and warms it up when configured
/// 3. Installs the Prometheus recorder when metrics are enabled
/// 4. Binds to the configured TCP address and serves with graceful shutdown
///
/// # Example
///
/// ```rust,no_run
/// use server::ServerConfig;
///
/// #[tokio::main]
/// async fn main() -> anyhow::Result<()> {
///     let config = ServerConfig::load()?;
///     server::start_server(config).await?;
///     Ok(())
/// }
/// ```
pub async fn start_server(config: ServerConfig) -> anyhow::Result<()> {
    health::mark_started();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(true)
        .with_thread_names(true)
        .json()
        .try_init()
        .map_err(|err| anyhow::anyhow!("failed to install tracing subscriber: {err}"))?;

    let encoder = Arc::new(
        SemanticEncoder::new(config.semantic.clone()).context("invalid semantic configuration")?,
    );
    if config.warm_up {
        tracing::info!(mode = encoder.mode().as_str(), "Warming up embedding model");
        encoder
            .warm_up()
            .await
            .context("embedding model failed to load")?;
    }

    if encoder.active_mode() != encoder.mode() {
        tracing::warn!(
            configured = encoder.mode().as_str(),
            active = encoder.active_mode().as_str(),
            "embedding model unavailable, feedback will use stub vectors"
        );
    }

    let mut state = ServerState::with_embedder(config.clone(), encoder)?;
    if config.metrics_enabled {
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .context("failed to install Prometheus recorder")?;
        state = state.with_metrics(handle);
    }

    let app = build_router(Arc::new(state.clone()));
    let addr: SocketAddr = config.socket_addr()?;

    tracing::info!(
        "Starting Helios server on {} ({} backend, model {})",
        addr,
        state.backend(),
        state.model_name()
    );
    tracing::info!(
        "Timeout: {}s, Max body: {}KB, CORS: {}, Metrics: {}",
        config.timeout_secs,
        config.max_body_size_kb,
        config.enable_cors,
        config.metrics_enabled
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Shutdown signal handler
async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            tracing::error!(error = %err, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received Ctrl+C, shutting down..."),
        _ = terminate => tracing::info!("Received SIGTERM, shutting down..."),
    }
}
