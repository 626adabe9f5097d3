//! Server initialization and routing
//!
//! - Router configuration with all API endpoints
//! - Middleware stack (auth, logging, compression, etc.)
//! - Artifact reload on SIGHUP
//! - Graceful shutdown handling

use crate::config::ServerConfig;
use crate::middleware::{api_key_auth, log_requests, request_id};
use crate::routes::{api_info, health, not_found, predict};
use crate::state::ServerState;
use crate::telemetry;
use artifacts::ArtifactStore;
use axum::extract::DefaultBodyLimit;
use axum::http::StatusCode;
use axum::middleware::{from_fn, from_fn_with_state};
use axum::routing::{get, post};
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

/// Build the Axum router with all routes and middleware
///
/// Routes are divided into:
/// - Public routes: /, /health, /ready, /metrics (no auth required)
/// - Protected routes: /api and /api/v1/* (API key required when configured)
///
/// Middleware stack, outermost first:
/// 1. Tracing
/// 2. Request ID tracking
/// 3. Request logging
/// 4. CORS
/// 5. Compression
/// 6. Timeout handling
/// 7. API key authentication and body limit (protected routes only)
pub fn build_router(state: Arc<ServerState>) -> Router {
    let cors = if state.config.enable_cors {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        CorsLayer::new()
    };

    let public_routes = Router::new()
        .route("/", get(api_info))
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        .route("/metrics", get(health::metrics));

    let protected_routes = Router::new()
        .route("/api/v1/predict", post(predict::predict))
        .route("/api", post(predict::predict))
        .layer(DefaultBodyLimit::max(state.config.max_body_size()))
        .route("/api/v1/model", get(health::model_info))
        .layer(from_fn_with_state(state.clone(), api_key_auth));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .fallback(not_found)
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

/// Start the digit prediction server
///
/// Blocks until shutdown via SIGTERM or Ctrl+C.
///
/// # Initialization
///
/// 1. Sets up structured JSON logging with the configured log level
/// 2. Loads the artifact bundle; any failure returns before a socket is bound
/// 3. Installs the Prometheus recorder and pipeline stage metrics
/// 4. Builds the router and binds the configured TCP address
/// 5. Serves with graceful shutdown; SIGHUP reloads the artifacts
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
    // A subscriber may already be installed when embedded in a larger binary.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(config.log_level.as_str())
        .with_target(false)
        .with_thread_ids(true)
        .with_thread_names(true)
        .json()
        .try_init();

    let addr: SocketAddr = config.socket_addr()?;

    let mut state = ServerState::new(config.clone()).inspect_err(|err| {
        tracing::error!(error = %err, "startup_aborted");
    })?;

    if config.metrics_enabled {
        state = state.with_metrics_handle(telemetry::install_recorder()?);
        digitrec::set_pipeline_metrics(Some(Arc::new(telemetry::PrometheusPipelineMetrics)));
    }

    let state = Arc::new(state);
    spawn_reload_on_hangup(Arc::clone(&state.store))?;

    let info = state.store.snapshot().info().clone();
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(
        %addr,
        api_keys = config.api_keys.len(),
        input_dim = info.input_dim,
        feature_dim = info.feature_dim,
        digest = ?info.digest,
        timeout_secs = config.timeout_secs,
        max_body_size_mb = config.max_body_size_mb,
        cors = config.enable_cors,
        metrics = config.metrics_enabled,
        "server_listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server_shutdown_complete");
    Ok(())
}

/// Reload artifacts whenever the process receives SIGHUP. A failed reload
/// keeps the current bundle serving.
#[cfg(unix)]
fn spawn_reload_on_hangup(store: Arc<ArtifactStore>) -> anyhow::Result<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut hangup = signal(SignalKind::hangup())?;
    tokio::spawn(async move {
        while hangup.recv().await.is_some() {
            let store = Arc::clone(&store);
            match tokio::task::spawn_blocking(move || store.reload()).await {
                Ok(result) => telemetry::record_reload(result.is_ok()),
                Err(err) => {
                    telemetry::record_reload(false);
                    tracing::error!(error = %err, "artifacts_reload_panicked");
                }
            }
        }
    });
    Ok(())
}

#[cfg(not(unix))]
fn spawn_reload_on_hangup(_store: Arc<ArtifactStore>) -> anyhow::Result<()> {
    Ok(())
}

/// Shutdown signal handler
async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            tracing::error!(error = %err, "ctrl_c_handler_failed");
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
                tracing::error!(error = %err, "sigterm_handler_failed");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!(signal = "ctrl_c", "shutdown_requested"),
        _ = terminate => tracing::info!(signal = "sigterm", "shutdown_requested"),
    }
}
