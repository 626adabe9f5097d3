use crate::error::{ServerError, ServerResult};
use crate::state::{ServerMetadata, ServerState};
use axum::extract::State;
use axum::http::header::CONTENT_TYPE;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;
use std::sync::Arc;

/// Health check endpoint (liveness)
pub async fn health_check(State(state): State<Arc<ServerState>>) -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "service": "digit-server",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "uptime_seconds": state.uptime_seconds(),
    }))
}

/// Readiness check endpoint
///
/// State only exists once a bundle loaded, so a reachable server is ready;
/// the response reports which bundle is serving.
pub async fn readiness_check(
    State(state): State<Arc<ServerState>>,
) -> ServerResult<impl IntoResponse> {
    let bundle = state.store.snapshot();
    let info = bundle.info();

    Ok(Json(json!({
        "status": "ready",
        "service": "digit-server",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "uptime_seconds": state.uptime_seconds(),
        "components": {
            "api": "ready",
            "artifacts": "ready",
        },
        "bundle": {
            "generation": state.store.generation(),
            "digest": info.digest,
            "input_dim": info.input_dim,
            "feature_dim": info.feature_dim,
        }
    })))
}

/// Prometheus metrics endpoint
pub async fn metrics(State(state): State<Arc<ServerState>>) -> ServerResult<impl IntoResponse> {
    if !state.config.metrics_enabled {
        return Err(ServerError::NotFound);
    }
    let body = state
        .metrics_handle
        .as_ref()
        .map(|handle| handle.render())
        .unwrap_or_default();
    Ok(([(CONTENT_TYPE, "text/plain; version=0.0.4")], body))
}

/// Model metadata for the serving bundle.
#[derive(Debug, serde::Serialize)]
pub struct ModelResponse {
    pub generation: u64,
    pub projector_path: String,
    pub classifier_path: String,
    #[serde(flatten)]
    pub info: artifacts::BundleInfo,
    pub server: ServerMetadata,
}

/// Bundle metadata endpoint
pub async fn model_info(State(state): State<Arc<ServerState>>) -> ServerResult<impl IntoResponse> {
    let bundle = state.store.snapshot();
    let paths = state.store.paths();

    Ok(Json(ModelResponse {
        generation: state.store.generation(),
        projector_path: paths.projector.display().to_string(),
        classifier_path: paths.classifier.display().to_string(),
        info: bundle.info().clone(),
        server: ServerMetadata {
            version: env!("CARGO_PKG_VERSION").to_string(),
            uptime_seconds: state.uptime_seconds(),
        },
    }))
}
