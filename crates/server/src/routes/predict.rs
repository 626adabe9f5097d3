use crate::error::{ServerError, ServerResult};
use crate::state::ServerState;
use crate::telemetry;
use axum::body::Bytes;
use axum::extract::rejection::{BytesRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use digitrec::{EncodeOptions, PredictionBatch};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Instant;

/// Query parameters for the prediction endpoints
#[derive(Debug, Default, Deserialize)]
pub struct PredictQuery {
    /// Attach the winning-class score to every prediction
    #[serde(default)]
    pub include_scores: bool,
}

/// Predict a batch of records.
///
/// The body is a JSON array of records, an object keyed by identifier, or
/// either wrapped in `{"records": ...}`. Each record carries `identifier`,
/// `pixels` and an optional `label`.
///
/// # Example
/// ```json
/// // Request
/// [{"identifier": 7, "label": "3", "pixels": [0.0, 0.0, 1.0]}]
///
/// // Response
/// {
///   "count": 1,
///   "model": {"digest": "…", "projector_version": "pca-50"},
///   "predictions": [{"identifier": 7, "predicted": 3, "actual": 3}]
/// }
/// ```
///
/// The batch is all-or-nothing: one invalid record rejects the request and
/// no partial predictions are returned.
pub async fn predict(
    State(state): State<Arc<ServerState>>,
    query: Result<Query<PredictQuery>, QueryRejection>,
    body: Result<Bytes, BytesRejection>,
) -> ServerResult<Json<PredictionBatch>> {
    let Query(query) = query.map_err(|rej| ServerError::BadRequest(rej.body_text()))?;
    let body = body.map_err(|rej| {
        if rej.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ServerError::PayloadTooLarge(state.config.max_body_size_mb)
        } else {
            ServerError::BadRequest(rej.body_text())
        }
    })?;

    // One snapshot per request: a concurrent reload cannot split this batch.
    let bundle = state.store.snapshot();
    let ingest = state.ingest.clone();
    let opts = EncodeOptions {
        include_scores: query.include_scores,
    };

    let start = Instant::now();
    let result =
        tokio::task::spawn_blocking(move || digitrec::run_batch(&bundle, &body, &ingest, opts))
            .await
            .map_err(|err| ServerError::Internal(format!("prediction task failed: {err}")))?;

    telemetry::record_batch(
        start.elapsed(),
        result.as_ref().map(|batch| batch.count),
    );

    Ok(Json(result?))
}
