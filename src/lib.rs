//! Umbrella crate for the handwritten digit recognition service.
//!
//! This crate stitches the ingest layer and the trained artifacts into one
//! batch-prediction pipeline:
//!
//! ```text
//! payload ─decode─► InputRecord* ─project─► FeatureVector* ─classify─► Classification* ─encode─► PredictionBatch
//! ```
//!
//! Every stage reads from one [`ArtifactBundle`] snapshot, so a request never
//! mixes artifacts from two bundles. Output position `i` always describes
//! input record `i`.

mod classify;
mod encode;
mod error;
mod features;

pub use artifacts::{
    load, ArtifactBundle, ArtifactLoadError, ArtifactPaths, ArtifactStore, BundleInfo,
    Classification, Classifier, Digit, PcaProjector, Projector, TrainedClassifier,
};
pub use ingest::{
    decode, DecodeError, IngestConfig, InputRecord, PixelVector, RecordSchema, SchemaError,
};

pub use crate::classify::classify;
pub use crate::encode::{encode, EncodeOptions, ModelStamp, Prediction, PredictionBatch};
pub use crate::error::{PipelineError, Stage};
pub use crate::features::{project, FeatureVector};

use std::sync::{Arc, OnceLock, RwLock};
use std::time::{Duration, Instant};

use tracing::{info, warn};

/// Metrics observer for pipeline stages.
pub trait PipelineMetrics: Send + Sync {
    fn record_decode(&self, latency: Duration, result: Result<usize, DecodeError>);
    fn record_project(&self, latency: Duration, result: Result<(), PipelineError>);
    fn record_classify(&self, latency: Duration, result: Result<(), PipelineError>);
}

/// Install or clear the global pipeline metrics recorder.
pub fn set_pipeline_metrics(recorder: Option<Arc<dyn PipelineMetrics>>) {
    let mut guard = metrics_lock()
        .write()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    *guard = recorder;
}

fn metrics_lock() -> &'static RwLock<Option<Arc<dyn PipelineMetrics>>> {
    static METRICS: OnceLock<RwLock<Option<Arc<dyn PipelineMetrics>>>> = OnceLock::new();
    METRICS.get_or_init(|| RwLock::new(None))
}

fn metrics_recorder() -> Option<Arc<dyn PipelineMetrics>> {
    let guard = metrics_lock()
        .read()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    guard.clone()
}

struct MetricsSpan {
    recorder: Arc<dyn PipelineMetrics>,
    start: Instant,
}

impl MetricsSpan {
    fn start() -> Option<Self> {
        metrics_recorder().map(|recorder| Self {
            recorder,
            start: Instant::now(),
        })
    }

    fn record_decode(self, result: Result<usize, DecodeError>) {
        self.recorder.record_decode(self.start.elapsed(), result);
    }

    fn record_project(self, result: Result<(), PipelineError>) {
        self.recorder.record_project(self.start.elapsed(), result);
    }

    fn record_classify(self, result: Result<(), PipelineError>) {
        self.recorder.record_classify(self.start.elapsed(), result);
    }
}

/// Runs already decoded records through projection, classification and
/// encoding. An empty slice short-circuits to an empty batch.
pub fn predict_records(
    bundle: &ArtifactBundle,
    records: &[InputRecord],
    opts: EncodeOptions,
) -> Result<PredictionBatch, PipelineError> {
    let stamp = ModelStamp::from(bundle.info());
    if records.is_empty() {
        return Ok(PredictionBatch::empty(stamp));
    }

    let span = MetricsSpan::start();
    let features = project(bundle, records);
    if let Some(span) = span {
        span.record_project(features.as_ref().map(|_| ()).map_err(Clone::clone));
    }
    let features = features?;

    let span = MetricsSpan::start();
    let classifications = classify(bundle, &features);
    if let Some(span) = span {
        span.record_classify(classifications.as_ref().map(|_| ()).map_err(Clone::clone));
    }
    let classifications = classifications?;

    let predictions = encode(records, &classifications, opts)?;
    Ok(PredictionBatch::new(stamp, predictions))
}

/// Decodes `payload` against `bundle` and predicts every record.
///
/// The whole batch fails on the first invalid record; partial predictions are
/// never returned.
pub fn run_batch(
    bundle: &ArtifactBundle,
    payload: &[u8],
    cfg: &IngestConfig,
    opts: EncodeOptions,
) -> Result<PredictionBatch, PipelineError> {
    let start = Instant::now();
    let schema = RecordSchema::for_bundle(bundle.info(), cfg);

    let span = MetricsSpan::start();
    let decoded = decode(payload, &schema, cfg);
    if let Some(span) = span {
        span.record_decode(decoded.as_ref().map(Vec::len).map_err(Clone::clone));
    }

    let result = decoded
        .map_err(PipelineError::from)
        .and_then(|records| predict_records(bundle, &records, opts));

    let elapsed_micros = start.elapsed().as_micros();
    match &result {
        Ok(batch) => info!(records = batch.count, elapsed_micros, "batch_success"),
        Err(err) => warn!(error = %err, elapsed_micros, "batch_failure"),
    }
    result
}
