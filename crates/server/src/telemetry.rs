//! Prometheus wiring for the request path and the pipeline stages.

use digitrec::{DecodeError, PipelineError, PipelineMetrics};
use metrics::{counter, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::time::Duration;

pub const REQUESTS_TOTAL: &str = "digitrec_requests_total";
pub const RECORDS_TOTAL: &str = "digitrec_records_total";
pub const BATCH_LATENCY_SECONDS: &str = "digitrec_batch_latency_seconds";
pub const REJECTED_TOTAL: &str = "digitrec_rejected_total";
pub const STAGE_LATENCY_SECONDS: &str = "digitrec_stage_latency_seconds";
pub const RELOADS_TOTAL: &str = "digitrec_reloads_total";

/// Install the process-wide Prometheus recorder.
pub fn install_recorder() -> anyhow::Result<PrometheusHandle> {
    Ok(PrometheusBuilder::new().install_recorder()?)
}

/// Forwards pipeline stage timings to the `metrics` facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct PrometheusPipelineMetrics;

impl PrometheusPipelineMetrics {
    fn observe(stage: &'static str, latency: Duration, ok: bool) {
        let outcome = if ok { "success" } else { "failure" };
        histogram!(STAGE_LATENCY_SECONDS, "stage" => stage, "outcome" => outcome)
            .record(latency.as_secs_f64());
    }
}

impl PipelineMetrics for PrometheusPipelineMetrics {
    fn record_decode(&self, latency: Duration, result: Result<usize, DecodeError>) {
        Self::observe("decode", latency, result.is_ok());
    }

    fn record_project(&self, latency: Duration, result: Result<(), PipelineError>) {
        Self::observe("project", latency, result.is_ok());
    }

    fn record_classify(&self, latency: Duration, result: Result<(), PipelineError>) {
        Self::observe("classify", latency, result.is_ok());
    }
}

/// Per-request counters for a finished prediction call.
pub fn record_batch(latency: Duration, result: Result<usize, &PipelineError>) {
    histogram!(BATCH_LATENCY_SECONDS).record(latency.as_secs_f64());
    match result {
        Ok(records) => {
            counter!(REQUESTS_TOTAL, "outcome" => "success").increment(1);
            counter!(RECORDS_TOTAL).increment(records as u64);
        }
        Err(err) => {
            counter!(REQUESTS_TOTAL, "outcome" => "rejected").increment(1);
            counter!(REJECTED_TOTAL, "reason" => rejection_reason(err)).increment(1);
        }
    }
}

pub fn record_reload(ok: bool) {
    let outcome = if ok { "success" } else { "failure" };
    counter!(RELOADS_TOTAL, "outcome" => outcome).increment(1);
}

fn rejection_reason(err: &PipelineError) -> &'static str {
    match err {
        PipelineError::Decode(DecodeError::MalformedPayload(_)) => "malformed",
        PipelineError::Decode(DecodeError::TooManyRecords { .. }) => "too_many_records",
        PipelineError::Decode(DecodeError::InvalidRecord { .. }) => "schema",
        PipelineError::DimensionMismatch { .. } => "dimension_mismatch",
        PipelineError::CardinalityMismatch { .. } => "cardinality_mismatch",
    }
}
