use std::fmt;

use ingest::DecodeError;
use thiserror::Error;

/// Pipeline stage that applies an artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Project,
    Classify,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Project => f.write_str("projection"),
            Stage::Classify => f.write_str("classification"),
        }
    }
}

/// Errors that can occur while running a batch through the pipeline.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PipelineError {
    /// The request was rejected before any artifact was applied.
    #[error("decode failure: {0}")]
    Decode(#[from] DecodeError),

    /// A vector reached an artifact with the wrong length. Schema validation
    /// should make this impossible; seeing it means the schema and the
    /// artifacts disagree.
    #[error("{stage} received record {index} with length {actual}, expected {expected}")]
    DimensionMismatch {
        stage: Stage,
        index: usize,
        expected: usize,
        actual: usize,
    },

    /// Stage outputs and decoded records are out of step.
    #[error("{records} records but {predictions} predictions")]
    CardinalityMismatch { records: usize, predictions: usize },
}

impl PipelineError {
    /// Whether the caller's input caused the failure.
    pub fn is_client_error(&self) -> bool {
        matches!(self, PipelineError::Decode(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_errors_are_client_errors() {
        let err = PipelineError::from(DecodeError::MalformedPayload("eof".into()));
        assert!(err.is_client_error());
        assert!(err.to_string().starts_with("decode failure"));
    }

    #[test]
    fn invariant_violations_are_server_faults() {
        let err = PipelineError::DimensionMismatch {
            stage: Stage::Project,
            index: 2,
            expected: 784,
            actual: 783,
        };
        assert!(!err.is_client_error());
        assert_eq!(
            err.to_string(),
            "projection received record 2 with length 783, expected 784"
        );
    }
}
