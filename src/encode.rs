use artifacts::{BundleInfo, Classification, Digit};
use ingest::InputRecord;
use serde::{Deserialize, Serialize};

use crate::error::PipelineError;

/// Output switches for the response encoder.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct EncodeOptions {
    /// Emit the classifier's score for the winning class.
    #[serde(default)]
    pub include_scores: bool,
}

/// Result for one input record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub identifier: u64,
    pub predicted: Digit,
    /// Echo of the record's ground truth; omitted when the caller sent none.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual: Option<Digit>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f32>,
}

/// Which artifacts produced a batch of predictions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelStamp {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub digest: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub projector_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub classifier_version: Option<String>,
}

impl From<&BundleInfo> for ModelStamp {
    fn from(info: &BundleInfo) -> Self {
        Self {
            digest: info.digest.clone(),
            projector_version: info.projector_version.clone(),
            classifier_version: info.classifier_version.clone(),
        }
    }
}

/// Outbound payload: one prediction per input record, same order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionBatch {
    pub count: usize,
    pub model: ModelStamp,
    pub predictions: Vec<Prediction>,
}

impl PredictionBatch {
    pub fn new(model: ModelStamp, predictions: Vec<Prediction>) -> Self {
        Self {
            count: predictions.len(),
            model,
            predictions,
        }
    }

    pub fn empty(model: ModelStamp) -> Self {
        Self::new(model, Vec::new())
    }
}

/// Zips records with their classifications. Position `i` of the output
/// always describes record `i`.
pub fn encode(
    records: &[InputRecord],
    classifications: &[Classification],
    opts: EncodeOptions,
) -> Result<Vec<Prediction>, PipelineError> {
    if records.len() != classifications.len() {
        return Err(PipelineError::CardinalityMismatch {
            records: records.len(),
            predictions: classifications.len(),
        });
    }

    Ok(records
        .iter()
        .zip(classifications)
        .map(|(record, classification)| Prediction {
            identifier: record.identifier(),
            predicted: classification.label,
            actual: record.label(),
            score: classification.score.filter(|_| opts.include_scores),
        })
        .collect())
}
