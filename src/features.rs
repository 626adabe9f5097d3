use artifacts::ArtifactBundle;
use ingest::InputRecord;
use tracing::error;

use crate::error::{PipelineError, Stage};

/// Projected representation of one record. Lives only as long as the
/// pipeline invocation that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector(Vec<f32>);

impl FeatureVector {
    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Applies the bundle's projector to every record, in order.
///
/// Records are expected to have passed schema validation against the same
/// bundle; a length disagreement here means schema and artifacts are out of
/// step and fails the whole batch.
pub fn project(
    bundle: &ArtifactBundle,
    records: &[InputRecord],
) -> Result<Vec<FeatureVector>, PipelineError> {
    let projector = bundle.projector();
    records
        .iter()
        .enumerate()
        .map(|(index, record)| {
            projector
                .apply(record.pixels().as_slice())
                .map(FeatureVector)
                .map_err(|dim| {
                    error!(
                        index,
                        identifier = record.identifier(),
                        expected = dim.expected,
                        actual = dim.actual,
                        "projector_dimension_mismatch"
                    );
                    PipelineError::DimensionMismatch {
                        stage: Stage::Project,
                        index,
                        expected: dim.expected,
                        actual: dim.actual,
                    }
                })
        })
        .collect()
}

#[cfg(test)]
pub(crate) fn feature(values: Vec<f32>) -> FeatureVector {
    FeatureVector(values)
}
