use artifacts::{ArtifactBundle, Classification};
use tracing::error;

use crate::error::{PipelineError, Stage};
use crate::features::FeatureVector;

/// Applies the bundle's classifier to every feature vector, in order.
pub fn classify(
    bundle: &ArtifactBundle,
    features: &[FeatureVector],
) -> Result<Vec<Classification>, PipelineError> {
    let classifier = bundle.classifier();
    features
        .iter()
        .enumerate()
        .map(|(index, feature)| {
            classifier.predict(feature.as_slice()).map_err(|dim| {
                error!(
                    index,
                    expected = dim.expected,
                    actual = dim.actual,
                    "classifier_dimension_mismatch"
                );
                PipelineError::DimensionMismatch {
                    stage: Stage::Classify,
                    index,
                    expected: dim.expected,
                    actual: dim.actual,
                }
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::feature;
    use artifacts::format::ModelSpec;
    use artifacts::{PcaProjector, TrainedClassifier};

    fn bundle() -> ArtifactBundle {
        let projector = PcaProjector::new(vec![0.0; 2], vec![vec![1.0, 0.0], vec![0.0, 1.0]])
            .unwrap();
        let classifier = TrainedClassifier::new(
            2,
            vec![1, 7],
            ModelSpec::NearestCentroid {
                centroids: vec![vec![1.0, 0.0], vec![0.0, 1.0]],
            },
        )
        .unwrap();
        ArtifactBundle::new(Box::new(projector), Box::new(classifier)).unwrap()
    }

    #[test]
    fn one_label_per_feature_in_order() {
        let out = classify(
            &bundle(),
            &[
                feature(vec![0.0, 0.9]),
                feature(vec![0.8, 0.1]),
                feature(vec![0.1, 0.7]),
            ],
        )
        .unwrap();
        let labels: Vec<u8> = out.iter().map(|c| c.label.value()).collect();
        assert_eq!(labels, vec![7, 1, 7]);
    }

    #[test]
    fn empty_input_empty_output() {
        assert!(classify(&bundle(), &[]).unwrap().is_empty());
    }

    #[test]
    fn wrong_feature_length_is_dimension_mismatch() {
        let err = classify(&bundle(), &[feature(vec![0.0, 1.0]), feature(vec![0.0])]).unwrap_err();
        assert_eq!(
            err,
            PipelineError::DimensionMismatch {
                stage: Stage::Classify,
                index: 1,
                expected: 2,
                actual: 1
            }
        );
    }
}
