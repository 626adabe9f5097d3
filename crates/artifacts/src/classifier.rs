//! Feature-space classification.
//!
//! The service only consumes the top label. Models may attach a score in
//! `(0, 1]` to the winning class; callers that ignore it lose nothing.

use std::collections::HashSet;
use std::fmt;
use std::path::Path;

use serde::Serialize;

use crate::digit::Digit;
use crate::error::{ArtifactLoadError, DimensionError};
use crate::format::{ClassifierFile, ModelSpec, VotingKind, CLASSIFIER_FORMAT, FORMAT_VERSION};
use crate::projector::{all_finite, dot};

/// Winning class for one feature vector.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Classification {
    pub label: Digit,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f32>,
}

impl Classification {
    pub fn label_only(label: Digit) -> Self {
        Self { label, score: None }
    }
}

/// A trained, read-only mapping from a feature vector to a category tag.
pub trait Classifier: Send + Sync + fmt::Debug {
    /// Expected feature-vector length.
    fn input_dim(&self) -> usize;

    /// Classes this model can emit, in model order.
    fn classes(&self) -> &[Digit];

    /// Classifies one feature vector.
    fn predict(&self, features: &[f32]) -> Result<Classification, DimensionError>;
}

/// Classifier backed by one of the serialized model families.
#[derive(Debug, Clone)]
pub struct TrainedClassifier {
    input_dim: usize,
    classes: Vec<Digit>,
    model: Model,
    model_version: Option<String>,
}

#[derive(Debug, Clone)]
enum Model {
    Linear {
        /// Row-major `classes × input_dim`.
        weights: Vec<f32>,
        bias: Vec<f32>,
    },
    NearestCentroid {
        /// Row-major `classes × input_dim`.
        centroids: Vec<f32>,
    },
    Voting {
        kind: VotingKind,
        weights: Vec<f32>,
        members: Vec<Model>,
    },
}

impl TrainedClassifier {
    /// Validates a parsed document. `path` is only used in error messages.
    pub fn from_file(file: ClassifierFile, path: &Path) -> Result<Self, ArtifactLoadError> {
        if file.format != CLASSIFIER_FORMAT {
            return Err(ArtifactLoadError::UnsupportedVersion {
                path: path.to_path_buf(),
                expected: CLASSIFIER_FORMAT.to_string(),
                found: file.format,
            });
        }
        if file.version == 0 || file.version > FORMAT_VERSION {
            return Err(ArtifactLoadError::UnsupportedVersion {
                path: path.to_path_buf(),
                expected: format!("version <= {FORMAT_VERSION}"),
                found: format!("version {}", file.version),
            });
        }
        if file.input_dim == 0 {
            return Err(ArtifactLoadError::invalid(path, "input_dim must be non-zero"));
        }

        let classes = parse_classes(&file.classes, path)?;
        let model = Model::build(file.model, classes.len(), file.input_dim, path)?;

        Ok(Self {
            input_dim: file.input_dim,
            classes,
            model,
            model_version: file.model_version,
        })
    }

    /// Builds from an in-memory model description.
    pub fn new(
        input_dim: usize,
        classes: Vec<u8>,
        model: ModelSpec,
    ) -> Result<Self, ArtifactLoadError> {
        Self::from_file(
            ClassifierFile::new(input_dim, classes, model),
            Path::new("<memory>"),
        )
    }

    pub fn model_version(&self) -> Option<&str> {
        self.model_version.as_deref()
    }
}

impl Classifier for TrainedClassifier {
    fn input_dim(&self) -> usize {
        self.input_dim
    }

    fn classes(&self) -> &[Digit] {
        &self.classes
    }

    fn predict(&self, features: &[f32]) -> Result<Classification, DimensionError> {
        DimensionError::check(self.input_dim, features.len())?;
        let (idx, score) = self.model.decide(features, self.input_dim);
        Ok(Classification {
            label: self.classes[idx],
            score: Some(score),
        })
    }
}

fn parse_classes(raw: &[u8], path: &Path) -> Result<Vec<Digit>, ArtifactLoadError> {
    if raw.is_empty() {
        return Err(ArtifactLoadError::invalid(path, "class list is empty"));
    }
    let mut seen = HashSet::with_capacity(raw.len());
    raw.iter()
        .map(|&value| {
            let digit = Digit::try_from(value)
                .map_err(|e| ArtifactLoadError::invalid(path, e.to_string()))?;
            if !seen.insert(digit) {
                return Err(ArtifactLoadError::invalid(
                    path,
                    format!("duplicate class {digit}"),
                ));
            }
            Ok(digit)
        })
        .collect()
}

fn flatten_rows(
    rows: Vec<Vec<f32>>,
    expected_rows: usize,
    row_len: usize,
    what: &str,
    path: &Path,
) -> Result<Vec<f32>, ArtifactLoadError> {
    if rows.len() != expected_rows {
        return Err(ArtifactLoadError::invalid(
            path,
            format!("{what} has {} rows for {expected_rows} classes", rows.len()),
        ));
    }
    let mut flat = Vec::with_capacity(expected_rows * row_len);
    for (i, row) in rows.into_iter().enumerate() {
        if row.len() != row_len {
            return Err(ArtifactLoadError::invalid(
                path,
                format!("{what} row {i} has {} entries, expected {row_len}", row.len()),
            ));
        }
        flat.extend(row);
    }
    if !all_finite(&flat) {
        return Err(ArtifactLoadError::invalid(
            path,
            format!("{what} contains a non-finite value"),
        ));
    }
    Ok(flat)
}

impl Model {
    fn build(
        spec: ModelSpec,
        n_classes: usize,
        input_dim: usize,
        path: &Path,
    ) -> Result<Self, ArtifactLoadError> {
        match spec {
            ModelSpec::Linear { weights, bias } => {
                let weights = flatten_rows(weights, n_classes, input_dim, "weights", path)?;
                if bias.len() != n_classes || !all_finite(&bias) {
                    return Err(ArtifactLoadError::invalid(
                        path,
                        format!("bias must hold {n_classes} finite values"),
                    ));
                }
                Ok(Model::Linear { weights, bias })
            }
            ModelSpec::NearestCentroid { centroids } => Ok(Model::NearestCentroid {
                centroids: flatten_rows(centroids, n_classes, input_dim, "centroids", path)?,
            }),
            ModelSpec::Voting {
                voting,
                weights,
                members,
            } => {
                if members.is_empty() {
                    return Err(ArtifactLoadError::invalid(path, "voting ensemble has no members"));
                }
                let weights = weights.unwrap_or_else(|| vec![1.0; members.len()]);
                if weights.len() != members.len() {
                    return Err(ArtifactLoadError::invalid(
                        path,
                        format!(
                            "{} voting weights for {} members",
                            weights.len(),
                            members.len()
                        ),
                    ));
                }
                if weights.iter().any(|w| !w.is_finite() || *w < 0.0)
                    || weights.iter().sum::<f32>() <= 0.0
                {
                    return Err(ArtifactLoadError::invalid(
                        path,
                        "voting weights must be finite, non-negative and not all zero",
                    ));
                }
                let members = members
                    .into_iter()
                    .map(|m| Model::build(m, n_classes, input_dim, path))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Model::Voting {
                    kind: voting,
                    weights,
                    members,
                })
            }
        }
    }

    /// Index of the winning class and its score.
    fn decide(&self, x: &[f32], input_dim: usize) -> (usize, f32) {
        match self {
            Model::Linear { weights, bias } => {
                let logits = linear_logits(weights, bias, x, input_dim);
                let idx = argmax(&logits);
                (idx, softmax(&logits)[idx])
            }
            Model::NearestCentroid { centroids } => {
                let neg_dist = negative_distances(centroids, x, input_dim);
                let idx = argmax(&neg_dist);
                (idx, softmax(&neg_dist)[idx])
            }
            Model::Voting {
                kind: VotingKind::Hard,
                ..
            } => {
                let tally = self.probabilities(x, input_dim);
                let idx = argmax(&tally);
                (idx, tally[idx])
            }
            Model::Voting {
                kind: VotingKind::Soft,
                ..
            } => {
                let probs = self.probabilities(x, input_dim);
                let idx = argmax(&probs);
                (idx, probs[idx])
            }
        }
    }

    /// Per-class distribution summing to one.
    fn probabilities(&self, x: &[f32], input_dim: usize) -> Vec<f32> {
        match self {
            Model::Linear { weights, bias } => softmax(&linear_logits(weights, bias, x, input_dim)),
            Model::NearestCentroid { centroids } => {
                softmax(&negative_distances(centroids, x, input_dim))
            }
            Model::Voting {
                kind,
                weights,
                members,
            } => {
                let total: f32 = weights.iter().sum();
                let mut acc: Vec<f32> = Vec::new();
                for (member, w) in members.iter().zip(weights) {
                    let contribution = match kind {
                        VotingKind::Hard => {
                            let (idx, _) = member.decide(x, input_dim);
                            let mut one_hot = vec![0.0; member.class_count(input_dim)];
                            one_hot[idx] = 1.0;
                            one_hot
                        }
                        VotingKind::Soft => member.probabilities(x, input_dim),
                    };
                    if acc.is_empty() {
                        acc = vec![0.0; contribution.len()];
                    }
                    for (a, c) in acc.iter_mut().zip(contribution) {
                        *a += w * c;
                    }
                }
                acc.iter_mut().for_each(|a| *a /= total);
                acc
            }
        }
    }

    fn class_count(&self, input_dim: usize) -> usize {
        match self {
            Model::Linear { bias, .. } => bias.len(),
            Model::NearestCentroid { centroids } => centroids.len() / input_dim,
            Model::Voting { members, .. } => members[0].class_count(input_dim),
        }
    }
}

fn linear_logits(weights: &[f32], bias: &[f32], x: &[f32], input_dim: usize) -> Vec<f32> {
    weights
        .chunks_exact(input_dim)
        .zip(bias)
        .map(|(row, b)| dot(row, x) + b)
        .collect()
}

fn negative_distances(centroids: &[f32], x: &[f32], input_dim: usize) -> Vec<f32> {
    centroids
        .chunks_exact(input_dim)
        .map(|c| -c.iter().zip(x).map(|(a, b)| (a - b) * (a - b)).sum::<f32>())
        .collect()
}

/// First index holding the maximum; ties resolve to the lowest index.
fn argmax(values: &[f32]) -> usize {
    let mut best = 0;
    for (i, v) in values.iter().enumerate().skip(1) {
        if *v > values[best] {
            best = i;
        }
    }
    best
}

fn softmax(values: &[f32]) -> Vec<f32> {
    let max = values.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = values.iter().map(|v| (v - max).exp()).collect();
    let sum: f32 = exps.iter().sum();
    exps.into_iter().map(|e| e / sum).collect()
}
