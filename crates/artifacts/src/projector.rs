//! Pixel-space to feature-space projection.

use std::fmt;
use std::path::Path;

use crate::error::{ArtifactLoadError, DimensionError};
use crate::format::{ProjectorFile, ProjectorKind, FORMAT_VERSION, PROJECTOR_FORMAT};

/// A fitted, read-only transform from a pixel vector to a feature vector.
///
/// Implementations must be deterministic and must never refit.
pub trait Projector: Send + Sync + fmt::Debug {
    /// Expected pixel-vector length.
    fn input_dim(&self) -> usize;

    /// Produced feature-vector length.
    fn output_dim(&self) -> usize;

    /// Projects one pixel vector.
    fn apply(&self, pixels: &[f32]) -> Result<Vec<f32>, DimensionError>;
}

/// Principal-component projection: `components · (x − mean)`, optionally whitened.
#[derive(Debug, Clone, PartialEq)]
pub struct PcaProjector {
    input_dim: usize,
    output_dim: usize,
    mean: Vec<f32>,
    /// Row-major `output_dim × input_dim`.
    components: Vec<f32>,
    /// Per-component divisor; empty when whitening is off.
    scale: Vec<f32>,
    model_version: Option<String>,
}

impl PcaProjector {
    /// Builds an unwhitened projector from a mean and component rows.
    pub fn new(mean: Vec<f32>, components: Vec<Vec<f32>>) -> Result<Self, ArtifactLoadError> {
        Self::from_file(ProjectorFile::pca(mean, components), Path::new("<memory>"))
    }

    /// Validates a parsed document. `path` is only used in error messages.
    pub fn from_file(file: ProjectorFile, path: &Path) -> Result<Self, ArtifactLoadError> {
        if file.format != PROJECTOR_FORMAT {
            return Err(ArtifactLoadError::UnsupportedVersion {
                path: path.to_path_buf(),
                expected: PROJECTOR_FORMAT.to_string(),
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
        let ProjectorKind::Pca = file.kind;

        if file.input_dim == 0 || file.output_dim == 0 {
            return Err(ArtifactLoadError::invalid(path, "dimensions must be non-zero"));
        }
        if file.mean.len() != file.input_dim {
            return Err(ArtifactLoadError::invalid(
                path,
                format!(
                    "mean has {} entries, input_dim is {}",
                    file.mean.len(),
                    file.input_dim
                ),
            ));
        }
        if file.components.len() != file.output_dim {
            return Err(ArtifactLoadError::invalid(
                path,
                format!(
                    "{} component rows, output_dim is {}",
                    file.components.len(),
                    file.output_dim
                ),
            ));
        }

        let mut components = Vec::with_capacity(file.input_dim * file.output_dim);
        for (row_idx, row) in file.components.iter().enumerate() {
            if row.len() != file.input_dim {
                return Err(ArtifactLoadError::invalid(
                    path,
                    format!(
                        "component row {row_idx} has {} entries, input_dim is {}",
                        row.len(),
                        file.input_dim
                    ),
                ));
            }
            components.extend_from_slice(row);
        }
        if !all_finite(&file.mean) || !all_finite(&components) {
            return Err(ArtifactLoadError::invalid(path, "non-finite parameter"));
        }

        let scale = if file.whiten {
            let variance = file.explained_variance.as_deref().ok_or_else(|| {
                ArtifactLoadError::invalid(path, "whiten requires explained_variance")
            })?;
            if variance.len() != file.output_dim {
                return Err(ArtifactLoadError::invalid(
                    path,
                    format!(
                        "explained_variance has {} entries, output_dim is {}",
                        variance.len(),
                        file.output_dim
                    ),
                ));
            }
            if variance.iter().any(|v| !v.is_finite() || *v <= 0.0) {
                return Err(ArtifactLoadError::invalid(
                    path,
                    "explained_variance must be finite and positive",
                ));
            }
            variance.iter().map(|v| v.sqrt()).collect()
        } else {
            Vec::new()
        };

        Ok(Self {
            input_dim: file.input_dim,
            output_dim: file.output_dim,
            mean: file.mean,
            components,
            scale,
            model_version: file.model_version,
        })
    }

    pub fn model_version(&self) -> Option<&str> {
        self.model_version.as_deref()
    }
}

impl Projector for PcaProjector {
    fn input_dim(&self) -> usize {
        self.input_dim
    }

    fn output_dim(&self) -> usize {
        self.output_dim
    }

    fn apply(&self, pixels: &[f32]) -> Result<Vec<f32>, DimensionError> {
        DimensionError::check(self.input_dim, pixels.len())?;

        let centered: Vec<f32> = pixels
            .iter()
            .zip(&self.mean)
            .map(|(x, m)| x - m)
            .collect();

        let mut features: Vec<f32> = self
            .components
            .chunks_exact(self.input_dim)
            .map(|row| dot(row, &centered))
            .collect();

        if !self.scale.is_empty() {
            for (f, s) in features.iter_mut().zip(&self.scale) {
                *f /= s;
            }
        }
        Ok(features)
    }
}

pub(crate) fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

pub(crate) fn all_finite(values: &[f32]) -> bool {
    values.iter().all(|v| v.is_finite())
}
