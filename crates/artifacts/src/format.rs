//! On-disk artifact documents.
//!
//! Both artifacts are JSON. The offline training job writes them; this crate
//! only reads them. The structs are public so tooling and tests can produce
//! compatible files with `serde_json::to_writer`.

use serde::{Deserialize, Serialize};

/// Format marker expected in projector files.
pub const PROJECTOR_FORMAT: &str = "digit-projector";
/// Format marker expected in classifier files.
pub const CLASSIFIER_FORMAT: &str = "digit-classifier";
/// Highest document version this build reads.
pub const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProjectorFile {
    pub format: String,
    pub version: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_version: Option<String>,
    pub kind: ProjectorKind,
    pub input_dim: usize,
    pub output_dim: usize,
    pub mean: Vec<f32>,
    /// `output_dim` rows of `input_dim` loadings.
    pub components: Vec<Vec<f32>>,
    #[serde(default)]
    pub whiten: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explained_variance: Option<Vec<f32>>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ProjectorKind {
    Pca,
}

impl ProjectorFile {
    /// A version-1 PCA document without whitening.
    pub fn pca(mean: Vec<f32>, components: Vec<Vec<f32>>) -> Self {
        Self {
            format: PROJECTOR_FORMAT.to_string(),
            version: FORMAT_VERSION,
            model_version: None,
            kind: ProjectorKind::Pca,
            input_dim: mean.len(),
            output_dim: components.len(),
            mean,
            components,
            whiten: false,
            explained_variance: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClassifierFile {
    pub format: String,
    pub version: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_version: Option<String>,
    pub input_dim: usize,
    /// Raw class tags; validated against the digit set at load time.
    pub classes: Vec<u8>,
    pub model: ModelSpec,
}

impl ClassifierFile {
    pub fn new(input_dim: usize, classes: Vec<u8>, model: ModelSpec) -> Self {
        Self {
            format: CLASSIFIER_FORMAT.to_string(),
            version: FORMAT_VERSION,
            model_version: None,
            input_dim,
            classes,
            model,
        }
    }
}

/// Serialized classifier model. Rows are indexed by position in `classes`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ModelSpec {
    Linear {
        weights: Vec<Vec<f32>>,
        bias: Vec<f32>,
    },
    NearestCentroid {
        centroids: Vec<Vec<f32>>,
    },
    Voting {
        voting: VotingKind,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        weights: Option<Vec<f32>>,
        members: Vec<ModelSpec>,
    },
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum VotingKind {
    Hard,
    Soft,
}
