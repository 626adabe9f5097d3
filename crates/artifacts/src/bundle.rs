use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{info, warn};

use crate::classifier::{Classifier, TrainedClassifier};
use crate::digit::Digit;
use crate::error::ArtifactLoadError;
use crate::format::{ClassifierFile, ProjectorFile};
use crate::projector::{PcaProjector, Projector};

/// Locations of the two serialized artifacts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactPaths {
    pub projector: PathBuf,
    pub classifier: PathBuf,
}

impl ArtifactPaths {
    pub fn new(projector: impl Into<PathBuf>, classifier: impl Into<PathBuf>) -> Self {
        Self {
            projector: projector.into(),
            classifier: classifier.into(),
        }
    }
}

/// Descriptive metadata for a loaded bundle.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BundleInfo {
    pub input_dim: usize,
    pub feature_dim: usize,
    pub classes: Vec<Digit>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub projector_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub classifier_version: Option<String>,
    /// Hex SHA-256 over the projector bytes followed by the classifier bytes.
    /// `None` for bundles assembled in memory.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub digest: Option<String>,
    pub loaded_at: DateTime<Utc>,
}

/// The projector and classifier that every request applies, paired and
/// dimension-checked. Immutable once built.
#[derive(Debug)]
pub struct ArtifactBundle {
    projector: Box<dyn Projector>,
    classifier: Box<dyn Classifier>,
    info: BundleInfo,
}

impl ArtifactBundle {
    /// Pairs two in-memory artifacts.
    pub fn new(
        projector: Box<dyn Projector>,
        classifier: Box<dyn Classifier>,
    ) -> Result<Self, ArtifactLoadError> {
        Self::assemble(projector, classifier, None, None, None)
    }

    fn assemble(
        projector: Box<dyn Projector>,
        classifier: Box<dyn Classifier>,
        projector_version: Option<String>,
        classifier_version: Option<String>,
        digest: Option<String>,
    ) -> Result<Self, ArtifactLoadError> {
        if projector.output_dim() != classifier.input_dim() {
            return Err(ArtifactLoadError::DimensionSkew {
                projector_output: projector.output_dim(),
                classifier_input: classifier.input_dim(),
            });
        }
        let info = BundleInfo {
            input_dim: projector.input_dim(),
            feature_dim: projector.output_dim(),
            classes: classifier.classes().to_vec(),
            projector_version,
            classifier_version,
            digest,
            loaded_at: Utc::now(),
        };
        Ok(Self {
            projector,
            classifier,
            info,
        })
    }

    /// Reads, validates, and pairs both artifacts.
    pub fn load(paths: &ArtifactPaths) -> Result<Self, ArtifactLoadError> {
        let start = Instant::now();
        let result = Self::load_inner(paths);
        let elapsed_micros = start.elapsed().as_micros();
        match &result {
            Ok(bundle) => info!(
                projector = %paths.projector.display(),
                classifier = %paths.classifier.display(),
                input_dim = bundle.info.input_dim,
                feature_dim = bundle.info.feature_dim,
                digest = ?bundle.info.digest,
                elapsed_micros,
                "artifacts_loaded"
            ),
            Err(err) => warn!(error = %err, elapsed_micros, "artifacts_load_failure"),
        }
        result
    }

    fn load_inner(paths: &ArtifactPaths) -> Result<Self, ArtifactLoadError> {
        let projector_bytes = read_artifact(&paths.projector)?;
        let classifier_bytes = read_artifact(&paths.classifier)?;

        let mut hasher = Sha256::new();
        hasher.update(&projector_bytes);
        hasher.update(&classifier_bytes);
        let digest = hex::encode(hasher.finalize());

        let projector_file: ProjectorFile = parse_artifact(&projector_bytes, &paths.projector)?;
        let classifier_file: ClassifierFile =
            parse_artifact(&classifier_bytes, &paths.classifier)?;

        let projector = PcaProjector::from_file(projector_file, &paths.projector)?;
        let classifier = TrainedClassifier::from_file(classifier_file, &paths.classifier)?;
        let projector_version = projector.model_version().map(str::to_string);
        let classifier_version = classifier.model_version().map(str::to_string);

        Self::assemble(
            Box::new(projector),
            Box::new(classifier),
            projector_version,
            classifier_version,
            Some(digest),
        )
    }

    /// `(input_dim, feature_dim)`.
    pub fn dimensions(&self) -> (usize, usize) {
        (self.info.input_dim, self.info.feature_dim)
    }

    pub fn projector(&self) -> &dyn Projector {
        self.projector.as_ref()
    }

    pub fn classifier(&self) -> &dyn Classifier {
        self.classifier.as_ref()
    }

    pub fn info(&self) -> &BundleInfo {
        &self.info
    }

    pub fn classes(&self) -> &[Digit] {
        &self.info.classes
    }
}

/// Shorthand for [`ArtifactBundle::load`].
pub fn load(paths: &ArtifactPaths) -> Result<ArtifactBundle, ArtifactLoadError> {
    ArtifactBundle::load(paths)
}

fn read_artifact(path: &Path) -> Result<Vec<u8>, ArtifactLoadError> {
    fs::read(path).map_err(|source| match source.kind() {
        io::ErrorKind::NotFound => ArtifactLoadError::NotFound {
            path: path.to_path_buf(),
        },
        _ => ArtifactLoadError::Io {
            path: path.to_path_buf(),
            source,
        },
    })
}

fn parse_artifact<T: DeserializeOwned>(bytes: &[u8], path: &Path) -> Result<T, ArtifactLoadError> {
    serde_json::from_slice(bytes).map_err(|source| ArtifactLoadError::Format {
        path: path.to_path_buf(),
        source,
    })
}
