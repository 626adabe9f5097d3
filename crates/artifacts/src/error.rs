use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Failures while loading the trained artifacts.
///
/// Every variant is fatal at startup: the service never begins serving with a
/// partially loaded bundle. During a reload the same errors leave the
/// previously installed bundle in place.
#[derive(Debug, Error)]
pub enum ArtifactLoadError {
    /// The configured location does not exist.
    #[error("artifact not found: {}", path.display())]
    NotFound { path: PathBuf },

    /// The file exists but could not be read.
    #[error("failed to read artifact {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The bytes are not a well-formed artifact document.
    #[error("malformed artifact {}: {source}", path.display())]
    Format {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Wrong format marker or a version this build cannot read.
    #[error("unsupported artifact {}: expected {expected}, found {found}", path.display())]
    UnsupportedVersion {
        path: PathBuf,
        expected: String,
        found: String,
    },

    /// Parses, but the parameters are inconsistent.
    #[error("invalid artifact {}: {reason}", path.display())]
    Invalid { path: PathBuf, reason: String },

    /// Projector output and classifier input disagree.
    #[error(
        "projector emits {projector_output} features but classifier expects {classifier_input}"
    )]
    DimensionSkew {
        projector_output: usize,
        classifier_input: usize,
    },
}

impl ArtifactLoadError {
    pub(crate) fn invalid(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        ArtifactLoadError::Invalid {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

/// A vector handed to an artifact had the wrong length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("expected vector of length {expected}, got {actual}")]
pub struct DimensionError {
    pub expected: usize,
    pub actual: usize,
}

impl DimensionError {
    /// Returns an error when `actual` differs from `expected`.
    pub fn check(expected: usize, actual: usize) -> Result<(), DimensionError> {
        if expected == actual {
            Ok(())
        } else {
            Err(DimensionError { expected, actual })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_names_path() {
        let err = ArtifactLoadError::NotFound {
            path: PathBuf::from("/models/pca_50.json"),
        };
        assert!(err.to_string().contains("artifact not found"));
        assert!(err.to_string().contains("/models/pca_50.json"));
    }

    #[test]
    fn skew_reports_both_dims() {
        let err = ArtifactLoadError::DimensionSkew {
            projector_output: 50,
            classifier_input: 40,
        };
        let msg = err.to_string();
        assert!(msg.contains("50"));
        assert!(msg.contains("40"));
    }

    #[test]
    fn dimension_check() {
        assert!(DimensionError::check(3, 3).is_ok());
        assert_eq!(
            DimensionError::check(3, 2),
            Err(DimensionError {
                expected: 3,
                actual: 2
            })
        );
    }
}
