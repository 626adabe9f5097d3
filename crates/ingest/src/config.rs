//! Configuration types for request decoding.
//!
//! [`IngestConfig`] controls how strictly incoming batches are checked. It is
//! cheap to clone and deserializes from the server's configuration sources.
//!
//! # Quick Start
//!
//! ```rust
//! use ingest::IngestConfig;
//!
//! let config = IngestConfig::default();
//! config.validate().expect("Invalid configuration");
//! assert!(!config.strict_pixel_range);
//! ```
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default upper bound on records accepted in one batch.
pub const DEFAULT_MAX_BATCH_RECORDS: usize = 10_000;

/// Runtime configuration for decoding and validation.
///
/// # Fields
///
/// - `strict_pixel_range`: reject pixel values outside `[0, 1]`
/// - `max_batch_records`: reject batches larger than this (optional)
///
/// ```json
/// {
///   "strict_pixel_range": false,
///   "max_batch_records": 10000
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    /// Reject pixel values outside `[0, 1]` with
    /// [`SchemaError::PixelOutOfRange`](crate::SchemaError::PixelOutOfRange).
    ///
    /// The projector is defined over the whole real line, so out-of-range
    /// values never crash the pipeline; they only produce out-of-distribution
    /// features. When `false` such values are accepted as-is.
    ///
    /// Default: `false`
    pub strict_pixel_range: bool,

    /// Maximum number of records in one batch.
    ///
    /// Default: `Some(10_000)`
    pub max_batch_records: Option<usize>,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            strict_pixel_range: false,
            max_batch_records: Some(DEFAULT_MAX_BATCH_RECORDS),
        }
    }
}

/// Configuration that cannot be used.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("max_batch_records must be greater than zero")]
    ZeroBatchLimit,
}

impl IngestConfig {
    /// Checks the configuration for values that would reject every batch.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_batch_records == Some(0) {
            return Err(ConfigError::ZeroBatchLimit);
        }
        Ok(())
    }

    pub fn with_strict_pixel_range(mut self, strict: bool) -> Self {
        self.strict_pixel_range = strict;
        self
    }

    pub fn with_max_batch_records(mut self, limit: Option<usize>) -> Self {
        self.max_batch_records = limit;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_lenient_and_bounded() {
        let cfg = IngestConfig::default();
        assert!(!cfg.strict_pixel_range);
        assert_eq!(cfg.max_batch_records, Some(DEFAULT_MAX_BATCH_RECORDS));
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn zero_limit_is_rejected() {
        let cfg = IngestConfig::default().with_max_batch_records(Some(0));
        assert_eq!(cfg.validate(), Err(ConfigError::ZeroBatchLimit));
    }

    #[test]
    fn partial_json_uses_defaults() {
        let cfg: IngestConfig = serde_json::from_str(r#"{"strict_pixel_range": true}"#).unwrap();
        assert!(cfg.strict_pixel_range);
        assert_eq!(cfg.max_batch_records, Some(DEFAULT_MAX_BATCH_RECORDS));
    }
}
