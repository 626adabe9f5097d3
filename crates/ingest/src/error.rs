//! Error types produced by the ingest crate.
//!
//! Two layers:
//!
//! | Error | Scope | Meaning |
//! |-------|-------|---------|
//! | [`SchemaError`] | one record | the record does not have the expected shape |
//! | [`DecodeError`] | whole batch | unparseable payload, oversize batch, or a record failing [`SchemaError`] |
//!
//! Both are request-local: the server maps them to a 4xx response and the
//! batch is rejected as a whole.
//!
//! ```rust
//! use ingest::{DecodeError, SchemaError};
//!
//! fn to_http_status(error: &DecodeError) -> u16 {
//!     match error {
//!         DecodeError::MalformedPayload(_) => 400,
//!         DecodeError::TooManyRecords { .. } => 413,
//!         DecodeError::InvalidRecord { .. } => 422,
//!     }
//! }
//!
//! let err = DecodeError::InvalidRecord {
//!     index: 2,
//!     identifier: Some(9),
//!     source: SchemaError::WrongLength { expected: 784, actual: 783 },
//! };
//! assert_eq!(to_http_status(&err), 422);
//! ```
use thiserror::Error;

/// A single record failed validation. Each variant names exactly what is
/// wrong; nothing is coerced.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SchemaError {
    /// A required field is absent (or `null`).
    #[error("missing field `{0}`")]
    MissingField(String),

    /// The record is not a JSON object.
    #[error("record must be an object, found {0}")]
    NotAnObject(String),

    /// Identifier is not a positive integer.
    #[error("identifier must be a positive integer, found {0}")]
    InvalidIdentifier(String),

    /// The batch key and the record's own identifier disagree.
    #[error("record keyed as {key} declares identifier {declared}")]
    IdentifierConflict { key: u64, declared: u64 },

    /// `pixels` is present but not an array.
    #[error("field `{0}` must be an array of numbers")]
    NotASequence(String),

    /// Pixel count differs from the projector's input dimensionality.
    #[error("expected {expected} pixels, found {actual}")]
    WrongLength { expected: usize, actual: usize },

    /// A pixel is not a number representable as a finite `f32`.
    #[error("pixel {index} is not a finite number")]
    InvalidPixel { index: usize },

    /// Strict mode only: a pixel lies outside `[0, 1]`.
    #[error("pixel {index} has value {value}, outside [0, 1]")]
    PixelOutOfRange { index: usize, value: f64 },

    /// Label present but not one of the recognized category tags.
    #[error("unrecognized label {0}")]
    UnrecognizedLabel(String),
}

impl SchemaError {
    /// Name of the offending field, for structured error responses.
    pub fn field(&self) -> Option<&str> {
        match self {
            SchemaError::MissingField(name) | SchemaError::NotASequence(name) => Some(name),
            SchemaError::InvalidIdentifier(_) | SchemaError::IdentifierConflict { .. } => {
                Some("identifier")
            }
            SchemaError::WrongLength { .. }
            | SchemaError::InvalidPixel { .. }
            | SchemaError::PixelOutOfRange { .. } => Some("pixels"),
            SchemaError::UnrecognizedLabel(_) => Some("label"),
            SchemaError::NotAnObject(_) => None,
        }
    }
}

/// A batch payload could not be turned into records.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DecodeError {
    /// Not parseable as structured data, or not an array/object of records.
    #[error("malformed payload: {0}")]
    MalformedPayload(String),

    /// The batch exceeds the configured record limit.
    #[error("batch holds {actual} records, limit is {limit}")]
    TooManyRecords { limit: usize, actual: usize },

    /// The record at `index` (0-based, payload order) failed validation.
    #[error("record at position {index} rejected: {source}")]
    InvalidRecord {
        index: usize,
        identifier: Option<u64>,
        #[source]
        source: SchemaError,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrong_length_message() {
        let err = SchemaError::WrongLength {
            expected: 784,
            actual: 10,
        };
        assert_eq!(err.to_string(), "expected 784 pixels, found 10");
        assert_eq!(err.field(), Some("pixels"));
    }

    #[test]
    fn missing_field_names_field() {
        let err = SchemaError::MissingField("pixels".into());
        assert!(err.to_string().contains("`pixels`"));
        assert_eq!(err.field(), Some("pixels"));
    }

    #[test]
    fn label_field() {
        assert_eq!(
            SchemaError::UnrecognizedLabel("\"x\"".into()).field(),
            Some("label")
        );
    }

    #[test]
    fn invalid_record_wraps_schema_error() {
        let err = DecodeError::InvalidRecord {
            index: 3,
            identifier: Some(12),
            source: SchemaError::MissingField("pixels".into()),
        };
        let msg = err.to_string();
        assert!(msg.contains("position 3"));
        assert!(msg.contains("`pixels`"));
        assert!(std::error::Error::source(&err).is_some());
    }
}
