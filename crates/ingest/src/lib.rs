//! Digit service ingest layer
//!
//! This is where request data enters the pipeline. We take the raw request
//! body, parse it, check every record against the schema derived from the
//! serving artifacts, and hand back strongly typed [`InputRecord`]s.
//!
//! ## What we do here
//!
//! - **Parse** the batch: an array of records, a mapping keyed by identifier,
//!   or either wrapped in `{"records": ...}`
//! - **Validate** each record: positive identifier, exactly `input_dim` finite
//!   pixels, optional label from the digit class set
//! - **Preserve order**: record *i* of the output is record *i* of the payload
//! - **Log** outcomes via tracing so rejected batches are traceable
//!
//! Validation failures are typed ([`SchemaError`], [`DecodeError`]) and
//! reject the whole batch. Nothing is padded, truncated, or coerced.
//!
//! ## Example
//!
//! ```
//! use ingest::{decode, IngestConfig, RecordSchema};
//!
//! let schema = RecordSchema::new(3);
//! let body = br#"[{"identifier": 7, "label": "3", "pixels": [0.0, 0.5, 1.0]}]"#;
//! let records = decode(body, &schema, &IngestConfig::default()).unwrap();
//!
//! assert_eq!(records.len(), 1);
//! assert_eq!(records[0].identifier(), 7);
//! assert_eq!(records[0].label().map(|d| d.value()), Some(3));
//! ```

mod config;
mod decode;
mod error;
mod schema;
mod types;

pub use crate::config::{ConfigError, IngestConfig, DEFAULT_MAX_BATCH_RECORDS};
pub use crate::decode::{decode, decode_value, RECORDS_FIELD};
pub use crate::error::{DecodeError, SchemaError};
pub use crate::schema::{RecordSchema, IDENTIFIER_FIELDS, LABEL_FIELD, PIXELS_FIELD};
pub use crate::types::{InputRecord, PixelVector};
