//! Batch payload decoding.
//!
//! Accepted shapes, all validated record-by-record through [`RecordSchema`]:
//!
//! ```text
//! [ {"identifier": 1, "pixels": [...]}, ... ]          array of records
//! { "1": {"pixels": [...], "label": 3}, "2": {...} }    mapping keyed by identifier
//! { "records": <either of the above> }                  envelope
//! ```
//!
//! Records come out in payload order. Object keys keep the order the caller
//! wrote them in, and a key written twice yields two records. Zero records
//! is a valid, empty batch.
use std::fmt;
use std::time::Instant;

use serde::de::{self, Deserialize, Deserializer, MapAccess, SeqAccess, Visitor};
use serde_json::{Map, Value};
use tracing::{info, warn};

use crate::config::IngestConfig;
use crate::error::{DecodeError, SchemaError};
use crate::schema::{kind, peek_identifier, RecordSchema};
use crate::types::InputRecord;

/// Envelope field wrapping the batch.
pub const RECORDS_FIELD: &str = "records";

/// Decodes a raw request body into validated records.
pub fn decode(
    payload: &[u8],
    schema: &RecordSchema,
    cfg: &IngestConfig,
) -> Result<Vec<InputRecord>, DecodeError> {
    let batch: Batch = serde_json::from_slice(payload)
        .map_err(|err| DecodeError::MalformedPayload(err.to_string()))?;
    logged(|| decode_batch(batch, schema, cfg))
}

/// Decodes an already parsed payload.
///
/// A parsed [`Value`] has already folded repeated object keys into one, so
/// keyed batches with duplicate identifiers should go through [`decode`].
pub fn decode_value(
    payload: &Value,
    schema: &RecordSchema,
    cfg: &IngestConfig,
) -> Result<Vec<InputRecord>, DecodeError> {
    logged(|| match unwrap_envelope(payload) {
        Value::Array(items) => decode_records(items.iter(), schema, cfg),
        Value::Object(map) => decode_keyed(
            map.iter().map(|(key, raw)| (key.as_str(), raw)),
            schema,
            cfg,
        ),
        other => Err(not_a_batch(other)),
    })
}

fn logged(
    run: impl FnOnce() -> Result<Vec<InputRecord>, DecodeError>,
) -> Result<Vec<InputRecord>, DecodeError> {
    let start = Instant::now();
    let result = run();
    let elapsed_micros = start.elapsed().as_micros();
    match &result {
        Ok(records) => info!(records = records.len(), elapsed_micros, "decode_success"),
        Err(err) => warn!(error = %err, elapsed_micros, "decode_failure"),
    }
    result
}

fn unwrap_envelope(payload: &Value) -> &Value {
    match payload {
        Value::Object(map) if map.len() == 1 => match map.get(RECORDS_FIELD) {
            Some(inner @ (Value::Array(_) | Value::Object(_))) => inner,
            _ => payload,
        },
        _ => payload,
    }
}

/// Top-level payload shape. Keyed entries stay a list so every occurrence
/// of a key survives.
#[derive(Debug)]
enum Batch {
    Records(Vec<Value>),
    Keyed(Vec<(String, Value)>),
    /// `{"records": <array or object>}` and nothing else.
    Envelope(Box<Batch>),
    Other(Value),
}

impl Batch {
    fn into_value(self) -> Value {
        match self {
            Batch::Records(items) => Value::Array(items),
            Batch::Keyed(entries) => Value::Object(entries.into_iter().collect()),
            Batch::Envelope(inner) => {
                let mut map = Map::new();
                map.insert(RECORDS_FIELD.to_owned(), inner.into_value());
                Value::Object(map)
            }
            Batch::Other(value) => value,
        }
    }
}

impl<'de> Deserialize<'de> for Batch {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(BatchVisitor)
    }
}

struct BatchVisitor;

impl<'de> Visitor<'de> for BatchVisitor {
    type Value = Batch;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("an array or object of records")
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Batch, A::Error> {
        let mut items = Vec::new();
        while let Some(item) = seq.next_element::<Value>()? {
            items.push(item);
        }
        Ok(Batch::Records(items))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Batch, A::Error> {
        let mut entries = Vec::new();
        while let Some(key) = map.next_key::<String>()? {
            if !entries.is_empty() || key != RECORDS_FIELD {
                let raw = map.next_value::<Value>()?;
                entries.push((key, raw));
                continue;
            }
            // A leading "records" key is an envelope only if it is the sole key.
            let inner = map.next_value::<Batch>()?;
            let Some(next) = map.next_key::<String>()? else {
                return Ok(match inner {
                    Batch::Other(raw) => Batch::Keyed(vec![(key, raw)]),
                    inner => Batch::Envelope(Box::new(inner)),
                });
            };
            entries.push((key, inner.into_value()));
            let raw = map.next_value::<Value>()?;
            entries.push((next, raw));
        }
        Ok(Batch::Keyed(entries))
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<Batch, E> {
        Ok(Batch::Other(Value::Bool(v)))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Batch, E> {
        Ok(Batch::Other(Value::from(v)))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Batch, E> {
        Ok(Batch::Other(Value::from(v)))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Batch, E> {
        Ok(Batch::Other(Value::from(v)))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Batch, E> {
        Ok(Batch::Other(Value::String(v.to_owned())))
    }

    fn visit_unit<E: de::Error>(self) -> Result<Batch, E> {
        Ok(Batch::Other(Value::Null))
    }
}

fn decode_batch(
    batch: Batch,
    schema: &RecordSchema,
    cfg: &IngestConfig,
) -> Result<Vec<InputRecord>, DecodeError> {
    let batch = match batch {
        Batch::Envelope(inner) => *inner,
        other => other,
    };
    match batch {
        Batch::Records(items) => decode_records(items.iter(), schema, cfg),
        Batch::Keyed(entries) => decode_keyed(
            entries.iter().map(|(key, raw)| (key.as_str(), raw)),
            schema,
            cfg,
        ),
        // Only one envelope level is unwrapped; the inner "records" is a key.
        nested @ Batch::Envelope(_) => {
            let raw = nested.into_value();
            decode_keyed(std::iter::once((RECORDS_FIELD, &raw)), schema, cfg)
        }
        Batch::Other(value) => Err(not_a_batch(&value)),
    }
}

fn not_a_batch(value: &Value) -> DecodeError {
    DecodeError::MalformedPayload(format!(
        "expected an array or object of records, found {}",
        kind(value)
    ))
}

fn decode_records<'a>(
    items: impl ExactSizeIterator<Item = &'a Value>,
    schema: &RecordSchema,
    cfg: &IngestConfig,
) -> Result<Vec<InputRecord>, DecodeError> {
    check_limit(items.len(), cfg)?;
    items
        .enumerate()
        .map(|(index, raw)| {
            schema
                .validate_keyed(raw, None)
                .map_err(|source| DecodeError::InvalidRecord {
                    index,
                    identifier: peek_identifier(raw),
                    source,
                })
        })
        .collect()
}

fn decode_keyed<'a>(
    entries: impl ExactSizeIterator<Item = (&'a str, &'a Value)>,
    schema: &RecordSchema,
    cfg: &IngestConfig,
) -> Result<Vec<InputRecord>, DecodeError> {
    check_limit(entries.len(), cfg)?;
    entries
        .enumerate()
        .map(|(index, (key, raw))| {
            let identifier = key.parse::<u64>().ok().filter(|id| *id > 0);
            let result = match identifier {
                Some(id) => schema.validate_keyed(raw, Some(id)),
                None => Err(SchemaError::InvalidIdentifier(format!("{key:?}"))),
            };
            result.map_err(|source| DecodeError::InvalidRecord {
                index,
                identifier,
                source,
            })
        })
        .collect()
}

fn check_limit(actual: usize, cfg: &IngestConfig) -> Result<(), DecodeError> {
    match cfg.max_batch_records {
        Some(limit) if actual > limit => Err(DecodeError::TooManyRecords { limit, actual }),
        _ => Ok(()),
    }
}
