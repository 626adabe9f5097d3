//! Shape of one input record.
//!
//! A record is a JSON object with:
//!
//! - an identifier under `identifier`, `ImageId`, or `id` (first present wins),
//!   a positive integer;
//! - `pixels`, an array of exactly `input_dim` numbers;
//! - optionally `label`, a digit given as an integer (`3`) or a one-character
//!   string (`"3"`). `null` counts as absent.
use artifacts::{BundleInfo, Digit};
use serde_json::{Map, Value};
use tracing::debug;

use crate::config::IngestConfig;
use crate::error::SchemaError;
use crate::types::{InputRecord, PixelVector};

/// Accepted identifier field names, in lookup order.
pub const IDENTIFIER_FIELDS: [&str; 3] = ["identifier", "ImageId", "id"];
pub const PIXELS_FIELD: &str = "pixels";
pub const LABEL_FIELD: &str = "label";

/// Validation rules for one record, derived from the serving bundle.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordSchema {
    input_dim: usize,
    labels: Vec<Digit>,
    strict_pixel_range: bool,
}

impl RecordSchema {
    /// Accepts all ten digit labels, lenient pixel range.
    pub fn new(input_dim: usize) -> Self {
        Self {
            input_dim,
            labels: Digit::all().collect(),
            strict_pixel_range: false,
        }
    }

    /// Schema matching a loaded bundle: its input dimensionality and class set.
    pub fn for_bundle(info: &BundleInfo, cfg: &IngestConfig) -> Self {
        Self {
            input_dim: info.input_dim,
            labels: info.classes.clone(),
            strict_pixel_range: cfg.strict_pixel_range,
        }
    }

    pub fn with_labels(mut self, labels: impl IntoIterator<Item = Digit>) -> Self {
        self.labels = labels.into_iter().collect();
        self
    }

    pub fn with_strict_pixel_range(mut self, strict: bool) -> Self {
        self.strict_pixel_range = strict;
        self
    }

    pub fn input_dim(&self) -> usize {
        self.input_dim
    }

    /// Validates one raw record.
    pub fn validate(&self, raw: &Value) -> Result<InputRecord, SchemaError> {
        self.validate_keyed(raw, None)
    }

    /// Validates a record whose identifier may come from the enclosing batch key.
    pub(crate) fn validate_keyed(
        &self,
        raw: &Value,
        key: Option<u64>,
    ) -> Result<InputRecord, SchemaError> {
        let obj = raw
            .as_object()
            .ok_or_else(|| SchemaError::NotAnObject(kind(raw).to_string()))?;

        let identifier = resolve_identifier(obj, key)?;
        let pixels = self.pixels(obj)?;
        let label = self.label(obj)?;

        Ok(InputRecord::new(identifier, label, pixels))
    }

    fn pixels(&self, obj: &Map<String, Value>) -> Result<PixelVector, SchemaError> {
        let values = match present(obj, PIXELS_FIELD) {
            None => return Err(SchemaError::MissingField(PIXELS_FIELD.to_string())),
            Some(Value::Array(values)) => values,
            Some(_) => return Err(SchemaError::NotASequence(PIXELS_FIELD.to_string())),
        };

        if values.len() != self.input_dim {
            return Err(SchemaError::WrongLength {
                expected: self.input_dim,
                actual: values.len(),
            });
        }

        let mut pixels = Vec::with_capacity(values.len());
        let mut out_of_range = 0usize;
        for (index, value) in values.iter().enumerate() {
            let number = value.as_f64().ok_or(SchemaError::InvalidPixel { index })?;
            let pixel = number as f32;
            if !pixel.is_finite() {
                return Err(SchemaError::InvalidPixel { index });
            }
            if !(0.0..=1.0).contains(&number) {
                if self.strict_pixel_range {
                    return Err(SchemaError::PixelOutOfRange {
                        index,
                        value: number,
                    });
                }
                out_of_range += 1;
            }
            pixels.push(pixel);
        }
        if out_of_range > 0 {
            debug!(out_of_range, "pixels_outside_unit_range");
        }

        Ok(PixelVector::new(pixels))
    }

    fn label(&self, obj: &Map<String, Value>) -> Result<Option<Digit>, SchemaError> {
        let Some(raw) = present(obj, LABEL_FIELD) else {
            return Ok(None);
        };

        let digit = match raw {
            Value::Number(n) => n.as_i64().and_then(|v| Digit::try_from(v).ok()),
            Value::String(s) => s.parse::<Digit>().ok(),
            _ => None,
        };

        match digit {
            Some(d) if self.labels.contains(&d) => Ok(Some(d)),
            _ => Err(SchemaError::UnrecognizedLabel(raw.to_string())),
        }
    }
}

/// Best-effort identifier for error reporting; never fails.
pub(crate) fn peek_identifier(raw: &Value) -> Option<u64> {
    let obj = raw.as_object()?;
    IDENTIFIER_FIELDS
        .iter()
        .find_map(|name| present(obj, name))
        .and_then(Value::as_u64)
        .filter(|id| *id > 0)
}

fn resolve_identifier(obj: &Map<String, Value>, key: Option<u64>) -> Result<u64, SchemaError> {
    let declared = IDENTIFIER_FIELDS
        .iter()
        .find_map(|name| present(obj, name))
        .map(|value| {
            value
                .as_u64()
                .filter(|id| *id > 0)
                .ok_or_else(|| SchemaError::InvalidIdentifier(value.to_string()))
        })
        .transpose()?;

    match (key, declared) {
        (Some(key), Some(declared)) if key != declared => {
            Err(SchemaError::IdentifierConflict { key, declared })
        }
        (Some(id), _) | (None, Some(id)) => Ok(id),
        (None, None) => Err(SchemaError::MissingField(IDENTIFIER_FIELDS[0].to_string())),
    }
}

/// Field value, treating `null` as absent.
fn present<'a>(obj: &'a Map<String, Value>, name: &str) -> Option<&'a Value> {
    obj.get(name).filter(|v| !v.is_null())
}

pub(crate) fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
