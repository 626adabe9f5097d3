//! Validated record types.
//!
//! ```text
//! raw JSON record ──RecordSchema::validate──► InputRecord
//!                                            ├── identifier: u64 (≥ 1)
//!                                            ├── label: Option<Digit>
//!                                            └── pixels: PixelVector (len == input_dim)
//! ```
//!
//! Records can only be built through [`RecordSchema`](crate::RecordSchema),
//! so holding an [`InputRecord`] means its shape was checked against a
//! concrete input dimensionality.
use artifacts::Digit;

/// Fixed-length pixel intensities, nominally in `[0, 1]`.
#[derive(Debug, Clone, PartialEq)]
pub struct PixelVector(Vec<f32>);

impl PixelVector {
    pub(crate) fn new(values: Vec<f32>) -> Self {
        Self(values)
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl AsRef<[f32]> for PixelVector {
    fn as_ref(&self) -> &[f32] {
        &self.0
    }
}

/// One validated record of a batch. Immutable once decoded.
#[derive(Debug, Clone, PartialEq)]
pub struct InputRecord {
    identifier: u64,
    label: Option<Digit>,
    pixels: PixelVector,
}

impl InputRecord {
    pub(crate) fn new(identifier: u64, label: Option<Digit>, pixels: PixelVector) -> Self {
        Self {
            identifier,
            label,
            pixels,
        }
    }

    /// Caller-assigned identifier, always ≥ 1.
    pub fn identifier(&self) -> u64 {
        self.identifier
    }

    /// Ground truth, when the caller supplied one.
    pub fn label(&self) -> Option<Digit> {
        self.label
    }

    pub fn pixels(&self) -> &PixelVector {
        &self.pixels
    }
}
