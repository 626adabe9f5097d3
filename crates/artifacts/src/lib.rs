//! Trained artifacts for the digit recognition service.
//!
//! Two artifacts are produced offline and only ever *applied* here:
//!
//! - a [`Projector`] reducing a flattened pixel vector to a short feature
//!   vector (PCA in practice), and
//! - a [`Classifier`] mapping that feature vector to a [`Digit`].
//!
//! [`ArtifactBundle::load`] reads both from disk, validates shapes and format
//! versions, and refuses to pair them when the projector's output length
//! differs from the classifier's input length. The resulting bundle is
//! immutable. [`ArtifactStore`] shares it process-wide and supports atomic
//! replacement for operational reloads.
//!
//! ```no_run
//! use artifacts::{ArtifactPaths, ArtifactStore};
//!
//! let store = ArtifactStore::open(ArtifactPaths::new(
//!     "models/projector.json",
//!     "models/classifier.json",
//! ))?;
//! let bundle = store.snapshot();
//! let (input_dim, feature_dim) = bundle.dimensions();
//! # let _ = (input_dim, feature_dim);
//! # Ok::<(), artifacts::ArtifactLoadError>(())
//! ```

mod bundle;
mod classifier;
mod digit;
mod error;
pub mod format;
mod projector;
mod store;

pub use crate::bundle::{load, ArtifactBundle, ArtifactPaths, BundleInfo};
pub use crate::classifier::{Classification, Classifier, TrainedClassifier};
pub use crate::digit::{Digit, InvalidDigit};
pub use crate::error::{ArtifactLoadError, DimensionError};
pub use crate::projector::{PcaProjector, Projector};
pub use crate::store::ArtifactStore;
