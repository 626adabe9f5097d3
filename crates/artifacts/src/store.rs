use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use tracing::{info, warn};

use crate::bundle::{ArtifactBundle, ArtifactPaths};
use crate::error::ArtifactLoadError;

/// Process-wide holder of the serving bundle.
///
/// Readers take an `Arc` snapshot and keep it for the whole request, so a
/// concurrent [`reload`](ArtifactStore::reload) never mixes an old projector
/// with a new classifier.
#[derive(Debug)]
pub struct ArtifactStore {
    paths: ArtifactPaths,
    current: RwLock<Arc<ArtifactBundle>>,
    generation: AtomicU64,
}

impl ArtifactStore {
    /// Loads the bundle from `paths`. Fails without a partially built store.
    pub fn open(paths: ArtifactPaths) -> Result<Self, ArtifactLoadError> {
        let bundle = ArtifactBundle::load(&paths)?;
        Ok(Self::with_bundle(paths, bundle))
    }

    /// Wraps an already built bundle; `paths` are used by later reloads.
    pub fn with_bundle(paths: ArtifactPaths, bundle: ArtifactBundle) -> Self {
        Self {
            paths,
            current: RwLock::new(Arc::new(bundle)),
            generation: AtomicU64::new(1),
        }
    }

    /// The bundle currently serving.
    pub fn snapshot(&self) -> Arc<ArtifactBundle> {
        let guard = self
            .current
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        Arc::clone(&guard)
    }

    /// Loads a fresh bundle and installs it in one step. On failure the
    /// current bundle stays in place and the error is returned.
    pub fn reload(&self) -> Result<Arc<ArtifactBundle>, ArtifactLoadError> {
        let fresh = match ArtifactBundle::load(&self.paths) {
            Ok(bundle) => Arc::new(bundle),
            Err(err) => {
                warn!(error = %err, generation = self.generation(), "artifacts_reload_rejected");
                return Err(err);
            }
        };

        {
            let mut guard = self
                .current
                .write()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            *guard = Arc::clone(&fresh);
        }
        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        info!(generation, digest = ?fresh.info().digest, "artifacts_reloaded");
        Ok(fresh)
    }

    /// Number of bundles installed so far, starting at 1.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    pub fn paths(&self) -> &ArtifactPaths {
        &self.paths
    }
}
