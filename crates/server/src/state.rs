use crate::config::ServerConfig;
use crate::error::ServerResult;
use artifacts::ArtifactStore;
use ingest::IngestConfig;
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use std::time::Instant;

/// Shared application state
#[derive(Clone)]
pub struct ServerState {
    /// Server configuration
    pub config: Arc<ServerConfig>,

    /// Serving artifact bundle; handlers take one snapshot per request
    pub store: Arc<ArtifactStore>,

    /// Decoder settings derived from `config`
    pub ingest: IngestConfig,

    /// Prometheus renderer, present once the global recorder is installed
    pub metrics_handle: Option<PrometheusHandle>,

    /// When this state was built; uptime is measured from here
    pub started_at: Instant,
}

impl ServerState {
    /// Load the artifact bundle named by `config`. Fails if either artifact
    /// is missing or unusable.
    pub fn new(config: ServerConfig) -> ServerResult<Self> {
        let store = ArtifactStore::open(config.artifact_paths())?;
        Ok(Self::with_store(config, Arc::new(store)))
    }

    /// Build state around an already opened store.
    pub fn with_store(config: ServerConfig, store: Arc<ArtifactStore>) -> Self {
        Self {
            ingest: config.ingest_config(),
            config: Arc::new(config),
            store,
            metrics_handle: None,
            started_at: Instant::now(),
        }
    }

    pub fn with_metrics_handle(mut self, handle: PrometheusHandle) -> Self {
        self.metrics_handle = Some(handle);
        self
    }

    /// Authentication is only enforced when keys are configured.
    pub fn auth_enabled(&self) -> bool {
        !self.config.api_keys.is_empty()
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }

    /// Check if API key is valid
    pub fn is_valid_api_key(&self, key: &str) -> bool {
        self.config.api_keys.contains(key)
    }
}

/// Server metadata for health checks
#[derive(Debug, serde::Serialize)]
pub struct ServerMetadata {
    pub version: String,
    pub uptime_seconds: u64,
}
