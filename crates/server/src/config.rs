use artifacts::ArtifactPaths;
use ingest::{IngestConfig, DEFAULT_MAX_BATCH_RECORDS};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{ServerError, ServerResult};

const BYTES_PER_MB: usize = 1024 * 1024;

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Server bind address
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Maximum request body size in MB
    #[serde(default = "default_max_body_size_mb")]
    pub max_body_size_mb: usize,

    /// Serialized projector artifact
    #[serde(default = "default_projector_path")]
    pub projector_path: PathBuf,

    /// Serialized classifier artifact
    #[serde(default = "default_classifier_path")]
    pub classifier_path: PathBuf,

    /// Reject pixels outside `[0, 1]` instead of passing them through
    #[serde(default)]
    pub strict_pixel_range: bool,

    /// Upper bound on records per request
    #[serde(default = "default_max_batch_records")]
    pub max_batch_records: Option<usize>,

    /// API keys; authentication is off when empty
    #[serde(default)]
    pub api_keys: HashSet<String>,

    /// Enable CORS
    #[serde(default = "default_true")]
    pub enable_cors: bool,

    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Metrics endpoint enabled
    #[serde(default = "default_true")]
    pub metrics_enabled: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            port: default_port(),
            timeout_secs: default_timeout_secs(),
            max_body_size_mb: default_max_body_size_mb(),
            projector_path: default_projector_path(),
            classifier_path: default_classifier_path(),
            strict_pixel_range: false,
            max_batch_records: default_max_batch_records(),
            api_keys: HashSet::new(),
            enable_cors: default_true(),
            log_level: default_log_level(),
            metrics_enabled: default_true(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from an optional `server.*` file, then
    /// `DIGIT_SERVER_*` environment variables.
    pub fn load() -> anyhow::Result<Self> {
        let builder = config::Config::builder()
            .add_source(config::File::with_name("server").required(false))
            .add_source(
                config::Environment::with_prefix("DIGIT_SERVER")
                    .prefix_separator("_")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("api_keys")
                    .try_parsing(true),
            );

        let config: ServerConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the server cannot run with.
    pub fn validate(&self) -> ServerResult<()> {
        if self.projector_path.as_os_str().is_empty() {
            return Err(ServerError::Config("projector_path is empty".into()));
        }
        if self.classifier_path.as_os_str().is_empty() {
            return Err(ServerError::Config("classifier_path is empty".into()));
        }
        if self.timeout_secs == 0 {
            return Err(ServerError::Config("timeout_secs must be positive".into()));
        }
        if self.max_body_size_mb == 0 {
            return Err(ServerError::Config(
                "max_body_size_mb must be positive".into(),
            ));
        }
        if self.max_body_size_mb.checked_mul(BYTES_PER_MB).is_none() {
            return Err(ServerError::Config(format!(
                "max_body_size_mb {} overflows a byte count",
                self.max_body_size_mb
            )));
        }
        self.ingest_config()
            .validate()
            .map_err(|err| ServerError::Config(err.to_string()))
    }

    /// Get the socket address to bind to
    pub fn socket_addr(&self) -> ServerResult<SocketAddr> {
        let addr_str = format!("{}:{}", self.bind_addr, self.port);
        Ok(addr_str.parse()?)
    }

    /// Get request timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Get max body size in bytes
    pub fn max_body_size(&self) -> usize {
        self.max_body_size_mb.saturating_mul(BYTES_PER_MB)
    }

    pub fn artifact_paths(&self) -> ArtifactPaths {
        ArtifactPaths::new(&self.projector_path, &self.classifier_path)
    }

    pub fn ingest_config(&self) -> IngestConfig {
        IngestConfig::default()
            .with_strict_pixel_range(self.strict_pixel_range)
            .with_max_batch_records(self.max_batch_records)
    }
}

fn default_bind_addr() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_body_size_mb() -> usize {
    64
}

fn default_projector_path() -> PathBuf {
    PathBuf::from("artifacts/projector.json")
}

fn default_classifier_path() -> PathBuf {
    PathBuf::from("artifacts/classifier.json")
}

fn default_max_batch_records() -> Option<usize> {
    Some(DEFAULT_MAX_BATCH_RECORDS)
}

fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let cfg = ServerConfig::default();
        assert_eq!(cfg.port, 8080);
        assert_eq!(cfg.timeout_secs, 30);
        assert_eq!(cfg.max_body_size_mb, 64);
        assert_eq!(cfg.max_batch_records, Some(DEFAULT_MAX_BATCH_RECORDS));
        assert!(cfg.api_keys.is_empty());
        assert!(cfg.enable_cors);
        assert!(cfg.metrics_enabled);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_socket_addr() {
        let cfg = ServerConfig::default();
        let addr = cfg.socket_addr().unwrap();
        assert_eq!(addr.port(), 8080);
    }

    #[test]
    fn test_socket_addr_rejects_bad_host() {
        let cfg = ServerConfig {
            bind_addr: "not an address".into(),
            ..ServerConfig::default()
        };
        match cfg.socket_addr() {
            Err(ServerError::Config(msg)) => assert!(msg.contains("Invalid address")),
            other => panic!("expected config error, got {other:?}"),
        }
    }

    #[test]
    fn test_validate_rejects_overflowing_body_size() {
        let cfg = ServerConfig {
            max_body_size_mb: usize::MAX,
            ..ServerConfig::default()
        };
        assert!(matches!(cfg.validate(), Err(ServerError::Config(_))));
        assert_eq!(cfg.max_body_size(), usize::MAX);

        let cfg = ServerConfig {
            max_body_size_mb: 2,
            ..ServerConfig::default()
        };
        assert_eq!(cfg.max_body_size(), 2 * 1024 * 1024);
    }

    #[test]
    fn test_artifact_paths() {
        let cfg = ServerConfig {
            projector_path: "/srv/p.json".into(),
            classifier_path: "/srv/c.json".into(),
            ..ServerConfig::default()
        };
        let paths = cfg.artifact_paths();
        assert_eq!(paths.projector, PathBuf::from("/srv/p.json"));
        assert_eq!(paths.classifier, PathBuf::from("/srv/c.json"));
    }

    #[test]
    fn test_validate_rejects_empty_path_and_zero_limits() {
        let cfg = ServerConfig {
            projector_path: PathBuf::new(),
            ..ServerConfig::default()
        };
        assert!(matches!(cfg.validate(), Err(ServerError::Config(_))));

        let cfg = ServerConfig {
            max_batch_records: Some(0),
            ..ServerConfig::default()
        };
        assert!(matches!(cfg.validate(), Err(ServerError::Config(_))));

        let cfg = ServerConfig {
            max_batch_records: None,
            ..ServerConfig::default()
        };
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_ingest_config_follows_server_settings() {
        let cfg = ServerConfig {
            strict_pixel_range: true,
            max_batch_records: Some(5),
            ..ServerConfig::default()
        };
        let ingest = cfg.ingest_config();
        assert!(ingest.strict_pixel_range);
        assert_eq!(ingest.max_batch_records, Some(5));
    }
}
