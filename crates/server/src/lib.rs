//! HTTP batch-prediction API for the digitrec digit classifier.
//!
//! Loads the projector and classifier artifacts once at startup, then serves
//! batch predictions over REST:
//!
//! - **Prediction**: decode, project, classify and encode one batch per request
//! - **Model metadata**: which artifact bundle is serving, and since when
//! - **Health & Metrics**: liveness and readiness checks plus Prometheus metrics
//!
//! # Features
//!
//! - **Authentication**: optional API keys (`X-API-Key` or `Authorization: Bearer`)
//! - **Middleware**: compression, CORS, request ID tracking, structured logging
//! - **Configuration**: `server.*` file plus `DIGIT_SERVER_*` environment variables
//! - **Reload**: SIGHUP swaps in freshly loaded artifacts atomically
//! - **Graceful Shutdown**: Ctrl+C and SIGTERM
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use server::ServerConfig;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ServerConfig::load()?;
//!     server::start_server(config).await?;
//!     Ok(())
//! }
//! ```
//!
//! # API Endpoints
//!
//! ## Public Endpoints
//!
//! - `GET /` - API information
//! - `GET /health` - Liveness check
//! - `GET /ready` - Readiness check with serving bundle
//! - `GET /metrics` - Prometheus metrics
//!
//! ## Protected Endpoints (API key when configured)
//!
//! - `POST /api/v1/predict` - Predict a batch (`?include_scores=true` for scores)
//! - `POST /api` - Same as `/api/v1/predict`
//! - `GET /api/v1/model` - Serving bundle metadata

pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod server;
pub mod state;
pub mod telemetry;

pub use config::ServerConfig;
pub use error::{ServerError, ServerResult};
pub use server::{build_router, start_server};
pub use state::ServerState;
