use artifacts::ArtifactLoadError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use digitrec::PipelineError;
use ingest::DecodeError;
use serde::{Deserialize, Serialize};
use serde_json::json;

pub type ServerResult<T> = Result<T, ServerError>;

/// Server error types
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Payload too large: max {0}MB allowed")]
    PayloadTooLarge(usize),

    /// The request body was rejected before any artifact ran.
    #[error("{0}")]
    Decode(DecodeError),

    /// Server-side invariant violation inside the pipeline.
    #[error("Pipeline fault: {0}")]
    Pipeline(PipelineError),

    #[error("Artifact error: {0}")]
    Artifacts(#[from] ArtifactLoadError),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Not found")]
    NotFound,
}

/// API error response structure
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl From<DecodeError> for ServerError {
    fn from(err: DecodeError) -> Self {
        ServerError::Decode(err)
    }
}

impl From<PipelineError> for ServerError {
    fn from(err: PipelineError) -> Self {
        match err {
            PipelineError::Decode(err) => ServerError::Decode(err),
            other => ServerError::Pipeline(other),
        }
    }
}

impl ServerError {
    /// Get HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            ServerError::Authentication(_) => StatusCode::UNAUTHORIZED,
            ServerError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ServerError::NotFound => StatusCode::NOT_FOUND,
            ServerError::Decode(DecodeError::MalformedPayload(_)) => StatusCode::BAD_REQUEST,
            ServerError::Decode(DecodeError::TooManyRecords { .. }) => {
                StatusCode::PAYLOAD_TOO_LARGE
            }
            ServerError::Decode(DecodeError::InvalidRecord { .. }) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            ServerError::Pipeline(_)
            | ServerError::Artifacts(_)
            | ServerError::Internal(_)
            | ServerError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get error code string
    pub fn error_code(&self) -> &'static str {
        match self {
            ServerError::Authentication(_) => "AUTH_FAILED",
            ServerError::BadRequest(_) => "BAD_REQUEST",
            ServerError::PayloadTooLarge(_) => "PAYLOAD_TOO_LARGE",
            ServerError::Decode(DecodeError::MalformedPayload(_)) => "MALFORMED_PAYLOAD",
            ServerError::Decode(DecodeError::TooManyRecords { .. }) => "TOO_MANY_RECORDS",
            ServerError::Decode(DecodeError::InvalidRecord { .. }) => "SCHEMA_ERROR",
            ServerError::Pipeline(_) => "PIPELINE_FAULT",
            ServerError::Artifacts(_) => "ARTIFACT_ERROR",
            ServerError::Internal(_) => "INTERNAL_ERROR",
            ServerError::Config(_) => "CONFIG_ERROR",
            ServerError::NotFound => "NOT_FOUND",
        }
    }

    /// Structured pointer at the offending record, when there is one.
    fn details(&self) -> Option<serde_json::Value> {
        match self {
            ServerError::Decode(DecodeError::InvalidRecord {
                index,
                identifier,
                source,
            }) => Some(json!({
                "index": index,
                "identifier": identifier,
                "field": source.field(),
                "reason": source.to_string(),
            })),
            ServerError::Decode(DecodeError::TooManyRecords { limit, actual }) => {
                Some(json!({ "limit": limit, "actual": actual }))
            }
            _ => None,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, code = self.error_code(), "request_fault");
        }

        let body = ErrorResponse {
            error: ErrorDetail {
                code: self.error_code().to_string(),
                message: self.to_string(),
                details: self.details(),
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<std::net::AddrParseError> for ServerError {
    fn from(err: std::net::AddrParseError) -> Self {
        ServerError::Config(format!("Invalid address: {err}"))
    }
}
