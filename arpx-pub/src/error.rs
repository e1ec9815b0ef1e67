//! Error types for arpx-pub
//!
//! **[APX-ERR-010]** Pipeline stage error taxonomy
//! **[APX-ERR-020]** API error envelope

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Pipeline stage error
///
/// Every variant is fatal to publication except `Composite`, which the
/// orchestrator downgrades to a warning on the published result.
/// Stage-local errors are never retried; the orchestrator classifies
/// them and either aborts the run or records the degradation.
#[derive(Debug, Error)]
pub enum PublishError {
    /// Session directory could not be created or populated (storage fault)
    #[error("session allocation failed: {0}")]
    Allocation(String),

    /// Upload rejected before a session was allocated
    #[error("invalid upload: {0}")]
    InvalidInput(String),

    /// Video transcoder reported failure
    #[error("video transcode failed: {0}")]
    Transcode(String),

    /// Image-target compiler reported failure
    #[error("target compile failed: {0}")]
    TargetCompile(String),

    /// QR encoder reported failure
    #[error("QR encode failed: {0}")]
    QrEncode(String),

    /// Hand-out compositing failed (degraded, non-fatal)
    #[error("composite failed: {0}")]
    Composite(String),

    /// Entry page could not be written
    #[error("page materialization failed: {0}")]
    Materialize(String),

    /// A subprocess-bound stage exceeded its wall-clock budget
    #[error("{stage} stage timed out: {tool} exceeded {limit_secs}s")]
    Timeout {
        stage: &'static str,
        tool: String,
        limit_secs: u64,
    },
}

impl PublishError {
    /// Stable stage name for API responses and operator logs
    pub fn stage(&self) -> &'static str {
        match self {
            PublishError::Allocation(_) => "allocation",
            PublishError::InvalidInput(_) => "validation",
            PublishError::Transcode(_) => "transcode",
            PublishError::TargetCompile(_) => "target-compile",
            PublishError::QrEncode(_) => "qr-encode",
            PublishError::Composite(_) => "composite",
            PublishError::Materialize(_) => "materialize",
            PublishError::Timeout { stage, .. } => stage,
        }
    }

    /// Whether this error aborts the Pipeline Run
    pub fn is_fatal(&self) -> bool {
        !matches!(self, PublishError::Composite(_))
    }
}

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Invalid request (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Internal server error (500)
    #[error("Internal server error: {0}")]
    Internal(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error
    #[error(transparent)]
    Other(#[from] anyhow::Error),

    /// arpx-common error
    #[error("Common error: {0}")]
    Common(#[from] arpx_common::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", msg),
            ApiError::Io(ref err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "IO_ERROR",
                err.to_string(),
            ),
            ApiError::Other(ref err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                err.to_string(),
            ),
            ApiError::Common(ref err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "COMMON_ERROR",
                err.to_string(),
            ),
        };

        let body = Json(json!({
            "error": {
                "code": error_code,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
