//! Gateway error types.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use ksm_secrets::{ErrorKind, SecretError};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::error;

/// Errors that stop the gateway itself.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// I/O error, e.g. the listen address is taken.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A lifecycle failure on its way out as an HTTP response.
#[derive(Debug, Error)]
#[error(transparent)]
pub struct ApiError(#[from] pub SecretError);

/// JSON error response body.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    pub message: String,
}

impl ApiError {
    /// HTTP status for this error.
    pub fn status(&self) -> StatusCode {
        match self.0.kind() {
            ErrorKind::Validation => StatusCode::BAD_REQUEST,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::AlreadyExists | ErrorKind::Conflict => StatusCode::CONFLICT,
            ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self.0, "request failed");
        }

        let body = ErrorResponse {
            error: self.0.kind().as_str().to_string(),
            field: self.0.field().map(str::to_string),
            message: self.0.to_string(),
        };

        (status, Json(body)).into_response()
    }
}

/// Result type for HTTP handlers.
pub type ApiResult<T> = std::result::Result<T, ApiError>;
