//! API error types with HTTP response mapping.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use common::Status;
use orchestrator::{ErrorKind, ErrorResponse, OrchestratorError};
use thiserror::Error;

/// API-level error type that maps to HTTP responses.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Path or body the orchestrator never got to see.
    #[error("{message}")]
    BadRequest { status: Status, message: String },

    #[error(transparent)]
    Orchestrator(#[from] OrchestratorError),
}

impl ApiError {
    pub fn bad_request(status: Status, message: impl Into<String>) -> Self {
        ApiError::BadRequest {
            status,
            message: message.into(),
        }
    }

    /// Returns the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            ApiError::Orchestrator(err) => match err.kind() {
                ErrorKind::Validation => StatusCode::BAD_REQUEST,
                ErrorKind::NotFound => StatusCode::NOT_FOUND,
                ErrorKind::Conflict => StatusCode::CONFLICT,
                ErrorKind::Gateway => StatusCode::BAD_GATEWAY,
                ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    fn body(&self) -> ErrorResponse {
        match self {
            ApiError::BadRequest { status, message } => ErrorResponse {
                status: *status,
                message: message.clone(),
            },
            ApiError::Orchestrator(err) => ErrorResponse::from(err),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let code = self.status_code();
        let body = self.body();

        if code.is_server_error() {
            tracing::error!(error = %self, status = %body.status, "request failed");
        } else {
            tracing::debug!(error = %self, status = %body.status, "request rejected");
        }
        metrics::counter!("api_errors_total", "status" => body.status.as_str()).increment(1);

        (code, Json(body)).into_response()
    }
}
