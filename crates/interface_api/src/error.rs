//! API error handling
//!
//! | Error                                          | Status |
//! |------------------------------------------------|--------|
//! | unknown session, entity or slot                | 404    |
//! | step guard, transition, completed session      | 409    |
//! | missing binding at commit                      | 409    |
//! | invalid input (file, IBAN, choice)             | 422    |
//! | extraction service or sink failure             | 502    |

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use core_kernel::PortError;
use domain_import::{CommitError, ImportError};

/// API error types
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Validation error: {0}")]
    Validation(String),

    /// An upstream service (extraction, database) failed
    #[error("Upstream error: {0}")]
    Upstream(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Upstream(_) => StatusCode::BAD_GATEWAY,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            ApiError::NotFound(_) => "not_found",
            ApiError::BadRequest(_) => "bad_request",
            ApiError::Conflict(_) => "conflict",
            ApiError::Validation(_) => "validation_error",
            ApiError::Upstream(_) => "upstream_error",
            ApiError::Internal(_) => "internal_error",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::warn!(status = status.as_u16(), error = %self, "Request failed");
        }

        let message = match &self {
            ApiError::NotFound(msg)
            | ApiError::BadRequest(msg)
            | ApiError::Conflict(msg)
            | ApiError::Validation(msg)
            | ApiError::Upstream(msg)
            | ApiError::Internal(msg) => msg.clone(),
        };

        let body = ErrorResponse {
            error: self.kind().to_string(),
            message,
        };

        (status, Json(body)).into_response()
    }
}

impl From<ImportError> for ApiError {
    fn from(err: ImportError) -> Self {
        let message = err.to_string();
        match err {
            ImportError::Validation(_) => ApiError::Validation(message),
            ImportError::Extraction { .. } => ApiError::Upstream(message),
            ImportError::InvalidTransition { .. }
            | ImportError::PreconditionNotMet(_)
            | ImportError::SessionComplete => ApiError::Conflict(message),
            ImportError::NotFound { .. } => ApiError::NotFound(message),
            ImportError::Port(port) => ApiError::from(port),
            ImportError::Commit(CommitError::MissingBinding(_)) => ApiError::Conflict(message),
            ImportError::Commit(CommitError::Sink(_)) => ApiError::Upstream(message),
        }
    }
}

impl From<PortError> for ApiError {
    fn from(err: PortError) -> Self {
        let message = err.to_string();
        match err {
            PortError::NotFound { .. } => ApiError::NotFound(message),
            PortError::Validation { .. } => ApiError::Validation(message),
            PortError::Conflict { .. } => ApiError::Conflict(message),
            e if e.is_transient() => ApiError::Upstream(message),
            PortError::Transformation { .. } => ApiError::Upstream(message),
            _ => ApiError::Internal(message),
        }
    }
}
