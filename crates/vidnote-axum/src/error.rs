//! HTTP error type and mapping from core errors.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;

use vidnote_core::CoreError;

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// JSON error response body.
#[derive(Debug, Serialize)]
struct ErrorBody {
    success: bool,
    message: String,
    status: u16,
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            Self::Internal(msg) => {
                tracing::error!(error = %msg, "Internal error while handling request");
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };

        let body = ErrorBody {
            success: false,
            message,
            status: status.as_u16(),
        };

        (status, axum::Json(body)).into_response()
    }
}

impl From<CoreError> for HttpError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Validation(msg) => Self::BadRequest(msg),
            CoreError::TaskNotFound(_) => Self::NotFound("Task not found".to_string()),
            CoreError::Registry(e) => Self::Internal(e.to_string()),
        }
    }
}
