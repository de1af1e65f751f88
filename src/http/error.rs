//! HTTP error type and its mapping onto status codes.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::error;

use super::types::ErrorResponse;
use crate::order::StatusError;
use crate::repository::RepositoryError;

/// Errors returned by the HTTP handlers.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Unavailable(String),

    #[error("{0}")]
    Internal(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match self {
            Self::Internal(detail) => {
                error!(error = %detail, "request failed");
                "internal server error".to_string()
            },
            Self::Unavailable(detail) => {
                error!(error = %detail, "store unavailable");
                "service unavailable".to_string()
            },
            Self::BadRequest(msg) | Self::NotFound(msg) | Self::Conflict(msg) => msg,
        };

        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

impl From<RepositoryError> for AppError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { .. } => Self::NotFound(err.to_string()),
            RepositoryError::AlreadyExists { .. } => Self::Conflict(err.to_string()),
            RepositoryError::Encoding { .. } | RepositoryError::Store { .. } => {
                Self::Internal(err.to_string())
            },
        }
    }
}

impl From<StatusError> for AppError {
    fn from(err: StatusError) -> Self {
        Self::BadRequest(err.to_string())
    }
}
