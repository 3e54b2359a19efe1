use axum::{Json,
    http::StatusCode,
    response::IntoResponse
};
use serde_json::json;
use thiserror::Error;

use crate::{auth::AuthError, pagination::PaginationError, storage::StorageError};

/// Application-level error type.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Multipart error: {0}")]
    MultipartError(String),

    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    #[error(transparent)]
    ValidationError(#[from] validator::ValidationErrors),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Pagination(#[from] PaginationError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    DatabaseError(#[from] sqlx::Error),
}

/// Convert `AppError` into an HTTP response.
impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        // Map application errors to HTTP status codes and messages
        let (status, error_message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            AppError::MultipartError(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::PayloadTooLarge(msg) => (StatusCode::PAYLOAD_TOO_LARGE, msg),
            AppError::ValidationError(errors) => (StatusCode::BAD_REQUEST, errors.to_string()),
            AppError::Storage(err) => match err {
                StorageError::FileTooLarge { .. } => (StatusCode::PAYLOAD_TOO_LARGE, err.to_string()),
                StorageError::ExtensionNotAllowed(_) => (StatusCode::UNSUPPORTED_MEDIA_TYPE, err.to_string()),
                StorageError::InvalidFolder(_) => (StatusCode::BAD_REQUEST, err.to_string()),
                StorageError::NotFound(_) => (StatusCode::NOT_FOUND, "File not found".to_string()),
                other => {
                    tracing::error!("Storage Error: {}", other);
                    (StatusCode::INTERNAL_SERVER_ERROR, "Storage error".to_string())
                }
            },
            AppError::Pagination(err) => match err {
                PaginationError::InvalidDate(_) => (StatusCode::BAD_REQUEST, err.to_string()),
                PaginationError::Database(db) => {
                    tracing::error!("Database Error: {}", db);
                    (StatusCode::INTERNAL_SERVER_ERROR, "Database error".to_string())
                }
            },
            AppError::Auth(err) => return err.into_response(),
            AppError::DatabaseError(err) => {
                tracing::error!("Database Error: {:}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Database error".to_string(),
                )
            }
        };

        // Return standardized JSON error response
        let body = Json(json!({"error": error_message}));
        (status, body).into_response()
    }
}

/// Whether a database error is a unique-constraint violation.
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error().is_some_and(|db| db.is_unique_violation())
}
