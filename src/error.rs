// src/error.rs

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::fmt;

use crate::services::error::{AttemptError, EligibilityError, IntegrityError, StateError};

/// Global Application Error Enum.
/// Centralizes error handling and mapping to HTTP responses.
#[derive(Debug)]
pub enum AppError {
    // 500 Internal Server Error
    InternalServerError(String),

    // 400 Bad Request
    BadRequest(String),

    // 401 Unauthorized
    AuthError(String),

    // 403 Forbidden (not enrolled, foreign attempt)
    Forbidden(String),

    // 404 Not Found
    NotFound(String),

    // 409 Conflict (e.g., quiz already passed, attempt already closed)
    Conflict(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl std::error::Error for AppError {}

/// Implements `IntoResponse` for `AppError`.
/// Converts the error into a JSON response with appropriate HTTP status code.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::InternalServerError(msg) => {
                tracing::error!("Internal Server Error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error".to_string(),
                )
            }
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::AuthError(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),
        };
        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

/// Maps the engine's failure taxonomy onto HTTP semantics.
///
/// * Eligibility: not enrolled is 403, already passed is 409.
/// * State: foreign attempt is 403, attempt not open is 409.
/// * Validation: 400, nothing was persisted.
/// * Integrity: double close is 409, corrupt bank or attempt data is 500.
impl From<AttemptError> for AppError {
    fn from(err: AttemptError) -> Self {
        let message = err.to_string();
        match err {
            AttemptError::Eligibility(EligibilityError::NotEnrolled { .. }) => {
                AppError::Forbidden(message)
            }
            AttemptError::Eligibility(EligibilityError::AlreadyPassed { .. }) => {
                AppError::Conflict(message)
            }
            AttemptError::State(StateError::NotOwner { .. }) | AttemptError::Forbidden { .. } => {
                AppError::Forbidden(message)
            }
            AttemptError::State(StateError::NotOpen { .. }) => AppError::Conflict(message),
            AttemptError::Validation(_) => AppError::BadRequest(message),
            AttemptError::Integrity(IntegrityError::AlreadyClosed { .. }) => {
                AppError::Conflict(message)
            }
            AttemptError::Integrity(_) | AttemptError::Database(_) => {
                AppError::InternalServerError(message)
            }
            AttemptError::QuizNotFound(_) | AttemptError::AttemptNotFound(_) => {
                AppError::NotFound(message)
            }
        }
    }
}

/// Converts `sqlx::Error` into `AppError::InternalServerError`.
/// Allows using `?` operator on database queries.
impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::InternalServerError(err.to_string())
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::BadRequest(err.to_string())
    }
}
