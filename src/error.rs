//! # Error Handling
//!
//! This module defines the application error type and how each kind of error
//! becomes an HTTP response.
//!
//! ## Response contract
//! Clients see exactly one of a few shapes:
//! - validation problems → `400` with the validator's field-error map
//! - bad credentials → `401` with the validator (carrying a non-field error)
//! - missing authentication → `401` `{"status": "401 Unauthorized", "message": ...}`
//! - CSRF failure → `403` `{"status": "403 Forbidden", "message": ...}`
//! - missing entity → `404` plain text
//! - anything else → `500` plain text, with the details only in the server log

use crate::validator::Validator;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Application-wide error type
///
/// Handlers and middleware return `AppResult<T>` and let `?` convert library
/// errors through the `#[from]` variants.
#[derive(Error, Debug)]
pub enum AppError {
    /// Storage errors (SQLx library errors)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Session load/save/renew failures
    #[error("Session error: {0}")]
    Session(#[from] crate::session::SessionError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Password hashing failed (malformed stored hash, worker pool gone)
    #[error("Password hash error: {0}")]
    PasswordHash(String),

    /// Signup with an email that is already registered
    ///
    /// Handlers turn this into a field error on `email`; it only reaches
    /// `into_response` if a caller forgot to.
    #[error("Duplicate email")]
    DuplicateEmail,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    /// No proven authentication on a protected route (401)
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Request refused before reaching its handler, e.g. CSRF mismatch (403)
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Input failed validation (400)
    #[error("Invalid input")]
    InvalidInput(Validator),

    /// Unknown email or wrong password (401). Carries a non-field error only,
    /// so the client cannot tell which of the two was wrong.
    #[error("Invalid credentials")]
    InvalidCredentials(Validator),

    #[error("Internal server error: {0}")]
    Internal(String),
}

/// Convert AppError into an HTTP response
///
/// Server-side failures are logged here, once, with their details. The client
/// only ever gets the generic status phrase for them.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::InvalidInput(form) => (StatusCode::BAD_REQUEST, Json(form)).into_response(),
            AppError::InvalidCredentials(form) => {
                (StatusCode::UNAUTHORIZED, Json(form)).into_response()
            }
            AppError::Unauthorized(message) => status_message(StatusCode::UNAUTHORIZED, &message),
            AppError::Forbidden(message) => status_message(StatusCode::FORBIDDEN, &message),
            AppError::NotFound(what) => {
                tracing::debug!("Not found: {}", what);
                plain_status(StatusCode::NOT_FOUND)
            }
            AppError::BadRequest(message) => (
                StatusCode::BAD_REQUEST,
                Json(json!({
                    "error": message,
                })),
            )
                .into_response(),
            other => {
                tracing::error!("{}", other);
                plain_status(StatusCode::INTERNAL_SERVER_ERROR)
            }
        }
    }
}

/// `{"status": "401 Unauthorized", "message": "..."}`
fn status_message(status: StatusCode, message: &str) -> Response {
    let body = Json(json!({
        "status": status_phrase(status),
        "message": message,
    }));
    (status, body).into_response()
}

/// Plain-text body holding just the canonical reason, e.g. `Not Found`.
pub fn plain_status(status: StatusCode) -> Response {
    (status, status.canonical_reason().unwrap_or_default()).into_response()
}

fn status_phrase(status: StatusCode) -> String {
    format!(
        "{} {}",
        status.as_u16(),
        status.canonical_reason().unwrap_or_default()
    )
}

/// Convenience type alias for Results using AppError
pub type AppResult<T> = Result<T, AppError>;
