//!
//! # Custom Error Handling
//!
//! This module defines the two error types used throughout the application.
//!
//! `AuthError` is the typed result of the session core (login, logout and request
//! authorization). It never carries HTTP concerns; the boundary decides how each
//! variant is shown to a client.
//!
//! `AppError` is the error every HTTP handler returns. It implements
//! `actix_web::error::ResponseError` so handlers can use `?` and still produce JSON
//! bodies with the right status code. `From` conversions exist for `AuthError`,
//! `DirectoryError` and `validator::ValidationErrors`. A directory outage is a 503
//! wherever it surfaces.

use actix_web::{error::ResponseError, HttpResponse};
use serde_json::json;
use std::fmt;
use validator::ValidationErrors;

use crate::directory::DirectoryError;

/// Message shared by both login failure paths so callers cannot tell an unknown
/// email from a wrong password.
pub const INVALID_CREDENTIALS: &str = "Invalid email or password";

/// Failures reported by the session core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// Unknown identity or wrong password. Both cases are reported identically.
    InvalidCredentials,
    /// Logout attempted without a token.
    NotAuthenticated,
    /// Token missing, malformed, expired, revoked, or its identity is gone.
    Unauthorized,
    /// The user directory could not answer. Not an authentication verdict.
    DependencyError(String),
    /// Token signing or password hashing broke. Not caused by the caller.
    Internal(String),
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AuthError::InvalidCredentials => write!(f, "{}", INVALID_CREDENTIALS),
            AuthError::NotAuthenticated => write!(f, "User not logged in"),
            AuthError::Unauthorized => write!(f, "Unauthorized"),
            AuthError::DependencyError(msg) => write!(f, "User directory unavailable: {}", msg),
            AuthError::Internal(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for AuthError {}

impl From<DirectoryError> for AuthError {
    fn from(error: DirectoryError) -> AuthError {
        AuthError::DependencyError(error.to_string())
    }
}

/// Represents all possible errors that can occur within the application.
///
/// Each variant corresponds to a specific type of error, often carrying a message
/// detailing the issue. These errors are then converted into appropriate HTTP responses.
#[derive(Debug)]
pub enum AppError {
    /// Represents an unauthorized access attempt (HTTP 401).
    /// Typically used when authentication fails or is required but missing.
    Unauthorized(String),
    /// Represents a client-side error due to a malformed or invalid request (HTTP 400).
    BadRequest(String),
    /// The caller is authenticated but may not act on the resource (HTTP 403).
    Forbidden(String),
    /// Represents a situation where a requested resource was not found (HTTP 404).
    NotFound(String),
    /// Represents an unexpected server-side error (HTTP 500).
    InternalServerError(String),
    /// A collaborator (the user directory) is unavailable (HTTP 503).
    ServiceUnavailable(String),
    /// Represents an error due to failed input validation (HTTP 422 Unprocessable Entity).
    /// Wraps errors from the `validator` crate.
    ValidationError(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AppError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            AppError::BadRequest(msg) => write!(f, "Bad Request: {}", msg),
            AppError::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
            AppError::NotFound(msg) => write!(f, "Not Found: {}", msg),
            AppError::InternalServerError(msg) => write!(f, "Internal Server Error: {}", msg),
            AppError::ServiceUnavailable(msg) => write!(f, "Service Unavailable: {}", msg),
            AppError::ValidationError(msg) => write!(f, "Validation Error: {}", msg),
        }
    }
}

/// Converts `AppError` variants into `HttpResponse` objects.
///
/// This implementation allows Actix Web to automatically translate `AppError`
/// results from handlers into the correct HTTP status codes and JSON error responses.
impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        match self {
            AppError::Unauthorized(msg) => HttpResponse::Unauthorized().json(json!({
                "error": msg
            })),
            AppError::BadRequest(msg) => HttpResponse::BadRequest().json(json!({
                "error": msg
            })),
            AppError::Forbidden(msg) => HttpResponse::Forbidden().json(json!({
                "error": msg
            })),
            AppError::NotFound(msg) => HttpResponse::NotFound().json(json!({
                "error": msg
            })),
            AppError::InternalServerError(msg) => HttpResponse::InternalServerError().json(json!({
                "error": msg
            })),
            // Backend details stay in the logs.
            AppError::ServiceUnavailable(msg) => {
                log::warn!("dependency unavailable: {}", msg);
                HttpResponse::ServiceUnavailable()
                    .insert_header(("Retry-After", "5"))
                    .json(json!({
                        "error": "Service temporarily unavailable"
                    }))
            }
            AppError::ValidationError(msg) => HttpResponse::UnprocessableEntity().json(json!({
                "error": msg
            })),
        }
    }
}

/// Maps core authentication failures onto HTTP semantics.
///
/// `DependencyError` becomes a 503 so clients can retry, distinct from a 401.
impl From<AuthError> for AppError {
    fn from(error: AuthError) -> AppError {
        match error {
            AuthError::DependencyError(msg) => AppError::ServiceUnavailable(msg),
            AuthError::Internal(msg) => AppError::InternalServerError(msg),
            other => AppError::Unauthorized(other.to_string()),
        }
    }
}

impl From<DirectoryError> for AppError {
    fn from(error: DirectoryError) -> AppError {
        match error {
            DirectoryError::Conflict(msg) => AppError::BadRequest(msg),
            DirectoryError::Backend(msg) => AppError::ServiceUnavailable(msg),
        }
    }
}

/// Converts `validator::ValidationErrors` into `AppError::ValidationError`.
///
/// The detailed validation messages are preserved.
impl From<ValidationErrors> for AppError {
    fn from(error: ValidationErrors) -> AppError {
        AppError::ValidationError(error.to_string())
    }
}
