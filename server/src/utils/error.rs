//! Unified error handling
//!
//! Application-level error type and response envelope:
//! - [`AppError`] - application error enum, converted into HTTP responses
//! - [`AppResponse`] - API response structure
//!
//! # Usage
//!
//! ```ignore
//! // Return an error
//! Err(AppError::not_found("Order o-1 not found"))
//!
//! // Return a success response
//! Ok(Json(order))
//! ```

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use tracing::error;

/// Unified API response structure
///
/// ```json
/// {
///   "code": "0000",
///   "message": "success",
///   "data": { ... }
/// }
/// ```
#[derive(Debug, Serialize)]
pub struct AppResponse<T> {
    /// Error code ("0000" means success)
    pub code: String,
    /// Message
    pub message: String,
    /// Response data
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T: Serialize> AppResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            code: "0000".to_string(),
            message: "success".to_string(),
            data: Some(data),
        }
    }
}

/// Application error enum
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    // ========== Authentication errors (4xx) ==========
    #[error("Authentication required")]
    Unauthorized,

    #[error("Token expired")]
    TokenExpired,

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Permission denied: {0}")]
    Forbidden(String),

    // ========== Business logic errors (4xx) ==========
    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Resource conflict: {0}")]
    Conflict(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Business rule violation: {0}")]
    BusinessRule(String),

    // ========== System errors (5xx) ==========
    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn unauthorized() -> Self {
        Self::Unauthorized
    }

    pub fn token_expired() -> Self {
        Self::TokenExpired
    }

    pub fn invalid_token(msg: impl Into<String>) -> Self {
        Self::InvalidToken(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn business_rule(msg: impl Into<String>) -> Self {
        Self::BusinessRule(msg.into())
    }

    pub fn database(msg: impl Into<String>) -> Self {
        Self::Database(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            // Authentication errors (401/403)
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "E1001"),
            AppError::TokenExpired => (StatusCode::UNAUTHORIZED, "E1002"),
            AppError::InvalidToken(_) => (StatusCode::UNAUTHORIZED, "E1003"),
            AppError::Forbidden(_) => (StatusCode::FORBIDDEN, "E2001"),

            // Business logic errors (4xx)
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "E4004"),
            AppError::Conflict(_) => (StatusCode::CONFLICT, "E4009"),
            AppError::Validation(_) => (StatusCode::BAD_REQUEST, "E4000"),
            AppError::BusinessRule(_) => (StatusCode::BAD_REQUEST, "E4001"),

            // System errors (5xx)
            AppError::Database(_) => (StatusCode::INTERNAL_SERVER_ERROR, "E0001"),
            AppError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "E0002"),
        };

        if status.is_server_error() {
            error!(code, error = %self, "Request failed with server error");
        }

        let body: AppResponse<()> = AppResponse {
            code: code.to_string(),
            message: self.to_string(),
            data: None,
        };

        (status, Json(body)).into_response()
    }
}

/// Result alias used by all handlers
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use axum::response::IntoResponse;

    #[test]
    fn test_error_status_mapping() {
        let resp = AppError::not_found("Order o-1 not found").into_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let resp = AppError::validation("At least one item required").into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let resp = AppError::conflict("table occupied").into_response();
        assert_eq!(resp.status(), StatusCode::CONFLICT);

        let resp = AppError::unauthorized().into_response();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_success_envelope() {
        let resp = AppResponse::success(42);
        assert_eq!(resp.code, "0000");
        assert_eq!(resp.message, "success");
        assert_eq!(resp.data, Some(42));
    }
}
