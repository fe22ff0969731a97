//! Error-to-HTTP response conversion.
//!
//! Implements `IntoResponse` for [`hogar_core::Error`] so that route handlers
//! can return `Result<T, AppError>` directly.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

/// Wrapper so we can implement `IntoResponse` for an external type.
pub struct AppError {
    inner: hogar_core::Error,
}

impl AppError {
    pub fn new(inner: hogar_core::Error) -> Self {
        Self { inner }
    }
}

impl From<hogar_core::Error> for AppError {
    fn from(e: hogar_core::Error) -> Self {
        Self::new(e)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.inner.http_status())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        if status.is_server_error() {
            tracing::error!(
                status = %status,
                error = %self.inner,
                "Server error in API handler"
            );
        }

        let code = match &self.inner {
            hogar_core::Error::NotFound { .. } => "not_found",
            hogar_core::Error::InvalidRange(_) => "invalid_range",
            hogar_core::Error::Unauthorized(_) => "unauthorized",
            hogar_core::Error::Validation(_) => "validation_error",
            hogar_core::Error::Conflict(_) => "conflict",
            hogar_core::Error::Database { .. } => "database_error",
            hogar_core::Error::Io { .. } => "io_error",
            hogar_core::Error::Tool { .. } => "tool_error",
            hogar_core::Error::Internal(_) => "internal_error",
        };

        let body = json!({
            "error": self.inner.to_string(),
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_produces_404() {
        let err = AppError::new(hogar_core::Error::not_found("movie", "abc"));
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn invalid_range_produces_416() {
        let err = AppError::new(hogar_core::Error::InvalidRange("bad".into()));
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::RANGE_NOT_SATISFIABLE);
    }

    #[test]
    fn unauthorized_produces_401() {
        let err = AppError::new(hogar_core::Error::Unauthorized("bad token".into()));
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn tool_failure_produces_502() {
        let err = AppError::new(hogar_core::Error::tool("ffmpeg", "exit 1"));
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }
}
