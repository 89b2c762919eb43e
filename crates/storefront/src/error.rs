//! Unified error handling with Sentry integration.
//!
//! Route handlers return `Result<T, AppError>`; server errors are captured to
//! Sentry before the client gets a generic response.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::db::RepositoryError;
use crate::filters;
use crate::routes::SiteNav;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// 404 page.
#[derive(Template, WebTemplate)]
#[template(path = "errors/not_found.html")]
pub struct NotFoundTemplate {
    pub nav: SiteNav,
}

impl NotFoundTemplate {
    #[must_use]
    pub fn new() -> Self {
        Self {
            nav: SiteNav::new(None),
        }
    }
}

impl Default for NotFoundTemplate {
    fn default() -> Self {
        Self::new()
    }
}

impl AppError {
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Database(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if let Self::NotFound(what) = &self {
            tracing::debug!(what = %what, "Not found");
            return (StatusCode::NOT_FOUND, NotFoundTemplate::new()).into_response();
        }

        let event_id = sentry::capture_error(&self);
        tracing::error!(
            error = %self,
            sentry_event_id = %event_id,
            "Request error"
        );

        // Don't expose internal error details to clients
        (self.status(), "Internal server error").into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("product linen-shirt".to_string());
        assert_eq!(err.to_string(), "Not found: product linen-shirt");
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(
            AppError::NotFound("x".to_string()).into_response().status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::Internal("x".to_string()).into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            AppError::Database(RepositoryError::Database(sqlx::Error::RowNotFound))
                .into_response()
                .status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
