//! Unified error handling for admin.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use tidemark_core::AdminUserId;

use crate::db::RepositoryError;
use crate::services::AuthError;

/// Application-level error type for the admin panel.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Authentication backend failed.
    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// User is not authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// User lacks permission.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    const fn is_server_error(&self) -> bool {
        match self {
            Self::Database(RepositoryError::NotFound) => false,
            Self::Database(_) | Self::Auth(_) | Self::Internal(_) => true,
            _ => false,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Log server errors with Sentry
        if self.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Admin request error"
            );
        }

        let status = match &self {
            Self::Database(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
            Self::Database(_) | Self::Auth(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
        };

        // Don't expose internal error details to clients
        let message = match &self {
            Self::Database(RepositoryError::NotFound) => "Not found".to_string(),
            Self::Database(_) | Self::Auth(_) | Self::Internal(_) => {
                "Internal server error".to_string()
            }
            _ => self.to_string(),
        };

        (status, message).into_response()
    }
}

/// Set the Sentry user context from an admin user ID.
pub fn set_sentry_user(admin_user_id: AdminUserId, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(admin_user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("refund #42".to_string());
        assert_eq!(err.to_string(), "Not found: refund #42");

        let err = AppError::BadRequest("invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: invalid input");
    }

    #[test]
    fn test_app_error_status_codes() {
        // Test that errors map to correct HTTP status codes
        fn get_status(err: AppError) -> StatusCode {
            let response = err.into_response();
            response.status()
        }

        assert_eq!(
            get_status(AppError::NotFound("test".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::Unauthorized("test".to_string())),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            get_status(AppError::Forbidden("test".to_string())),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            get_status(AppError::BadRequest("test".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::Internal("test".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            get_status(AppError::Database(RepositoryError::NotFound)),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::Database(RepositoryError::DataCorruption(
                "bad row".to_string()
            ))),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
