//! Unified error handling for the admin binary.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::config::ConfigError;
use crate::db::RepositoryError;

/// Errors on the startup path and from the health endpoint.
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Connecting to or migrating the database failed.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Record store operation failed.
    #[error("Store error: {0}")]
    Store(#[from] RepositoryError),

    /// Binding or serving the health endpoint failed.
    #[error("Server error: {0}")]
    Io(#[from] std::io::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let event_id = sentry::capture_error(&self);
        tracing::error!(
            error = %self,
            sentry_event_id = %event_id,
            "Health check failed"
        );

        // Don't expose internal error details to clients
        (StatusCode::SERVICE_UNAVAILABLE, "unavailable").into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_error_display() {
        let err = AppError::Config(ConfigError::MissingEnvVar("ADMIN_DATABASE_URL".to_string()));
        assert_eq!(
            err.to_string(),
            "Configuration error: Missing environment variable: ADMIN_DATABASE_URL"
        );

        let err = AppError::Store(RepositoryError::NotFound);
        assert_eq!(err.to_string(), "Store error: not found");
    }

    #[test]
    fn test_store_error_is_unavailable() {
        let response = AppError::Store(RepositoryError::Unavailable("down".to_string()))
            .into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
