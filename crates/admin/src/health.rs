//! Liveness and readiness endpoints.

use axum::extract::State;
use axum::{Router, routing::get};

use crate::error::AppError;
use crate::state::AppState;

/// `GET /health` and `GET /health/ready`.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .with_state(state)
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
pub async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Verifies the record store answers before returning OK.
/// Returns 503 Service Unavailable if it does not.
///
/// # Errors
///
/// Returns `AppError::Store` if the store ping fails or times out.
pub async fn readiness(State(state): State<AppState>) -> Result<&'static str, AppError> {
    state.store().ping().await?;
    Ok("ready")
}
