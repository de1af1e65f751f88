//! Liveness and readiness handlers.

use axum::{Json, extract::State};

use super::super::types::StatusResponse;
use super::super::{AppError, AppState};

/// GET / - Liveness.
pub(crate) async fn root() -> Json<StatusResponse> {
    Json(StatusResponse::new("ok"))
}

/// GET /health - Ready when the store answers a ping.
pub(crate) async fn health(State(state): State<AppState>) -> Result<Json<StatusResponse>, AppError> {
    state
        .store
        .ping()
        .await
        .map_err(|e| AppError::Unavailable(e.to_string()))?;
    Ok(Json(StatusResponse::new("healthy")))
}
