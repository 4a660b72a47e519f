//! Health endpoints.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use synd_core::health::HealthReport;

use crate::ServiceState;

/// `GET /__health` — full per-collaborator report, always 200.
pub(crate) async fn health(State(state): State<ServiceState>) -> Json<HealthReport> {
    Json(state.health.health().await)
}

/// `GET /__gtg` — 200 when the gating collaborators respond, 503 otherwise.
pub(crate) async fn good_to_go(State(state): State<ServiceState>) -> (StatusCode, String) {
    match state.health.good_to_go().await {
        Ok(()) => (StatusCode::OK, "OK".to_string()),
        Err(message) => (StatusCode::SERVICE_UNAVAILABLE, message),
    }
}
