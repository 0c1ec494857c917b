use crate::transport::http::types::{error_response, AppState};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Liveness: always `pong`, never touches the database.
#[utoipa::path(
    get,
    path = "/ping",
    responses(
        (status = 200, description = "Process is alive", body = String)
    )
)]
pub async fn ping_handler() -> &'static str {
    "pong"
}

/// Readiness: `ok` when the store answers a round trip.
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy (DB reachable)", body = String),
        (status = 503, description = "Service is unhealthy (DB unreachable)", body = String)
    )
)]
pub async fn healthcheck_handler(State(state): State<AppState>) -> Response {
    match state.store.ping().await {
        Ok(()) => (StatusCode::OK, "ok").into_response(),
        Err(e) => {
            tracing::warn!(error = %e, "Health check failed");
            error_response(
                StatusCode::SERVICE_UNAVAILABLE,
                &format!("DB ping failed: {}", e),
            )
        }
    }
}
