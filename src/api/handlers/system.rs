//! System endpoints: health check.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;

use crate::api::dto::HealthResponse;
use crate::app_state::AppState;

/// `GET /health` — Service health and backend connectivity.
///
/// Reports current queue/store connectivity and the dispatcher's depth
/// and drop counters. The service itself always answers 200; degraded
/// backends are reflected in the body, since ingress keeps accepting
/// events regardless.
#[utoipa::path(
    get,
    path = "/health",
    tag = "System",
    summary = "Health check",
    description = "Returns backend connectivity flags and fire-and-forget dispatcher metrics.",
    responses(
        (status = 200, description = "Current service health", body = HealthResponse),
    )
)]
pub async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    let queue_connected = state.queue.is_connected();
    let store_connected = state.store.is_connected();
    let status = if queue_connected && store_connected {
        "healthy"
    } else {
        "degraded"
    };

    (
        StatusCode::OK,
        Json(HealthResponse {
            status: status.to_string(),
            queue_connected,
            store_connected,
            dispatch: state.dispatcher.metrics(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            timestamp: Utc::now().to_rfc3339(),
        }),
    )
}

/// System routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/health", get(health_handler))
}
