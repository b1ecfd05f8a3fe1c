//! Event ingress handler.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};
use serde_json::Value;

use crate::api::dto::EventResponse;
use crate::app_state::AppState;
use crate::error::{ErrorResponse, RelayError};
use crate::service::Job;

/// `POST /event` — Accept an event and relay it to the queue.
///
/// Fire-and-forget: the 200 acknowledgement is produced before the
/// queue send is confirmed, and the send's outcome is never observed by
/// the caller. Exactly one send job is dispatched per valid request.
///
/// # Errors
///
/// Returns [`RelayError::MissingMsg`] when the body has no
/// string-valued `msg` key; the queue is not touched in that case.
#[utoipa::path(
    post,
    path = "/event",
    tag = "Events",
    summary = "Submit an event",
    description = "Dispatches the event to the worker queue and acknowledges immediately, before the send is confirmed.",
    request_body = crate::api::dto::EventRequest,
    responses(
        (status = 200, description = "Event accepted", body = EventResponse),
        (status = 400, description = "Payload has no 'msg' key", body = ErrorResponse),
    )
)]
pub async fn post_event(
    State(state): State<AppState>,
    Json(payload): Json<Value>,
) -> Result<impl IntoResponse, RelayError> {
    let Some(msg) = payload.get("msg").and_then(Value::as_str) else {
        tracing::warn!("Missing 'msg' key in the payload.");
        return Err(RelayError::MissingMsg);
    };

    state.dispatcher.dispatch(Job::Send(msg.to_string()));

    Ok((
        StatusCode::OK,
        Json(EventResponse {
            status: format!("Message received: {msg}"),
        }),
    ))
}

/// Event routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/event", post(post_event))
}
