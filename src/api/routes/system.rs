//! System handlers: health, status, live stream, OpenAPI.

use crate::api::AppState;
use crate::service::ServiceStatus;
use axum::{
    Json,
    extract::State,
    response::{
        IntoResponse,
        sse::{Event as SseEvent, KeepAlive, Sse},
    },
};
use serde_json::json;
use std::convert::Infallible;
use tokio_stream::StreamExt;

/// GET /health - Health check
#[utoipa::path(
    get,
    path = "/health",
    tag = "system",
    responses(
        (status = 200, description = "Service is healthy")
    )
)]
pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// GET /status - Whether a run is active and how the scheduler is armed
#[utoipa::path(
    get,
    path = "/status",
    tag = "system",
    responses(
        (status = 200, description = "Current run and schedule state", body = ServiceStatus)
    )
)]
pub async fn get_status(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.service.status().await)
}

/// GET /openapi.json - OpenAPI specification
#[utoipa::path(
    get,
    path = "/openapi.json",
    tag = "system",
    responses(
        (status = 200, description = "OpenAPI specification in JSON format")
    )
)]
pub async fn openapi_spec() -> impl IntoResponse {
    use crate::api::openapi::ApiDoc;
    use utoipa::OpenApi;

    Json(ApiDoc::openapi())
}

/// GET /stream - Server-sent events
///
/// Each frame is `data: {"type": "log"|"progress"|"status", "message": ...}`.
/// The log history is replayed first, then live messages follow. A viewer
/// that falls behind misses messages instead of slowing runs down.
#[utoipa::path(
    get,
    path = "/stream",
    tag = "system",
    responses(
        (status = 200, description = "Server-sent events stream (text/event-stream)", content_type = "text/event-stream")
    )
)]
pub async fn event_stream(
    State(state): State<AppState>,
) -> Sse<impl tokio_stream::Stream<Item = Result<SseEvent, Infallible>>> {
    let subscription = state.service.subscribe();
    tracing::debug!(subscriber = %subscription.id(), "stream viewer connected");

    let sse_stream = subscription
        .into_stream()
        .filter_map(|message| match serde_json::to_string(&message.to_record()) {
            Ok(json_data) => Some(Ok(SseEvent::default().data(json_data))),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to serialize stream message");
                None
            }
        });

    Sse::new(sse_stream).keep_alive(KeepAlive::default())
}
