//! Task handlers: start a run, media status scan, log history.

use super::MessageResponse;
use crate::api::AppState;
use crate::error::Result;
use crate::types::{PathStatus, StreamRecord, TriggerSource};
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde::Serialize;

/// Body of `POST /scan`
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ScanResponse {
    /// One entry per configured search path
    pub results: Vec<PathStatus>,
}

/// POST /download - Start a scan-and-download run
#[utoipa::path(
    post,
    path = "/download",
    tag = "tasks",
    responses(
        (status = 202, description = "Run started in the background", body = MessageResponse),
        (status = 409, description = "A run is already in progress", body = crate::error::ApiError)
    )
)]
pub async fn start_download(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let _run = state.service.start_task(TriggerSource::Manual)?;
    Ok((
        StatusCode::ACCEPTED,
        Json(MessageResponse::new("Download process started.")),
    ))
}

/// POST /scan - Video and missing-subtitle counts per search path
#[utoipa::path(
    post,
    path = "/scan",
    tag = "tasks",
    responses(
        (status = 200, description = "Per-path media status", body = ScanResponse)
    )
)]
pub async fn scan_media(State(state): State<AppState>) -> impl IntoResponse {
    let results = state.service.scan_status().await;
    Json(ScanResponse { results })
}

/// GET /logs - Log history, oldest first
#[utoipa::path(
    get,
    path = "/logs",
    tag = "tasks",
    responses(
        (status = 200, description = "Retained log entries", body = Vec<StreamRecord>)
    )
)]
pub async fn get_logs(State(state): State<AppState>) -> impl IntoResponse {
    let records: Vec<StreamRecord> = state
        .service
        .logs()
        .iter()
        .map(|message| message.to_record())
        .collect();
    Json(records)
}
