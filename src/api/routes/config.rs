//! Configuration handlers.

use super::MessageResponse;
use crate::api::AppState;
use crate::config::Config;
use crate::error::{ApiError, Result};
use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

/// Body of `POST /test-webhook`
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct WebhookTestResponse {
    /// Always true; failures are reported as errors
    pub success: bool,
    /// Human-readable outcome
    pub message: String,
}

/// GET /config - Get current config (secrets redacted)
#[utoipa::path(
    get,
    path = "/config",
    tag = "config",
    responses(
        (status = 200, description = "Current configuration", body = Config)
    )
)]
pub async fn get_config(State(state): State<AppState>) -> impl IntoResponse {
    let config = state.service.get_config().await;
    Json(config.redacted())
}

/// POST /config - Replace the configuration
///
/// Secrets posted back as the redaction placeholder keep their stored value.
#[utoipa::path(
    post,
    path = "/config",
    tag = "config",
    request_body(content = Config, description = "Complete configuration"),
    responses(
        (status = 200, description = "Configuration saved", body = MessageResponse),
        (status = 400, description = "Invalid configuration", body = ApiError),
        (status = 500, description = "Configuration could not be saved", body = ApiError)
    )
)]
pub async fn update_config(
    State(state): State<AppState>,
    payload: std::result::Result<Json<Config>, JsonRejection>,
) -> Response {
    let Json(mut new_config) = match payload {
        Ok(payload) => payload,
        Err(rejection) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(ApiError::validation(format!(
                    "Invalid JSON: {}",
                    rejection.body_text()
                ))),
            )
                .into_response();
        }
    };

    let current = state.service.get_config().await;
    new_config.restore_redacted(&current);

    match state.service.update_config(new_config).await {
        Ok(_) => Json(MessageResponse::new("Configuration saved successfully.")).into_response(),
        Err(e) => e.into_response(),
    }
}

/// POST /test-webhook - Send a test notification
#[utoipa::path(
    post,
    path = "/test-webhook",
    tag = "config",
    responses(
        (status = 200, description = "Test notification dispatched", body = WebhookTestResponse),
        (status = 400, description = "Notifications disabled or no URL configured", body = ApiError)
    )
)]
pub async fn test_webhook(State(state): State<AppState>) -> Result<Json<WebhookTestResponse>> {
    state.service.test_webhook().await?;
    Ok(Json(WebhookTestResponse {
        success: true,
        message: "Test notification sent! Please check your webhook service.".to_string(),
    }))
}
