//! REST API server module
//!
//! Serves the control surface of the service: starting runs, the live event
//! stream, log history, configuration and media status.

use crate::config::ApiConfig;
use crate::{Result, SubtitleService};
use axum::{
    Router,
    http::HeaderValue,
    middleware,
    routing::{get, post},
};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub mod auth;
pub mod console;
pub mod error_response;
pub mod openapi;
pub mod routes;
pub mod state;

pub use openapi::ApiDoc;
pub use state::AppState;

/// Create the API router with all route definitions
///
/// # Routes
///
/// ## Tasks
/// - `POST /download` - Start a scan-and-download run (409 if one is running)
/// - `POST /scan` - Per-path video and missing-subtitle counts
/// - `GET /logs` - Log history
///
/// ## Configuration
/// - `GET /config` - Get current config (secrets redacted)
/// - `POST /config` - Replace config, persist it and re-arm the scheduler
/// - `POST /test-webhook` - Send a test notification
///
/// ## System
/// - `GET /health` - Health check
/// - `GET /status` - Run and schedule state
/// - `GET /stream` - Server-sent events: history, then live messages
/// - `GET /openapi.json` - OpenAPI specification
/// - `GET /swagger-ui` - Interactive Swagger UI documentation (if enabled)
///
/// ## Console
/// - `GET /` - Browser console page (if enabled)
/// - `GET /static/*path` - Console script and stylesheet
///
/// The console routes sit outside the API key check; the page holds no data
/// and every call it makes goes through the protected routes.
pub fn create_router(service: SubtitleService, api: &ApiConfig) -> Router {
    let state = AppState::new(service);

    let router = Router::new()
        // Tasks
        .route("/download", post(routes::start_download))
        .route("/scan", post(routes::scan_media))
        .route("/logs", get(routes::get_logs))
        // Configuration
        .route("/config", get(routes::get_config))
        .route("/config", post(routes::update_config))
        .route("/test-webhook", post(routes::test_webhook))
        // System
        .route("/health", get(routes::health_check))
        .route("/status", get(routes::get_status))
        .route("/stream", get(routes::event_stream))
        .route("/openapi.json", get(routes::openapi_spec));

    // SwaggerUi serves its own copy of the document next to the UI
    let router = if api.swagger_ui {
        router.merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
    } else {
        router
    };

    let router = router.with_state(state);

    // Last layer applied runs first: Trace → CORS → Auth → Handler
    let router = if api.api_key.is_some() {
        router.layer(middleware::from_fn_with_state(
            api.api_key.clone(),
            auth::require_api_key,
        ))
    } else {
        router
    };

    let router = if api.web_ui {
        router.merge(
            Router::new()
                .route("/", get(console::index))
                .route("/static/*path", get(console::static_asset)),
        )
    } else {
        router
    };

    let router = if api.cors_enabled {
        router.layer(build_cors_layer(&api.cors_origins))
    } else {
        router
    };

    router.layer(TraceLayer::new_for_http())
}

/// Build a CORS layer based on configured origins
///
/// `"*"` or an empty list allows any origin.
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    let allow_any = origins.iter().any(|o| o == "*");

    if allow_any || origins.is_empty() {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let allowed: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse().ok()).collect();

        CorsLayer::new()
            .allow_origin(AllowOrigin::list(allowed))
            .allow_methods(Any)
            .allow_headers(Any)
    }
}

/// Start the API server on the configured bind address
///
/// Runs until the server fails or its task is aborted. API settings are read
/// once; changing them requires a restart.
///
/// # Example
///
/// ```no_run
/// use subtitlarr::{Config, SubtitleService};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let service = SubtitleService::new(Config::default(), None);
///
/// // Start API server (blocks until shutdown)
/// subtitlarr::api::start_api_server(service).await?;
/// # Ok(())
/// # }
/// ```
pub async fn start_api_server(service: SubtitleService) -> Result<()> {
    let api = service.get_config().await.api.clone();
    let bind_address = api.bind_address;

    tracing::info!(address = %bind_address, "Starting API server");

    let app = create_router(service, &api);

    let listener = TcpListener::bind(bind_address)
        .await
        .map_err(crate::error::Error::Io)?;

    tracing::info!(address = %bind_address, "API server listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .map_err(|e| crate::error::Error::ApiServerError(e.to_string()))?;

    tracing::info!("API server stopped");
    Ok(())
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;
