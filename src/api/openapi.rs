//! OpenAPI documentation and schema generation
//!
//! Defines the OpenAPI specification for the subtitlarr REST API using
//! utoipa for compile-time spec generation.

use utoipa::OpenApi;

/// OpenAPI documentation for the subtitlarr REST API
///
/// The document is served at:
/// - `/openapi.json` - JSON format OpenAPI specification
/// - `/swagger-ui` - Interactive Swagger UI documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "subtitlarr REST API",
        version = "1.0.0",
        description = "Start subtitle scan-and-download runs, follow their output live, and manage configuration",
        license(
            name = "MIT OR Apache-2.0"
        )
    ),
    servers(
        (url = "http://localhost:5000", description = "Local server")
    ),
    paths(
        // Tasks
        crate::api::routes::start_download,
        crate::api::routes::scan_media,
        crate::api::routes::get_logs,

        // Configuration
        crate::api::routes::get_config,
        crate::api::routes::update_config,
        crate::api::routes::test_webhook,

        // System
        crate::api::routes::health_check,
        crate::api::routes::get_status,
        crate::api::routes::openapi_spec,
        crate::api::routes::event_stream,
    ),
    components(schemas(
        // Core types from types.rs
        crate::types::EventKind,
        crate::types::StreamRecord,
        crate::types::PathStatus,
        crate::types::RunSummary,

        // Service state
        crate::service::ServiceStatus,
        crate::service::ScheduleStatus,

        // Config types from config.rs
        crate::config::Config,
        crate::config::Credentials,
        crate::config::ProviderCredentials,
        crate::config::NotificationConfig,
        crate::config::WebhookType,
        crate::config::ApiConfig,
        crate::config::ToolsConfig,

        // API request/response types from routes
        crate::api::routes::MessageResponse,
        crate::api::routes::ScanResponse,
        crate::api::routes::WebhookTestResponse,

        // Error types from error.rs
        crate::error::ApiError,
        crate::error::ErrorDetail,
    )),
    tags(
        (name = "tasks", description = "Runs - Start a scan-and-download pass, media status, log history"),
        (name = "config", description = "Configuration - Get and replace configuration, test webhooks"),
        (name = "system", description = "System endpoints - Health, status, live stream, OpenAPI spec"),
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

/// Adds the `X-Api-Key` header scheme to the document
struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = &mut openapi.components {
            components.add_security_scheme(
                "api_key",
                utoipa::openapi::security::SecurityScheme::ApiKey(
                    utoipa::openapi::security::ApiKey::Header(
                        utoipa::openapi::security::ApiKeyValue::new("X-Api-Key"),
                    ),
                ),
            );
        }
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spec_lists_every_route() {
        let spec = ApiDoc::openapi();
        for path in [
            "/download",
            "/scan",
            "/logs",
            "/config",
            "/test-webhook",
            "/health",
            "/status",
            "/openapi.json",
            "/stream",
        ] {
            assert!(spec.paths.paths.contains_key(path), "missing {path}");
        }
    }

    #[test]
    fn spec_has_schemas_and_security() {
        let spec = ApiDoc::openapi();
        let components = spec.components.unwrap();
        assert!(components.schemas.contains_key("Config"));
        assert!(components.schemas.contains_key("ApiError"));
        assert!(components.security_schemes.contains_key("api_key"));
    }
}
