use super::*;
use crate::Config;
use crate::test_helpers::{FakeFetcher, FakeScanner};
use axum::body::Body;
use axum::http::{Request, StatusCode};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

mod config;
mod tasks;

fn test_config() -> Config {
    Config {
        search_paths: vec![PathBuf::from("/media")],
        languages: vec!["en".to_string()],
        ..Default::default()
    }
}

/// Service over fake collaborators; the fetcher decides how runs behave
fn test_service(config: Config, fetcher: FakeFetcher) -> SubtitleService {
    SubtitleService::with_collaborators(
        config,
        None,
        FakeScanner::with(&["/media/a.mkv", "/media/b.mkv"]),
        Arc::new(fetcher),
    )
}

fn test_router(service: &SubtitleService, api: &ApiConfig) -> Router {
    create_router(service.clone(), api)
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post(uri: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

fn post_json(uri: &str, body: String) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body))
        .unwrap()
}

#[tokio::test]
async fn test_api_server_spawns() {
    let mut config = test_config();
    // Port 0 = OS assigns a free port
    config.api.bind_address = "127.0.0.1:0".parse().unwrap();
    let service = test_service(config, FakeFetcher::default());

    let api_handle = service.spawn_api_server();
    tokio::time::sleep(Duration::from_millis(100)).await;

    assert!(!api_handle.is_finished(), "server exited early");
    api_handle.abort();
}

#[tokio::test]
async fn test_cors_enabled() {
    let service = test_service(test_config(), FakeFetcher::default());
    let app = test_router(&service, &ApiConfig::default());

    let request = Request::builder()
        .uri("/health")
        .header("Origin", "http://localhost:3000")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(
        response
            .headers()
            .contains_key("access-control-allow-origin"),
        "CORS header should be present when CORS is enabled"
    );
}

#[tokio::test]
async fn test_cors_disabled() {
    let service = test_service(test_config(), FakeFetcher::default());
    let api = ApiConfig {
        cors_enabled: false,
        ..Default::default()
    };
    let app = test_router(&service, &api);

    let request = Request::builder()
        .uri("/health")
        .header("Origin", "http://localhost:3000")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert!(
        !response
            .headers()
            .contains_key("access-control-allow-origin")
    );
}

#[tokio::test]
async fn test_api_key_required_when_configured() {
    let service = test_service(test_config(), FakeFetcher::default());
    let api = ApiConfig {
        api_key: Some("secret".to_string()),
        ..Default::default()
    };
    let app = test_router(&service, &api);

    let response = app.clone().oneshot(get("/status")).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "unauthorized");

    let request = Request::builder()
        .uri("/status")
        .header(auth::API_KEY_HEADER, "secret")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_swagger_ui_can_be_disabled() {
    let service = test_service(test_config(), FakeFetcher::default());
    let api = ApiConfig {
        swagger_ui: false,
        ..Default::default()
    };
    let app = test_router(&service, &api);

    let response = app.oneshot(get("/api-docs/openapi.json")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
