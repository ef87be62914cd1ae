use super::*;
use crate::config::REDACTED;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config_with_secrets() -> Config {
    let mut config = test_config();
    config.credentials.opensubtitles.username = "alice".to_string();
    config.credentials.opensubtitles.password = "hunter2".to_string();
    config.notifications.webhook_url = "https://discord.com/api/webhooks/123/token".to_string();
    config
}

#[tokio::test]
async fn test_get_config_redacts_secrets() {
    let service = test_service(config_with_secrets(), FakeFetcher::default());
    let app = test_router(&service, &ApiConfig::default());

    let response = app.oneshot(get("/config")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["credentials"]["opensubtitles"]["username"], "alice");
    assert_eq!(body["credentials"]["opensubtitles"]["password"], REDACTED);
    assert_eq!(
        body["notifications"]["webhook_url"],
        format!("https://discord.com/{REDACTED}")
    );
    assert_eq!(body["languages"][0], "en");
}

#[tokio::test]
async fn test_post_config_keeps_redacted_secrets() {
    let service = test_service(config_with_secrets(), FakeFetcher::default());
    let app = test_router(&service, &ApiConfig::default());

    // Echo back what GET returned, with one real change
    let response = app.clone().oneshot(get("/config")).await.unwrap();
    let mut body = body_json(response).await;
    body["languages"] = serde_json::json!(["en", "fr"]);

    let response = app
        .oneshot(post_json("/config", body.to_string()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let reply = body_json(response).await;
    assert_eq!(reply["message"], "Configuration saved successfully.");

    let stored = service.get_config().await;
    assert_eq!(stored.languages, vec!["en", "fr"]);
    assert_eq!(stored.credentials.opensubtitles.password, "hunter2");
    assert_eq!(
        stored.notifications.webhook_url,
        "https://discord.com/api/webhooks/123/token"
    );
}

#[tokio::test]
async fn test_post_config_rearms_scheduler() {
    let service = test_service(test_config(), FakeFetcher::default());
    let app = test_router(&service, &ApiConfig::default());

    let mut config = test_config();
    config.schedule_enabled = true;
    config.schedule_interval_minutes = 15;
    let response = app
        .clone()
        .oneshot(post_json("/config", serde_json::to_string(&config).unwrap()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.oneshot(get("/status")).await.unwrap();
    let status = body_json(response).await;
    assert_eq!(status["schedule"]["armed"], true);
    assert_eq!(status["schedule"]["interval_minutes"], 15);

    service.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_post_config_rejects_malformed_json() {
    let service = test_service(test_config(), FakeFetcher::default());
    let app = test_router(&service, &ApiConfig::default());

    let response = app
        .oneshot(post_json("/config", "{not json".to_string()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "validation_error");
    assert!(
        body["error"]["message"]
            .as_str()
            .unwrap()
            .starts_with("Invalid JSON")
    );
    assert_eq!(service.get_config().await.languages, vec!["en"]);
}

#[tokio::test]
async fn test_post_config_rejects_invalid_interval() {
    let service = test_service(test_config(), FakeFetcher::default());
    let app = test_router(&service, &ApiConfig::default());

    let mut config = test_config();
    config.schedule_enabled = true;
    config.schedule_interval_minutes = 0;
    let response = app
        .oneshot(post_json("/config", serde_json::to_string(&config).unwrap()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "config_error");
    assert!(!service.get_config().await.schedule_enabled);
}

#[tokio::test]
async fn test_webhook_test_requires_enabled_notifications() {
    let service = test_service(test_config(), FakeFetcher::default());
    let app = test_router(&service, &ApiConfig::default());

    let response = app.oneshot(post("/test-webhook")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "notifications_disabled");
}

#[tokio::test]
async fn test_webhook_test_posts_to_configured_url() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/hook"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let mut config = test_config();
    config.notifications.enabled = true;
    config.notifications.webhook_url = format!("{}/hook", server.uri());
    let service = test_service(config, FakeFetcher::default());
    let app = test_router(&service, &ApiConfig::default());

    let response = app.oneshot(post("/test-webhook")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["success"], true);

    // Delivery happens in the background
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            if !server.received_requests().await.unwrap().is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .unwrap();

    let requests = server.received_requests().await.unwrap();
    let payload: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(
        payload["content"],
        "Subtitlarr: This is a test notification from Subtitlarr!"
    );
}
