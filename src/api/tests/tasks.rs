use super::*;
use crate::types::TriggerSource;
use tokio::sync::Notify;

#[tokio::test]
async fn test_download_starts_run_then_conflicts() {
    let gate = Arc::new(Notify::new());
    let service = test_service(test_config(), FakeFetcher::gated(gate.clone()));
    let app = test_router(&service, &ApiConfig::default());

    let response = app.clone().oneshot(post("/download")).await.unwrap();
    assert_eq!(response.status(), StatusCode::ACCEPTED);
    let body = body_json(response).await;
    assert_eq!(body["message"], "Download process started.");

    let response = app.clone().oneshot(post("/download")).await.unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "task_in_progress");
    assert_eq!(
        body["error"]["message"],
        "A download task is already in progress."
    );

    tokio::time::timeout(Duration::from_secs(5), async {
        while service.is_running() {
            gate.notify_one();
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .unwrap();

    let response = app.oneshot(post("/download")).await.unwrap();
    assert_eq!(response.status(), StatusCode::ACCEPTED);
    gate.notify_one();
    gate.notify_one();
}

#[tokio::test]
async fn test_logs_returns_history_records() {
    let service = test_service(test_config(), FakeFetcher::default());
    service.event_log().append("first line");
    service.event_log().append("second line");
    let app = test_router(&service, &ApiConfig::default());

    let response = app.oneshot(get("/logs")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    let records = body.as_array().unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0]["type"], "log");
    // Log lines carry a [HH:MM:SS] prefix
    assert!(records[0]["message"].as_str().unwrap().ends_with("] first line"));
    assert!(records[1]["message"].as_str().unwrap().ends_with("] second line"));
}

#[tokio::test]
async fn test_scan_reports_each_search_path() {
    let service = test_service(test_config(), FakeFetcher::default());
    let app = test_router(&service, &ApiConfig::default());

    let response = app.oneshot(post("/scan")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    let results = body["results"].as_array().unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0]["path"], "/media");
    assert_eq!(results[0]["videos"], 2);
    // Neither fake video has an .en.srt next to it
    assert_eq!(results[0]["missing"], 2);
    assert!(results[0].get("error").is_none());
}

#[tokio::test]
async fn test_scan_does_not_need_the_task_guard() {
    let gate = Arc::new(Notify::new());
    let service = test_service(test_config(), FakeFetcher::gated(gate.clone()));
    let _run = service.start_task(TriggerSource::Manual).unwrap();
    let app = test_router(&service, &ApiConfig::default());

    let response = app.oneshot(post("/scan")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    gate.notify_one();
    gate.notify_one();
}
