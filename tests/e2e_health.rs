//! E2E tests for health check and basic server functionality

mod common;

use common::TestServer;

#[tokio::test]
async fn test_health_check() {
    let server = TestServer::new().await;

    let response = server
        .browser()
        .client
        .get(server.url("/health"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    assert_eq!(response.text().await.unwrap(), "OK");
}

#[tokio::test]
async fn test_about_page_renders_for_guests() {
    let server = TestServer::new().await;

    let response = server
        .browser()
        .client
        .get(server.url("/about"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    assert!(response.text().await.unwrap().contains("<h1>About</h1>"));
}

#[tokio::test]
async fn test_static_files_are_served() {
    let server = TestServer::new().await;

    let response = server
        .browser()
        .client
        .get(server.url("/public/css/style.css"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    assert!(response.text().await.unwrap().contains(".flash-success"));
}

#[tokio::test]
async fn test_metrics_endpoint_exposes_prometheus_text() {
    let server = TestServer::new().await;

    let response = server
        .browser()
        .client
        .get(server.url("/metrics"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    let content_type = response
        .headers()
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert!(content_type.starts_with("text/plain"));
}

#[tokio::test]
async fn test_404_for_unknown_story() {
    let server = TestServer::new().await;

    let response = server
        .browser()
        .client
        .get(server.url("/stories/show/does-not-exist"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 404);
    assert!(response.text().await.unwrap().contains("Page not found"));
}
