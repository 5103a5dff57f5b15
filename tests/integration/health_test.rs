//! Health endpoints.

use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode};
use serde_json::Value;
use tower::ServiceExt;

use crate::helpers::TestApp;

async fn get(app: &TestApp, path: &str) -> (StatusCode, Value) {
    let response = app
        .router()
        .oneshot(Request::builder().uri(path).body(Body::empty()).expect("request"))
        .await
        .expect("response");
    let status = response.status();
    let body = to_bytes(response.into_body(), 64 * 1024).await.expect("body");
    (status, serde_json::from_slice(&body).expect("json body"))
}

#[tokio::test]
async fn test_health() {
    let app = TestApp::spawn().await;

    let (status, body) = get(&app, "/api/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["status"], "ok");

    app.shutdown().await;
}

#[tokio::test]
async fn test_detailed_health_counts_live_connections() {
    let app = TestApp::spawn().await;
    let mut alice = app.connect("alice").await;
    alice.recv_tag("user.connected").await;

    let (status, body) = get(&app, "/api/health/detailed").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["ws_connections"], 1);
    assert_eq!(body["data"]["online_users"], 1);
    assert_eq!(body["data"]["channels"], 2);
    assert_eq!(body["data"]["metrics"]["connections_total"], 1);

    app.shutdown().await;
}
