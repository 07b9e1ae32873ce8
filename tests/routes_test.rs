use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use serde_json::Value;
use tower::ServiceExt;

use storewatch::server::{build_job_router, build_router};
use storewatch::state::{DashboardState, ServeConfig, SharedState};

fn test_state(data_dir: &std::path::Path, auth: Option<(String, String)>) -> SharedState {
    DashboardState::new(ServeConfig {
        port: 0,
        data_dir: data_dir.to_path_buf(),
        region: "UK".to_string(),
        auth,
    })
}

async fn body_json(body: Body) -> Value {
    let bytes = to_bytes(body, usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn status_is_idle_before_any_run() {
    let dir = tempfile::tempdir().unwrap();
    let app = build_router(test_state(dir.path(), None));

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/status")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response.into_body()).await;
    assert_eq!(json["status"], "idle");
    assert_eq!(json["totalClicks"], 0);
}

#[tokio::test]
async fn results_are_null_before_any_run() {
    let dir = tempfile::tempdir().unwrap();
    let app = build_router(test_state(dir.path(), None));

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/results?environment=qa")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response.into_body()).await, Value::Null);
}

#[tokio::test]
async fn results_reject_path_traversal() {
    let dir = tempfile::tempdir().unwrap();
    let app = build_router(test_state(dir.path(), None));

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/results?environment=..%2Fsecrets")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn stop_without_a_run_is_a_conflict() {
    let dir = tempfile::tempdir().unwrap();
    let app = build_router(test_state(dir.path(), None));

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/stop-test")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn auth_layer_rejects_missing_credentials() {
    let dir = tempfile::tempdir().unwrap();
    let app = build_router(test_state(
        dir.path(),
        Some(("admin".to_string(), "secret".to_string())),
    ));

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/status")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn job_server_health_and_trivia() {
    let dir = tempfile::tempdir().unwrap();
    let app = build_job_router(test_state(dir.path(), None));

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response.into_body()).await;
    assert_eq!(json["status"], "ok");

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/trivia")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response.into_body()).await;
    assert!(json["fact"].is_string());
}

#[tokio::test]
async fn run_tests_rejects_unknown_regions() {
    let dir = tempfile::tempdir().unwrap();
    let app = build_job_router(test_state(dir.path(), None));

    let body = serde_json::json!({
        "regions": ["UK", "ZZ"],
        "environments": ["qa"]
    });
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/run-tests")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response.into_body()).await;
    assert_eq!(json["status"], "error");
}

#[tokio::test]
async fn run_tests_rejects_empty_lists() {
    let dir = tempfile::tempdir().unwrap();
    let app = build_job_router(test_state(dir.path(), None));

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/run-tests")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"regions":["UK"],"environments":[]}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unknown_job_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let app = build_job_router(test_state(dir.path(), None));

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/test-status/does-not-exist")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
