use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use serde_json::json;
use service_core::config::EndpointConfig;
use std::sync::Arc;
use string_service::build_router;
use string_service::endpoints::StringEndpoints;
use string_service::services::BasicStringService;
use tower::ServiceExt;

fn app() -> axum::Router {
    build_router(StringEndpoints::new(
        Arc::new(BasicStringService),
        &EndpointConfig::default(),
    ))
}

async fn post(uri: &str, body: serde_json::Value) -> (StatusCode, serde_json::Value) {
    let res = app()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    let status = res.status();
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn uppercase_returns_value() {
    let (status, body) = post("/uppercase", json!({"s": "go"})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"v": "GO"}));
}

#[tokio::test]
async fn uppercase_of_empty_string_is_a_bad_request() {
    let (status, body) = post("/uppercase", json!({"s": ""})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"error": "Empty string"}));
}

#[tokio::test]
async fn count_returns_byte_length() {
    let (status, body) = post("/count", json!({"s": "hello"})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"v": 5}));
}

#[tokio::test]
async fn malformed_json_is_rejected() {
    let res = app()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/count")
                .header("content-type", "application/json")
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert!(res.status().is_client_error());
}
