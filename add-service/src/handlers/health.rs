use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::json;

use crate::config::SERVICE_NAME;

/// Liveness probe; also the registry's HTTP check.
pub async fn health_check() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(json!({
            "status": "ok",
            "service": SERVICE_NAME,
            "version": env!("CARGO_PKG_VERSION")
        })),
    )
}

pub async fn readiness_check() -> StatusCode {
    StatusCode::OK
}
