use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use service_core::infra::Infrastructure;

use crate::config::SERVICE_NAME;

pub async fn health_check(State(infra): State<Infrastructure>) -> impl IntoResponse {
    let stores = infra.health().await;
    let status = if stores.is_healthy() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(json!({
            "status": if stores.is_healthy() { "ok" } else { "degraded" },
            "service": SERVICE_NAME,
            "version": env!("CARGO_PKG_VERSION"),
            "stores": stores,
        })),
    )
}

pub async fn readiness_check() -> StatusCode {
    StatusCode::OK
}
