use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use service_core::registry::ServiceInstance;
use tokio::sync::watch;

use crate::config::SERVICE_NAME;

/// Discovered instances per backend, as seen by the routing layer.
#[derive(Clone)]
pub struct Backends(pub Arc<Vec<(&'static str, watch::Receiver<Vec<ServiceInstance>>)>>);

impl Backends {
    pub fn counts(&self) -> BTreeMap<&'static str, usize> {
        self.0
            .iter()
            .map(|(name, rx)| (*name, rx.borrow().len()))
            .collect()
    }
}

/// Liveness; the gateway stays up while backends come and go, so only the
/// instance counts reflect their state.
pub async fn health_check(State(backends): State<Backends>) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(json!({
            "status": "ok",
            "service": SERVICE_NAME,
            "version": env!("CARGO_PKG_VERSION"),
            "backends": backends.counts(),
        })),
    )
}
