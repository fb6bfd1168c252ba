//! HTTP (axum) middleware shared by the services and the gateway.

pub mod metrics;
pub mod rate_limit;
pub mod tracing;

use axum::{Router, middleware::from_fn};
use tower_http::trace::TraceLayer;

pub use metrics::metrics_middleware;
pub use rate_limit::{
    IpRateLimiter, UnkeyedRateLimiter, create_ip_rate_limiter, create_unkeyed_rate_limiter,
    ip_rate_limit_middleware,
};
pub use tracing::{REQUEST_ID_HEADER, current_request_id, request_id_middleware};

/// Metrics, a request span carrying the request id, and request-id
/// assignment (outermost, so the span sees the id).
pub fn with_standard_layers(router: Router) -> Router {
    router
        .layer(from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http().make_span_with(
            |request: &axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get(REQUEST_ID_HEADER)
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                ::tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                    version = ?request.version(),
                )
            },
        ))
        .layer(from_fn(request_id_middleware))
}
