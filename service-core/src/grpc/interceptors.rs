//! gRPC interceptors and metadata helpers.
//!
//! Server side: [`trace_context_interceptor`] records the caller's trace and
//! request id, [`metrics_interceptor`] counts incoming calls. Client side:
//! [`propagate_context`] forwards the current span as a W3C `traceparent`
//! and the HTTP request id being served, if any.

use metrics::counter;
use opentelemetry::trace::TraceContextExt;
use tonic::{Request, Status};
use tracing::Span;
use tracing_opentelemetry::OpenTelemetrySpanExt;

use crate::middleware::current_request_id;

pub const TRACEPARENT_KEY: &str = "traceparent";
pub const TRACESTATE_KEY: &str = "tracestate";
pub const REQUEST_ID_KEY: &str = "x-request-id";

#[allow(clippy::result_large_err)]
pub fn trace_context_interceptor(request: Request<()>) -> Result<Request<()>, Status> {
    if let Some(traceparent) = extract_traceparent(&request) {
        tracing::debug!(traceparent = %traceparent, "Received trace context");
    }
    if let Some(request_id) = extract_request_id(&request) {
        tracing::debug!(request_id = %request_id, "Received request id");
    }
    Ok(request)
}

/// Counts `grpc_requests_total`. Interceptors only see metadata, so calls are
/// not labelled by method here; per-method timings come from the endpoint
/// instrumenting middleware.
#[allow(clippy::result_large_err)]
pub fn metrics_interceptor(request: Request<()>) -> Result<Request<()>, Status> {
    counter!("grpc_requests_total").increment(1);
    Ok(request)
}

/// Both server interceptors in one, for `XServer::with_interceptor`.
#[allow(clippy::result_large_err)]
pub fn server_interceptor(request: Request<()>) -> Result<Request<()>, Status> {
    metrics_interceptor(request).and_then(trace_context_interceptor)
}

/// Everything a typed client attaches to an outgoing call.
pub fn propagate_context<T>(request: &mut Request<T>) {
    inject_trace_context(request);
    if let Some(request_id) = current_request_id() {
        inject_request_id(request, &request_id);
    }
}

pub fn inject_trace_context<T>(request: &mut Request<T>) {
    let context = Span::current().context();
    let otel_span = context.span();
    let span_context = otel_span.span_context();

    if !span_context.is_valid() {
        return;
    }

    let traceparent = format!(
        "00-{}-{}-{:02x}",
        span_context.trace_id(),
        span_context.span_id(),
        span_context.trace_flags().to_u8()
    );
    if let Ok(value) = traceparent.parse() {
        request.metadata_mut().insert(TRACEPARENT_KEY, value);
    }

    let tracestate = span_context.trace_state().header();
    if !tracestate.is_empty()
        && let Ok(value) = tracestate.parse()
    {
        request.metadata_mut().insert(TRACESTATE_KEY, value);
    }
}

pub fn inject_request_id<T>(request: &mut Request<T>, request_id: &str) {
    if let Ok(value) = request_id.parse() {
        request.metadata_mut().insert(REQUEST_ID_KEY, value);
    }
}

pub fn extract_traceparent<T>(request: &Request<T>) -> Option<String> {
    request
        .metadata()
        .get(TRACEPARENT_KEY)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
}

pub fn extract_request_id<T>(request: &Request<T>) -> Option<String> {
    request
        .metadata()
        .get(REQUEST_ID_KEY)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
}
