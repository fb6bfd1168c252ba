use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use tracing::Instrument;

use super::{BoxEndpoint, Endpoint, Middleware};
use crate::error::AppError;

/// Opens a tracing span per call and logs the outcome and duration.
#[derive(Clone, Debug)]
pub struct LoggingMiddleware {
    method: &'static str,
}

impl LoggingMiddleware {
    pub fn new(method: &'static str) -> Self {
        Self { method }
    }
}

impl<Req: Send + 'static, Resp: Send + 'static> Middleware<Req, Resp> for LoggingMiddleware {
    fn wrap(&self, next: BoxEndpoint<Req, Resp>) -> BoxEndpoint<Req, Resp> {
        Arc::new(Logged {
            method: self.method,
            next,
        })
    }
}

struct Logged<Req: Send + 'static, Resp: Send + 'static> {
    method: &'static str,
    next: BoxEndpoint<Req, Resp>,
}

#[async_trait]
impl<Req: Send + 'static, Resp: Send + 'static> Endpoint<Req, Resp> for Logged<Req, Resp> {
    async fn call(&self, req: Req) -> Result<Resp, AppError> {
        let span = tracing::info_span!("endpoint", method = self.method);
        let start = Instant::now();
        let result = self.next.call(req).instrument(span.clone()).await;
        let took_ms = start.elapsed().as_millis() as u64;

        let _entered = span.enter();
        match &result {
            Ok(_) => tracing::debug!(took_ms, "endpoint call completed"),
            Err(e) => tracing::warn!(took_ms, error = %e, "endpoint call failed"),
        }

        result
    }
}
