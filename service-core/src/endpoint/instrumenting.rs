use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use metrics::histogram;

use super::{BoxEndpoint, Endpoint, Middleware};
use crate::error::AppError;

/// Records `request_duration_seconds` labelled by method and success.
#[derive(Clone, Debug)]
pub struct InstrumentingMiddleware {
    method: &'static str,
}

impl InstrumentingMiddleware {
    pub fn new(method: &'static str) -> Self {
        Self { method }
    }
}

impl<Req: Send + 'static, Resp: Send + 'static> Middleware<Req, Resp> for InstrumentingMiddleware {
    fn wrap(&self, next: BoxEndpoint<Req, Resp>) -> BoxEndpoint<Req, Resp> {
        Arc::new(Instrumented {
            method: self.method,
            next,
        })
    }
}

struct Instrumented<Req: Send + 'static, Resp: Send + 'static> {
    method: &'static str,
    next: BoxEndpoint<Req, Resp>,
}

#[async_trait]
impl<Req: Send + 'static, Resp: Send + 'static> Endpoint<Req, Resp> for Instrumented<Req, Resp> {
    async fn call(&self, req: Req) -> Result<Resp, AppError> {
        let start = Instant::now();
        let result = self.next.call(req).await;

        let success = if result.is_ok() { "true" } else { "false" };
        histogram!(
            "request_duration_seconds",
            "method" => self.method,
            "success" => success
        )
        .record(start.elapsed().as_secs_f64());

        result
    }
}
