use std::sync::Arc;

use async_trait::async_trait;
use governor::clock::{Clock, DefaultClock};

use super::{BoxEndpoint, Endpoint, Middleware};
use crate::error::AppError;
use crate::middleware::rate_limit::{UnkeyedRateLimiter, create_unkeyed_rate_limiter};

/// Rejects calls above the configured rate with `TooManyRequests` instead of
/// queueing them.
#[derive(Clone)]
pub struct RateLimitMiddleware {
    limiter: UnkeyedRateLimiter,
}

impl RateLimitMiddleware {
    pub fn new(limiter: UnkeyedRateLimiter) -> Self {
        Self { limiter }
    }

    pub fn per_second(requests: u32) -> Self {
        Self::new(create_unkeyed_rate_limiter(requests, 1))
    }

    /// `None` when `requests` is zero, which disables limiting.
    pub fn per_second_opt(requests: u32) -> Option<Self> {
        (requests > 0).then(|| Self::per_second(requests))
    }
}

impl<Req: Send + 'static, Resp: Send + 'static> Middleware<Req, Resp> for RateLimitMiddleware {
    fn wrap(&self, next: BoxEndpoint<Req, Resp>) -> BoxEndpoint<Req, Resp> {
        Arc::new(Limited {
            limiter: self.limiter.clone(),
            next,
        })
    }
}

struct Limited<Req: Send + 'static, Resp: Send + 'static> {
    limiter: UnkeyedRateLimiter,
    next: BoxEndpoint<Req, Resp>,
}

#[async_trait]
impl<Req: Send + 'static, Resp: Send + 'static> Endpoint<Req, Resp> for Limited<Req, Resp> {
    async fn call(&self, req: Req) -> Result<Resp, AppError> {
        if let Err(negative) = self.limiter.check() {
            let wait_time = negative.wait_time_from(DefaultClock::default().now());
            return Err(AppError::TooManyRequests(
                "Rate limit exceeded".to_string(),
                Some(wait_time.as_secs().max(1)),
            ));
        }
        self.next.call(req).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::endpoint::{Chain, endpoint_fn};

    #[tokio::test]
    async fn rejects_calls_over_the_burst() {
        let endpoint = Chain::new()
            .with(RateLimitMiddleware::per_second(2))
            .build(endpoint_fn(|x: u32| async move { Ok(x) }));

        assert!(endpoint.call(1).await.is_ok());
        assert!(endpoint.call(2).await.is_ok());
        let err = endpoint.call(3).await.unwrap_err();
        assert!(matches!(err, AppError::TooManyRequests(_, Some(_))));
    }

    #[test]
    fn zero_rate_disables_limiter() {
        assert!(RateLimitMiddleware::per_second_opt(0).is_none());
        assert!(RateLimitMiddleware::per_second_opt(5).is_some());
    }
}
