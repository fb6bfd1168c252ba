//! Uniform call interface for service operations.
//!
//! Every operation (local or remote) is exposed as an [`Endpoint`]: a typed
//! async call from a request to a response. Cross-cutting behaviour is added by
//! [`Middleware`]s, composed in an explicit order with a [`Chain`]:
//!
//! ```ignore
//! let sum = Chain::new()
//!     .with(RateLimitMiddleware::per_second(100))
//!     .with(CircuitBreakerMiddleware::new(CircuitBreaker::new("sum", settings)))
//!     .with(LoggingMiddleware::new("sum"))
//!     .with(InstrumentingMiddleware::new("sum"))
//!     .build(endpoint_fn(move |req: SumRequest| { ... }));
//! ```
//!
//! An endpoint's `Err` is reserved for transport and infrastructure failures
//! (rate limited, circuit open, backend unreachable). Domain failures are part
//! of the response type so they pass through retries and breakers untouched.

pub mod circuit_breaker;
pub mod instrumenting;
pub mod logging;
pub mod rate_limit;

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;

use crate::config::EndpointConfig;
use crate::error::AppError;

pub use circuit_breaker::{BreakerSettings, BreakerState, CircuitBreaker, CircuitBreakerMiddleware};
pub use instrumenting::InstrumentingMiddleware;
pub use logging::LoggingMiddleware;
pub use rate_limit::RateLimitMiddleware;

/// A single typed operation.
#[async_trait]
pub trait Endpoint<Req: Send + 'static, Resp: Send + 'static>: Send + Sync {
    async fn call(&self, req: Req) -> Result<Resp, AppError>;
}

/// Shared, type-erased endpoint.
pub type BoxEndpoint<Req, Resp> = Arc<dyn Endpoint<Req, Resp>>;

/// Adapter turning an async closure into an [`Endpoint`].
pub struct FnEndpoint<F> {
    f: F,
}

#[async_trait]
impl<Req, Resp, F, Fut> Endpoint<Req, Resp> for FnEndpoint<F>
where
    Req: Send + 'static,
    Resp: Send + 'static,
    F: Fn(Req) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Resp, AppError>> + Send + 'static,
{
    async fn call(&self, req: Req) -> Result<Resp, AppError> {
        (self.f)(req).await
    }
}

pub fn endpoint_fn<Req, Resp, F, Fut>(f: F) -> BoxEndpoint<Req, Resp>
where
    Req: Send + 'static,
    Resp: Send + 'static,
    F: Fn(Req) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Resp, AppError>> + Send + 'static,
{
    Arc::new(FnEndpoint { f })
}

/// Wraps an endpoint with additional behaviour.
pub trait Middleware<Req: Send + 'static, Resp: Send + 'static>: Send + Sync {
    fn wrap(&self, next: BoxEndpoint<Req, Resp>) -> BoxEndpoint<Req, Resp>;
}

/// Ordered middleware list. The first middleware added is the outermost one.
pub struct Chain<Req: Send + 'static, Resp: Send + 'static> {
    layers: Vec<Arc<dyn Middleware<Req, Resp>>>,
}

impl<Req: Send + 'static, Resp: Send + 'static> Chain<Req, Resp> {
    pub fn new() -> Self {
        Self { layers: Vec::new() }
    }

    pub fn with<M>(mut self, middleware: M) -> Self
    where
        M: Middleware<Req, Resp> + 'static,
    {
        self.layers.push(Arc::new(middleware));
        self
    }

    /// Add a middleware only when `middleware` is `Some`.
    pub fn with_opt<M>(self, middleware: Option<M>) -> Self
    where
        M: Middleware<Req, Resp> + 'static,
    {
        match middleware {
            Some(m) => self.with(m),
            None => self,
        }
    }

    /// Server-side decoration for `method`: rate limit (when configured),
    /// circuit breaker, logging and instrumenting, outermost first.
    pub fn standard(method: &'static str, config: &EndpointConfig) -> Self {
        Self::new()
            .with_opt(RateLimitMiddleware::per_second_opt(config.rate_limit_per_second))
            .with(CircuitBreakerMiddleware::new(CircuitBreaker::new(
                method,
                BreakerSettings::from(config),
            )))
            .with(LoggingMiddleware::new(method))
            .with(InstrumentingMiddleware::new(method))
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    pub fn build(&self, inner: BoxEndpoint<Req, Resp>) -> BoxEndpoint<Req, Resp> {
        self.layers
            .iter()
            .rev()
            .fold(inner, |next, layer| layer.wrap(next))
    }
}

impl<Req: Send + 'static, Resp: Send + 'static> Default for Chain<Req, Resp> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Req: Send + 'static, Resp: Send + 'static> Clone for Chain<Req, Resp> {
    fn clone(&self) -> Self {
        Self {
            layers: self.layers.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Records its tag before and after delegating.
    struct Tagging {
        tag: &'static str,
        log: Arc<Mutex<Vec<String>>>,
    }

    struct Tagged {
        tag: &'static str,
        log: Arc<Mutex<Vec<String>>>,
        next: BoxEndpoint<u32, u32>,
    }

    #[async_trait]
    impl Endpoint<u32, u32> for Tagged {
        async fn call(&self, req: u32) -> Result<u32, AppError> {
            self.log.lock().unwrap().push(format!("{}:in", self.tag));
            let out = self.next.call(req).await;
            self.log.lock().unwrap().push(format!("{}:out", self.tag));
            out
        }
    }

    impl Middleware<u32, u32> for Tagging {
        fn wrap(&self, next: BoxEndpoint<u32, u32>) -> BoxEndpoint<u32, u32> {
            Arc::new(Tagged {
                tag: self.tag,
                log: self.log.clone(),
                next,
            })
        }
    }

    #[tokio::test]
    async fn first_middleware_is_outermost() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let chain = Chain::new()
            .with(Tagging {
                tag: "a",
                log: log.clone(),
            })
            .with(Tagging {
                tag: "b",
                log: log.clone(),
            });

        let endpoint = chain.build(endpoint_fn(|x: u32| async move { Ok(x * 2) }));
        assert_eq!(endpoint.call(21).await.unwrap(), 42);
        assert_eq!(
            *log.lock().unwrap(),
            vec!["a:in", "b:in", "b:out", "a:out"]
        );
    }

    #[tokio::test]
    async fn empty_chain_returns_inner() {
        let chain: Chain<u32, u32> = Chain::default();
        assert!(chain.is_empty());
        let endpoint = chain.build(endpoint_fn(|x: u32| async move { Ok(x + 1) }));
        assert_eq!(endpoint.call(1).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn with_opt_skips_none() {
        let chain: Chain<u32, u32> = Chain::new().with_opt(None::<LoggingMiddleware>);
        assert_eq!(chain.len(), 0);
    }

    #[test]
    fn standard_chain_skips_disabled_rate_limit() {
        let config = EndpointConfig::default();
        assert_eq!(Chain::<u32, u32>::standard("op", &config).len(), 4);

        let config = EndpointConfig {
            rate_limit_per_second: 0,
            ..EndpointConfig::default()
        };
        assert_eq!(Chain::<u32, u32>::standard("op", &config).len(), 3);
    }
}
