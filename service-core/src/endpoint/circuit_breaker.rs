//! Consecutive-failure circuit breaker.
//!
//! Closed: calls pass, consecutive failures are counted. Reaching
//! `max_failures` opens the circuit. Open: calls are rejected with
//! `ServiceUnavailable` until `open_for` elapses. Half-open: exactly one trial
//! call is admitted; success closes the circuit, failure opens it again.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

use super::{BoxEndpoint, Endpoint, Middleware};
use crate::config::EndpointConfig;
use crate::error::AppError;

#[derive(Clone, Copy, Debug)]
pub struct BreakerSettings {
    pub max_failures: u32,
    pub open_for: Duration,
}

impl Default for BreakerSettings {
    fn default() -> Self {
        Self {
            max_failures: 5,
            open_for: Duration::from_secs(30),
        }
    }
}

impl From<&EndpointConfig> for BreakerSettings {
    fn from(config: &EndpointConfig) -> Self {
        Self {
            max_failures: config.breaker_max_failures.max(1),
            open_for: Duration::from_secs(config.breaker_open_seconds),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BreakerState {
    Closed,
    Open,
    HalfOpen,
}

#[derive(Debug)]
enum Inner {
    Closed { failures: u32 },
    Open { until: Instant },
    HalfOpen { trial_in_flight: bool },
}

#[derive(Clone)]
pub struct CircuitBreaker {
    name: Arc<str>,
    settings: BreakerSettings,
    inner: Arc<Mutex<Inner>>,
}

impl CircuitBreaker {
    pub fn new(name: impl Into<Arc<str>>, settings: BreakerSettings) -> Self {
        Self {
            name: name.into(),
            settings,
            inner: Arc::new(Mutex::new(Inner::Closed { failures: 0 })),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> BreakerState {
        match *self.lock() {
            Inner::Closed { .. } => BreakerState::Closed,
            Inner::Open { until } if Instant::now() >= until => BreakerState::HalfOpen,
            Inner::Open { .. } => BreakerState::Open,
            Inner::HalfOpen { .. } => BreakerState::HalfOpen,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn admit(&self) -> Result<(), AppError> {
        let mut inner = self.lock();
        match *inner {
            Inner::Closed { .. } => Ok(()),
            Inner::Open { until } if Instant::now() >= until => {
                tracing::info!(breaker = %self.name, "circuit half-open, admitting trial call");
                *inner = Inner::HalfOpen {
                    trial_in_flight: true,
                };
                Ok(())
            }
            Inner::HalfOpen {
                trial_in_flight: false,
            } => {
                *inner = Inner::HalfOpen {
                    trial_in_flight: true,
                };
                Ok(())
            }
            Inner::Open { .. } | Inner::HalfOpen { .. } => Err(AppError::ServiceUnavailable(
                format!("circuit breaker '{}' is open", self.name),
            )),
        }
    }

    fn record(&self, success: bool) {
        let mut inner = self.lock();
        let next = match (&*inner, success) {
            (Inner::Closed { .. }, true) => Inner::Closed { failures: 0 },
            (Inner::Closed { failures }, false) => {
                let failures = failures + 1;
                if failures >= self.settings.max_failures {
                    tracing::warn!(breaker = %self.name, failures, "circuit opened");
                    Inner::Open {
                        until: Instant::now() + self.settings.open_for,
                    }
                } else {
                    Inner::Closed { failures }
                }
            }
            (Inner::HalfOpen { .. }, true) => {
                tracing::info!(breaker = %self.name, "circuit closed");
                Inner::Closed { failures: 0 }
            }
            (Inner::HalfOpen { .. }, false) => {
                tracing::warn!(breaker = %self.name, "trial call failed, circuit re-opened");
                Inner::Open {
                    until: Instant::now() + self.settings.open_for,
                }
            }
            // A call admitted before the circuit opened finished late.
            (Inner::Open { until }, _) => Inner::Open { until: *until },
        };
        *inner = next;
    }
}

/// Counts an abandoned call (future dropped before completion) as a failure so
/// a half-open trial can never stay in flight forever.
struct CallGuard<'a> {
    breaker: &'a CircuitBreaker,
    finished: bool,
}

impl CallGuard<'_> {
    fn finish(mut self, success: bool) {
        self.finished = true;
        self.breaker.record(success);
    }
}

impl Drop for CallGuard<'_> {
    fn drop(&mut self) {
        if !self.finished {
            self.breaker.record(false);
        }
    }
}

#[derive(Clone)]
pub struct CircuitBreakerMiddleware {
    breaker: CircuitBreaker,
}

impl CircuitBreakerMiddleware {
    pub fn new(breaker: CircuitBreaker) -> Self {
        Self { breaker }
    }
}

impl<Req: Send + 'static, Resp: Send + 'static> Middleware<Req, Resp>
    for CircuitBreakerMiddleware
{
    fn wrap(&self, next: BoxEndpoint<Req, Resp>) -> BoxEndpoint<Req, Resp> {
        Arc::new(Guarded {
            breaker: self.breaker.clone(),
            next,
        })
    }
}

struct Guarded<Req: Send + 'static, Resp: Send + 'static> {
    breaker: CircuitBreaker,
    next: BoxEndpoint<Req, Resp>,
}

#[async_trait]
impl<Req: Send + 'static, Resp: Send + 'static> Endpoint<Req, Resp> for Guarded<Req, Resp> {
    async fn call(&self, req: Req) -> Result<Resp, AppError> {
        self.breaker.admit()?;
        let guard = CallGuard {
            breaker: &self.breaker,
            finished: false,
        };
        let result = self.next.call(req).await;
        guard.finish(result.is_ok());
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::endpoint::{Chain, endpoint_fn};
    use std::sync::atomic::{AtomicBool, Ordering};

    fn settings() -> BreakerSettings {
        BreakerSettings {
            max_failures: 2,
            open_for: Duration::from_millis(50),
        }
    }

    fn flaky(healthy: Arc<AtomicBool>) -> BoxEndpoint<u32, u32> {
        endpoint_fn(move |x: u32| {
            let healthy = healthy.clone();
            async move {
                if healthy.load(Ordering::SeqCst) {
                    Ok(x)
                } else {
                    Err(AppError::BadGateway("backend down".to_string()))
                }
            }
        })
    }

    #[tokio::test]
    async fn opens_after_consecutive_failures() {
        let healthy = Arc::new(AtomicBool::new(false));
        let breaker = CircuitBreaker::new("test", settings());
        let endpoint = Chain::new()
            .with(CircuitBreakerMiddleware::new(breaker.clone()))
            .build(flaky(healthy.clone()));

        assert!(matches!(endpoint.call(1).await, Err(AppError::BadGateway(_))));
        assert_eq!(breaker.state(), BreakerState::Closed);
        assert!(matches!(endpoint.call(1).await, Err(AppError::BadGateway(_))));
        assert_eq!(breaker.state(), BreakerState::Open);

        // Rejected without reaching the backend, even though it recovered.
        healthy.store(true, Ordering::SeqCst);
        assert!(matches!(
            endpoint.call(1).await,
            Err(AppError::ServiceUnavailable(_))
        ));
    }

    #[tokio::test]
    async fn half_open_trial_success_closes() {
        let healthy = Arc::new(AtomicBool::new(false));
        let breaker = CircuitBreaker::new("test", settings());
        let endpoint = Chain::new()
            .with(CircuitBreakerMiddleware::new(breaker.clone()))
            .build(flaky(healthy.clone()));

        let _ = endpoint.call(1).await;
        let _ = endpoint.call(1).await;
        assert_eq!(breaker.state(), BreakerState::Open);

        tokio::time::sleep(Duration::from_millis(80)).await;
        assert_eq!(breaker.state(), BreakerState::HalfOpen);

        healthy.store(true, Ordering::SeqCst);
        assert_eq!(endpoint.call(7).await.unwrap(), 7);
        assert_eq!(breaker.state(), BreakerState::Closed);
    }

    #[tokio::test]
    async fn half_open_trial_failure_reopens() {
        let healthy = Arc::new(AtomicBool::new(false));
        let breaker = CircuitBreaker::new("test", settings());
        let endpoint = Chain::new()
            .with(CircuitBreakerMiddleware::new(breaker.clone()))
            .build(flaky(healthy));

        let _ = endpoint.call(1).await;
        let _ = endpoint.call(1).await;
        tokio::time::sleep(Duration::from_millis(80)).await;

        assert!(matches!(endpoint.call(1).await, Err(AppError::BadGateway(_))));
        assert_eq!(breaker.state(), BreakerState::Open);
    }

    #[tokio::test]
    async fn success_resets_failure_count() {
        let healthy = Arc::new(AtomicBool::new(false));
        let breaker = CircuitBreaker::new("test", settings());
        let endpoint = Chain::new()
            .with(CircuitBreakerMiddleware::new(breaker.clone()))
            .build(flaky(healthy.clone()));

        let _ = endpoint.call(1).await;
        healthy.store(true, Ordering::SeqCst);
        assert!(endpoint.call(1).await.is_ok());
        healthy.store(false, Ordering::SeqCst);
        let _ = endpoint.call(1).await;
        assert_eq!(breaker.state(), BreakerState::Closed);
    }
}
