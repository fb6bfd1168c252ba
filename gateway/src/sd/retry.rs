use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use service_core::endpoint::{BoxEndpoint, Endpoint};
use service_core::error::AppError;
use tokio::time::Instant;

use super::Balancer;

/// Calls through `balancer` up to `max` times, all within one `timeout`.
///
/// Balancer and endpoint errors each consume an attempt. Only transport
/// failures are retried; domain errors travel inside the response and are
/// returned as-is.
pub fn retry<Req, Resp, B>(
    max: usize,
    timeout: Duration,
    balancer: Arc<B>,
) -> BoxEndpoint<Req, Resp>
where
    Req: Clone + Send + Sync + 'static,
    Resp: Send + 'static,
    B: Balancer<BoxEndpoint<Req, Resp>> + 'static,
{
    Arc::new(Retry {
        max: max.max(1),
        timeout,
        balancer,
    })
}

pub struct Retry<B> {
    max: usize,
    timeout: Duration,
    balancer: Arc<B>,
}

#[async_trait]
impl<Req, Resp, B> Endpoint<Req, Resp> for Retry<B>
where
    Req: Clone + Send + Sync + 'static,
    Resp: Send + 'static,
    B: Balancer<BoxEndpoint<Req, Resp>> + 'static,
{
    async fn call(&self, req: Req) -> Result<Resp, AppError> {
        let deadline = Instant::now() + self.timeout;
        let mut failures: Vec<String> = Vec::new();
        let mut endpoint_failures = 0;
        let mut last_balancer_error = None;

        for attempt in 1..=self.max {
            let endpoint = match self.balancer.endpoint() {
                Ok(endpoint) => endpoint,
                Err(e) => {
                    failures.push(e.to_string());
                    last_balancer_error = Some(e);
                    continue;
                }
            };

            match tokio::time::timeout_at(deadline, endpoint.call(req.clone())).await {
                Ok(Ok(resp)) => return Ok(resp),
                Ok(Err(e)) => {
                    tracing::debug!(attempt, "Attempt failed: {}", e);
                    metrics::counter!("gateway_retry_failed_attempts_total").increment(1);
                    failures.push(e.to_string());
                    endpoint_failures += 1;
                }
                Err(_) => {
                    metrics::counter!("gateway_retry_deadline_exceeded_total").increment(1);
                    return Err(AppError::BadGateway(format!(
                        "retry deadline of {:?} exceeded on attempt {}{}",
                        self.timeout,
                        attempt,
                        previous(&failures)
                    )));
                }
            }
        }

        // Nothing to call at all: report that rather than a gateway failure.
        if endpoint_failures == 0 {
            if let Some(e) = last_balancer_error {
                return Err(e);
            }
        }

        Err(AppError::BadGateway(format!(
            "retry attempts exhausted ({}): {}",
            self.max,
            failures.join("; ")
        )))
    }
}

fn previous(failures: &[String]) -> String {
    if failures.is_empty() {
        String::new()
    } else {
        format!(" (previous: {})", failures.join("; "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use service_core::endpoint::endpoint_fn;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Hands out a fixed sequence of endpoints, repeating the last one.
    struct Scripted {
        endpoints: Mutex<Vec<BoxEndpoint<u32, u32>>>,
    }

    impl Scripted {
        fn new(mut endpoints: Vec<BoxEndpoint<u32, u32>>) -> Arc<Self> {
            endpoints.reverse();
            Arc::new(Self {
                endpoints: Mutex::new(endpoints),
            })
        }
    }

    impl Balancer<BoxEndpoint<u32, u32>> for Scripted {
        fn endpoint(&self) -> Result<BoxEndpoint<u32, u32>, AppError> {
            let mut endpoints = self.endpoints.lock().unwrap();
            match endpoints.len() {
                0 => Err(AppError::ServiceUnavailable(
                    "no endpoints available".to_string(),
                )),
                1 => Ok(endpoints[0].clone()),
                _ => Ok(endpoints.pop().unwrap()),
            }
        }
    }

    fn failing(calls: Arc<AtomicUsize>) -> BoxEndpoint<u32, u32> {
        endpoint_fn(move |_: u32| {
            let calls = calls.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(AppError::ServiceUnavailable("connection refused".to_string()))
            }
        })
    }

    fn echo() -> BoxEndpoint<u32, u32> {
        endpoint_fn(|x: u32| async move { Ok(x) })
    }

    fn slow() -> BoxEndpoint<u32, u32> {
        endpoint_fn(|x: u32| async move {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(x)
        })
    }

    #[tokio::test]
    async fn retries_onto_the_next_endpoint() {
        let calls = Arc::new(AtomicUsize::new(0));
        let balancer = Scripted::new(vec![failing(calls.clone()), echo()]);
        let endpoint = retry(3, Duration::from_secs(1), balancer);

        assert_eq!(endpoint.call(7).await.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn stops_after_max_attempts() {
        let calls = Arc::new(AtomicUsize::new(0));
        let balancer = Scripted::new(vec![failing(calls.clone())]);
        let endpoint = retry(3, Duration::from_secs(1), balancer);

        match endpoint.call(1).await {
            Err(AppError::BadGateway(msg)) => {
                assert!(msg.contains("exhausted (3)"), "{msg}");
                assert_eq!(msg.matches("connection refused").count(), 3);
            }
            other => panic!("expected BadGateway, got {:?}", other),
        }
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn deadline_aborts_in_flight_attempt() {
        let balancer = Scripted::new(vec![slow()]);
        let endpoint = retry(3, Duration::from_millis(50), balancer);

        let started = std::time::Instant::now();
        match endpoint.call(1).await {
            Err(AppError::BadGateway(msg)) => assert!(msg.contains("deadline"), "{msg}"),
            other => panic!("expected BadGateway, got {:?}", other),
        }
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test]
    async fn no_endpoints_is_service_unavailable() {
        let endpoint = retry(3, Duration::from_secs(1), Scripted::new(vec![]));
        assert!(matches!(
            endpoint.call(1).await,
            Err(AppError::ServiceUnavailable(_))
        ));
    }
}
