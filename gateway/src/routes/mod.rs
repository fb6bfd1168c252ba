//! Per-backend routing. Each backend's own HTTP router is mounted under its
//! service name, driven by endpoints that reach the backend's instances over
//! gRPC through discovery, round-robin and retry.

pub mod addsvc;
pub mod stringsvc;
pub mod usersvc;

use std::sync::Arc;

use service_core::endpoint::{
    BoxEndpoint, BreakerSettings, Chain, CircuitBreaker, CircuitBreakerMiddleware,
    InstrumentingMiddleware, LoggingMiddleware, RateLimitMiddleware,
};
use service_core::error::AppError;
use service_core::registry::ServiceInstance;
use tokio::sync::watch;

use crate::config::GatewayConfig;
use crate::sd::{retry, Endpointer, Factory, RoundRobin};

/// The gateway endpoint for one backend method.
///
/// `connect` turns an instance into a bare remote endpoint; each one is
/// guarded by its own rate limiter and circuit breaker, so a failing
/// instance is skipped quickly while retry moves on to the next.
pub(crate) fn remote_method<Req, Resp, F>(
    service: &'static str,
    method: &'static str,
    instances: watch::Receiver<Vec<ServiceInstance>>,
    config: &GatewayConfig,
    connect: F,
) -> BoxEndpoint<Req, Resp>
where
    Req: Clone + Send + Sync + 'static,
    Resp: Send + 'static,
    F: Fn(&ServiceInstance) -> Result<BoxEndpoint<Req, Resp>, AppError> + Send + Sync + 'static,
{
    let endpoint_config = config.endpoint.clone();
    let factory: Factory<BoxEndpoint<Req, Resp>> = Arc::new(
        move |instance: &ServiceInstance| -> Result<BoxEndpoint<Req, Resp>, AppError> {
            let remote = connect(instance)?;
            let breaker = CircuitBreaker::new(
                format!("{}.{}@{}", service, method, instance.id),
                BreakerSettings::from(&endpoint_config),
            );
            Ok(Chain::new()
                .with_opt(RateLimitMiddleware::per_second_opt(
                    endpoint_config.rate_limit_per_second,
                ))
                .with(CircuitBreakerMiddleware::new(breaker))
                .build(remote))
        },
    );

    let endpointer = Arc::new(Endpointer::new(service, instances, factory));
    let balancer = Arc::new(RoundRobin::new(endpointer));

    Chain::new()
        .with(LoggingMiddleware::new(method))
        .with(InstrumentingMiddleware::new(method))
        .build(retry(config.retry.max, config.retry.timeout(), balancer))
}

pub(crate) fn invalid_endpoint(instance: &ServiceInstance, err: impl std::fmt::Display) -> AppError {
    AppError::BadGateway(format!(
        "invalid endpoint {} for {}: {}",
        instance.grpc_uri(),
        instance.id,
        err
    ))
}
