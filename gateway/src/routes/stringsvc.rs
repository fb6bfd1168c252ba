use axum::Router;
use service_core::domain::str2err;
use service_core::endpoint::endpoint_fn;
use service_core::error::AppError;
use service_core::grpc::{StringClient, StringClientConfig};
use service_core::registry::ServiceInstance;
use string_service::endpoints::{
    CountRequest, CountResponse, StringEndpoints, UppercaseRequest, UppercaseResponse,
};
use tokio::sync::watch;

use super::{invalid_endpoint, remote_method};
use crate::config::GatewayConfig;

pub const SERVICE: &str = string_service::config::SERVICE_NAME;

fn client(instance: &ServiceInstance) -> Result<StringClient, AppError> {
    StringClient::connect_lazy(StringClientConfig {
        endpoint: instance.grpc_uri(),
        ..Default::default()
    })
    .map_err(|e| invalid_endpoint(instance, e))
}

pub fn endpoints(
    instances: watch::Receiver<Vec<ServiceInstance>>,
    config: &GatewayConfig,
) -> StringEndpoints {
    let uppercase = remote_method(SERVICE, "uppercase", instances.clone(), config, |instance| {
        let client = client(instance)?;
        Ok(endpoint_fn(move |req: UppercaseRequest| {
            let client = client.clone();
            async move {
                let reply = client.uppercase(req.s).await?;
                Ok::<_, AppError>(UppercaseResponse {
                    v: reply.v,
                    err: str2err(&reply.err),
                })
            }
        }))
    });

    let count = remote_method(SERVICE, "count", instances, config, |instance| {
        let client = client(instance)?;
        Ok(endpoint_fn(move |req: CountRequest| {
            let client = client.clone();
            async move {
                let reply = client.count(req.s).await?;
                Ok::<_, AppError>(CountResponse { v: reply.v })
            }
        }))
    });

    StringEndpoints { uppercase, count }
}

pub fn router(instances: watch::Receiver<Vec<ServiceInstance>>, config: &GatewayConfig) -> Router {
    string_service::handlers::router(endpoints(instances, config))
}
