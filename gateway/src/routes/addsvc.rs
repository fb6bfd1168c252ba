use add_service::endpoints::{
    AddEndpoints, ConcatRequest, ConcatResponse, SumRequest, SumResponse,
};
use axum::Router;
use service_core::domain::str2err;
use service_core::endpoint::endpoint_fn;
use service_core::error::AppError;
use service_core::grpc::{AddClient, AddClientConfig};
use service_core::registry::ServiceInstance;
use tokio::sync::watch;

use super::{invalid_endpoint, remote_method};
use crate::config::GatewayConfig;

pub const SERVICE: &str = add_service::config::SERVICE_NAME;

fn client(instance: &ServiceInstance) -> Result<AddClient, AppError> {
    AddClient::connect_lazy(AddClientConfig {
        endpoint: instance.grpc_uri(),
        ..Default::default()
    })
    .map_err(|e| invalid_endpoint(instance, e))
}

pub fn endpoints(
    instances: watch::Receiver<Vec<ServiceInstance>>,
    config: &GatewayConfig,
) -> AddEndpoints {
    let sum = remote_method(SERVICE, "sum", instances.clone(), config, |instance| {
        let client = client(instance)?;
        Ok(endpoint_fn(move |req: SumRequest| {
            let client = client.clone();
            async move {
                let reply = client.sum(req.a, req.b).await?;
                Ok::<_, AppError>(SumResponse {
                    v: reply.v,
                    err: str2err(&reply.err),
                })
            }
        }))
    });

    let concat = remote_method(SERVICE, "concat", instances, config, |instance| {
        let client = client(instance)?;
        Ok(endpoint_fn(move |req: ConcatRequest| {
            let client = client.clone();
            async move {
                let reply = client.concat(req.a, req.b).await?;
                Ok::<_, AppError>(ConcatResponse {
                    v: reply.v,
                    err: str2err(&reply.err),
                })
            }
        }))
    });

    AddEndpoints { sum, concat }
}

/// The add service's own routes, served from remote instances.
pub fn router(instances: watch::Receiver<Vec<ServiceInstance>>, config: &GatewayConfig) -> Router {
    add_service::handlers::router(endpoints(instances, config))
}
