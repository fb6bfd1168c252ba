use axum::Router;
use service_core::domain::str2err;
use service_core::endpoint::endpoint_fn;
use service_core::error::AppError;
use service_core::grpc::{UserClient, UserClientConfig};
use service_core::registry::ServiceInstance;
use tokio::sync::watch;
use user_service::endpoints::{
    LoginRequest, LoginResponse, RegisterRequest, RegisterResponse, UpdatePasswordRequest,
    UpdatePasswordResponse, UserEndpoints, ValidTokenRequest, ValidTokenResponse,
};

use super::{invalid_endpoint, remote_method};
use crate::config::GatewayConfig;

pub const SERVICE: &str = user_service::config::SERVICE_NAME;

fn client(instance: &ServiceInstance) -> Result<UserClient, AppError> {
    UserClient::connect_lazy(UserClientConfig {
        endpoint: instance.grpc_uri(),
        ..Default::default()
    })
    .map_err(|e| invalid_endpoint(instance, e))
}

pub fn endpoints(
    instances: watch::Receiver<Vec<ServiceInstance>>,
    config: &GatewayConfig,
) -> UserEndpoints {
    let register = remote_method(SERVICE, "register", instances.clone(), config, |instance| {
        let client = client(instance)?;
        Ok(endpoint_fn(move |req: RegisterRequest| {
            let client = client.clone();
            async move {
                let reply = client
                    .register(req.username, req.password, req.nickname)
                    .await?;
                Ok::<_, AppError>(RegisterResponse {
                    id: reply.id,
                    err: str2err(&reply.err),
                })
            }
        }))
    });

    let login = remote_method(SERVICE, "login", instances.clone(), config, |instance| {
        let client = client(instance)?;
        Ok(endpoint_fn(move |req: LoginRequest| {
            let client = client.clone();
            async move {
                let reply = client.login(req.username, req.password).await?;
                Ok::<_, AppError>(LoginResponse {
                    token: reply.token,
                    expires_in: reply.expires_in,
                    err: str2err(&reply.err),
                })
            }
        }))
    });

    let update_password = remote_method(
        SERVICE,
        "update_password",
        instances.clone(),
        config,
        |instance| {
            let client = client(instance)?;
            Ok(endpoint_fn(move |req: UpdatePasswordRequest| {
                let client = client.clone();
                async move {
                    let reply = client
                        .update_password(req.username, req.password, req.new_password)
                        .await?;
                    Ok::<_, AppError>(UpdatePasswordResponse {
                        err: str2err(&reply.err),
                    })
                }
            }))
        },
    );

    let valid_token = remote_method(SERVICE, "valid_token", instances, config, |instance| {
        let client = client(instance)?;
        Ok(endpoint_fn(move |req: ValidTokenRequest| {
            let client = client.clone();
            async move {
                let reply = client.valid_token(req.token).await?;
                Ok::<_, AppError>(ValidTokenResponse {
                    valid: reply.valid,
                    username: reply.username,
                    err: str2err(&reply.err),
                })
            }
        }))
    });

    UserEndpoints {
        register,
        login,
        update_password,
        valid_token,
    }
}

pub fn router(instances: watch::Receiver<Vec<ServiceInstance>>, config: &GatewayConfig) -> Router {
    user_service::handlers::router(endpoints(instances, config))
}
