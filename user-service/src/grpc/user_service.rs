use service_core::domain::err2str;
use service_core::error::AppError;
use service_core::grpc::IntoStatus;
use tonic::{Request, Response, Status};
use validator::Validate;

use crate::endpoints::{
    LoginRequest, RegisterRequest, UpdatePasswordRequest, UserEndpoints, ValidTokenRequest,
};
use crate::grpc::proto::{self, user_service_server::UserService};

pub struct UserGrpcService {
    endpoints: UserEndpoints,
}

impl UserGrpcService {
    pub fn new(endpoints: UserEndpoints) -> Self {
        Self { endpoints }
    }
}

/// Same rules as the JSON bodies; violations are `INVALID_ARGUMENT`.
fn validated<T: Validate>(req: T) -> Result<T, Status> {
    req.validate()
        .map_err(|e| AppError::ValidationError(e).into_status())?;
    Ok(req)
}

#[tonic::async_trait]
impl UserService for UserGrpcService {
    async fn register(
        &self,
        request: Request<proto::RegisterRequest>,
    ) -> Result<Response<proto::RegisterReply>, Status> {
        let req = request.into_inner();
        let req = validated(RegisterRequest {
            username: req.username,
            password: req.password,
            nickname: req.nickname,
        })?;
        let resp = self
            .endpoints
            .register
            .call(req)
            .await
            .map_err(IntoStatus::into_status)?;

        Ok(Response::new(proto::RegisterReply {
            id: resp.id,
            err: err2str(resp.err.as_ref()),
        }))
    }

    async fn login(
        &self,
        request: Request<proto::LoginRequest>,
    ) -> Result<Response<proto::LoginReply>, Status> {
        let req = request.into_inner();
        let req = validated(LoginRequest {
            username: req.username,
            password: req.password,
        })?;
        let resp = self
            .endpoints
            .login
            .call(req)
            .await
            .map_err(IntoStatus::into_status)?;

        Ok(Response::new(proto::LoginReply {
            token: resp.token,
            expires_in: resp.expires_in,
            err: err2str(resp.err.as_ref()),
        }))
    }

    async fn update_password(
        &self,
        request: Request<proto::UpdatePasswordRequest>,
    ) -> Result<Response<proto::UpdatePasswordReply>, Status> {
        let req = request.into_inner();
        let req = validated(UpdatePasswordRequest {
            username: req.username,
            password: req.password,
            new_password: req.new_password,
        })?;
        let resp = self
            .endpoints
            .update_password
            .call(req)
            .await
            .map_err(IntoStatus::into_status)?;

        Ok(Response::new(proto::UpdatePasswordReply {
            err: err2str(resp.err.as_ref()),
        }))
    }

    async fn valid_token(
        &self,
        request: Request<proto::ValidTokenRequest>,
    ) -> Result<Response<proto::ValidTokenReply>, Status> {
        let resp = self
            .endpoints
            .valid_token
            .call(ValidTokenRequest {
                token: request.into_inner().token,
            })
            .await
            .map_err(IntoStatus::into_status)?;

        Ok(Response::new(proto::ValidTokenReply {
            valid: resp.valid,
            username: resp.username,
            err: err2str(resp.err.as_ref()),
        }))
    }
}
