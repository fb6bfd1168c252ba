//! Client for the user service.

use std::time::Duration;

use tonic::Request;
use tonic::transport::{Channel, Endpoint};

use super::interceptors::propagate_context;
use super::proto::user::user_service_client::UserServiceClient;
use super::proto::user::{
    LoginReply, LoginRequest, RegisterReply, RegisterRequest, UpdatePasswordReply,
    UpdatePasswordRequest, ValidTokenReply, ValidTokenRequest,
};

#[derive(Clone, Debug)]
pub struct UserClientConfig {
    pub endpoint: String,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
}

impl Default for UserClientConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:50053".to_string(),
            connect_timeout: Duration::from_secs(5),
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl UserClientConfig {
    fn endpoint(&self) -> Result<Endpoint, tonic::transport::Error> {
        Ok(Endpoint::from_shared(self.endpoint.clone())?
            .connect_timeout(self.connect_timeout)
            .timeout(self.request_timeout))
    }
}

#[derive(Clone)]
pub struct UserClient {
    client: UserServiceClient<Channel>,
}

impl UserClient {
    pub async fn new(config: UserClientConfig) -> Result<Self, tonic::transport::Error> {
        let channel = config.endpoint()?.connect().await?;
        Ok(Self {
            client: UserServiceClient::new(channel),
        })
    }

    pub async fn connect(endpoint: &str) -> Result<Self, tonic::transport::Error> {
        Self::new(UserClientConfig {
            endpoint: endpoint.to_string(),
            ..Default::default()
        })
        .await
    }

    pub fn connect_lazy(config: UserClientConfig) -> Result<Self, tonic::transport::Error> {
        let channel = config.endpoint()?.connect_lazy();
        Ok(Self {
            client: UserServiceClient::new(channel),
        })
    }

    pub async fn register(
        &self,
        username: String,
        password: String,
        nickname: String,
    ) -> Result<RegisterReply, tonic::Status> {
        let mut request = Request::new(RegisterRequest {
            username,
            password,
            nickname,
        });
        propagate_context(&mut request);
        Ok(self.client.clone().register(request).await?.into_inner())
    }

    pub async fn login(
        &self,
        username: String,
        password: String,
    ) -> Result<LoginReply, tonic::Status> {
        let mut request = Request::new(LoginRequest { username, password });
        propagate_context(&mut request);
        Ok(self.client.clone().login(request).await?.into_inner())
    }

    pub async fn update_password(
        &self,
        username: String,
        password: String,
        new_password: String,
    ) -> Result<UpdatePasswordReply, tonic::Status> {
        let mut request = Request::new(UpdatePasswordRequest {
            username,
            password,
            new_password,
        });
        propagate_context(&mut request);
        Ok(self
            .client
            .clone()
            .update_password(request)
            .await?
            .into_inner())
    }

    pub async fn valid_token(&self, token: String) -> Result<ValidTokenReply, tonic::Status> {
        let mut request = Request::new(ValidTokenRequest { token });
        propagate_context(&mut request);
        Ok(self.client.clone().valid_token(request).await?.into_inner())
    }
}
