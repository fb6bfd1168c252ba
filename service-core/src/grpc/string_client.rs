//! Client for the string service.

use std::time::Duration;

use tonic::Request;
use tonic::transport::{Channel, Endpoint};

use super::interceptors::propagate_context;
use super::proto::string::string_service_client::StringServiceClient;
use super::proto::string::{CountReply, CountRequest, UppercaseReply, UppercaseRequest};

#[derive(Clone, Debug)]
pub struct StringClientConfig {
    pub endpoint: String,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
}

impl Default for StringClientConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:50052".to_string(),
            connect_timeout: Duration::from_secs(5),
            request_timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Clone)]
pub struct StringClient {
    client: StringServiceClient<Channel>,
}

impl StringClient {
    pub async fn new(config: StringClientConfig) -> Result<Self, tonic::transport::Error> {
        let channel = Endpoint::from_shared(config.endpoint)?
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .connect()
            .await?;
        Ok(Self {
            client: StringServiceClient::new(channel),
        })
    }

    pub async fn connect(endpoint: &str) -> Result<Self, tonic::transport::Error> {
        Self::new(StringClientConfig {
            endpoint: endpoint.to_string(),
            ..Default::default()
        })
        .await
    }

    pub fn connect_lazy(config: StringClientConfig) -> Result<Self, tonic::transport::Error> {
        let channel = Endpoint::from_shared(config.endpoint)?
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .connect_lazy();
        Ok(Self {
            client: StringServiceClient::new(channel),
        })
    }

    pub async fn uppercase(&self, s: String) -> Result<UppercaseReply, tonic::Status> {
        let mut request = Request::new(UppercaseRequest { s });
        propagate_context(&mut request);
        Ok(self.client.clone().uppercase(request).await?.into_inner())
    }

    pub async fn count(&self, s: String) -> Result<CountReply, tonic::Status> {
        let mut request = Request::new(CountRequest { s });
        propagate_context(&mut request);
        Ok(self.client.clone().count(request).await?.into_inner())
    }
}
