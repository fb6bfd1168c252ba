//! Client for the add service.

use std::time::Duration;

use tonic::Request;
use tonic::transport::{Channel, Endpoint};

use super::interceptors::propagate_context;
use super::proto::add::add_client::AddClient as AddServiceClient;
use super::proto::add::{ConcatReply, ConcatRequest, SumReply, SumRequest};

#[derive(Clone, Debug)]
pub struct AddClientConfig {
    /// e.g. `http://10.0.0.5:50051`
    pub endpoint: String,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
}

impl Default for AddClientConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:50051".to_string(),
            connect_timeout: Duration::from_secs(5),
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl AddClientConfig {
    fn endpoint(&self) -> Result<Endpoint, tonic::transport::Error> {
        Ok(Endpoint::from_shared(self.endpoint.clone())?
            .connect_timeout(self.connect_timeout)
            .timeout(self.request_timeout))
    }
}

/// Cheap to clone; clones share one channel.
#[derive(Clone)]
pub struct AddClient {
    client: AddServiceClient<Channel>,
}

impl AddClient {
    pub async fn new(config: AddClientConfig) -> Result<Self, tonic::transport::Error> {
        let channel = config.endpoint()?.connect().await?;
        Ok(Self {
            client: AddServiceClient::new(channel),
        })
    }

    pub async fn connect(endpoint: &str) -> Result<Self, tonic::transport::Error> {
        Self::new(AddClientConfig {
            endpoint: endpoint.to_string(),
            ..Default::default()
        })
        .await
    }

    /// Connects on first use instead of up front.
    pub fn connect_lazy(config: AddClientConfig) -> Result<Self, tonic::transport::Error> {
        let channel = config.endpoint()?.connect_lazy();
        Ok(Self {
            client: AddServiceClient::new(channel),
        })
    }

    pub async fn sum(&self, a: i64, b: i64) -> Result<SumReply, tonic::Status> {
        let mut request = Request::new(SumRequest { a, b });
        propagate_context(&mut request);
        let response = self.client.clone().sum(request).await?;
        Ok(response.into_inner())
    }

    pub async fn concat(&self, a: String, b: String) -> Result<ConcatReply, tonic::Status> {
        let mut request = Request::new(ConcatRequest { a, b });
        propagate_context(&mut request);
        let response = self.client.clone().concat(request).await?;
        Ok(response.into_inner())
    }
}
