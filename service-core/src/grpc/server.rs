//! gRPC server construction.

use std::time::Duration;

use tonic::transport::Server;
use tonic_reflection::server::Builder as ReflectionBuilder;

/// Server settings shared by every svckit service.
pub struct GrpcServerBuilder {
    service_name: String,
    http2_keepalive_interval: Option<Duration>,
    http2_keepalive_timeout: Option<Duration>,
    request_timeout: Option<Duration>,
    concurrency_limit: Option<usize>,
}

impl GrpcServerBuilder {
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            http2_keepalive_interval: Some(Duration::from_secs(30)),
            http2_keepalive_timeout: Some(Duration::from_secs(10)),
            request_timeout: None,
            concurrency_limit: None,
        }
    }

    pub fn with_keepalive_interval(mut self, interval: Duration) -> Self {
        self.http2_keepalive_interval = Some(interval);
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    pub fn with_concurrency_limit(mut self, limit: usize) -> Self {
        self.concurrency_limit = Some(limit);
        self
    }

    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    pub fn build_server(&self) -> Server {
        let mut server = Server::builder();

        if let Some(interval) = self.http2_keepalive_interval {
            server = server.http2_keepalive_interval(Some(interval));
        }
        if let Some(timeout) = self.http2_keepalive_timeout {
            server = server.http2_keepalive_timeout(Some(timeout));
        }
        if let Some(timeout) = self.request_timeout {
            server = server.timeout(timeout);
        }
        if let Some(limit) = self.concurrency_limit {
            server = server.concurrency_limit_per_connection(limit);
        }

        tracing::debug!(service = %self.service_name, "Configured gRPC server");
        server
    }
}

/// Reflection service over the given encoded file descriptor sets.
pub fn create_reflection_service(
    file_descriptor_sets: &[&'static [u8]],
) -> Result<
    tonic_reflection::server::ServerReflectionServer<
        impl tonic_reflection::server::ServerReflection + use<>,
    >,
    tonic_reflection::server::Error,
> {
    let mut builder = ReflectionBuilder::configure();
    for fds in file_descriptor_sets {
        builder = builder.register_encoded_file_descriptor_set(*fds);
    }
    builder.build_v1()
}
