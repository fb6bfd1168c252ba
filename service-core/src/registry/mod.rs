//! Service registration and discovery.
//!
//! Services announce themselves with a [`Registration`] at startup and remove
//! themselves on shutdown. The gateway discovers instances through
//! [`Registry::instances`], which follows blocking-query semantics: with a
//! non-zero `wait_index` the call parks until the registry index moves past it
//! or the registry's wait period elapses.

mod consul;
mod memory;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::{RegistryConfig, ServiceConfig};
use crate::error::AppError;

pub use consul::ConsulRegistry;
pub use memory::InMemoryRegistry;

/// Metadata key carrying the instance's gRPC port.
pub const GRPC_PORT_META: &str = "grpc_port";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceInstance {
    pub id: String,
    pub name: String,
    pub host: String,
    /// HTTP port; the registry health check targets it.
    pub port: u16,
    pub health_check_url: Option<String>,
    #[serde(default)]
    pub meta: HashMap<String, String>,
}

impl ServiceInstance {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        host: impl Into<String>,
        port: u16,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            host: host.into(),
            port,
            health_check_url: None,
            meta: HashMap::new(),
        }
    }

    /// Instance for the running process, with an HTTP health check on
    /// `health_check_path` and the gRPC port advertised in metadata.
    pub fn for_service(
        service: &ServiceConfig,
        registry: &RegistryConfig,
        http_port: u16,
        grpc_port: u16,
    ) -> Self {
        let health_check_url = format!(
            "http://{}:{}/{}",
            service.host,
            http_port,
            registry.health_check_path.trim_start_matches('/')
        );
        Self::new(
            service.instance_id.clone(),
            service.name.clone(),
            service.host.clone(),
            http_port,
        )
        .with_health_check(health_check_url)
        .with_meta(GRPC_PORT_META, grpc_port.to_string())
    }

    pub fn with_health_check(mut self, url: impl Into<String>) -> Self {
        self.health_check_url = Some(url.into());
        self
    }

    pub fn with_meta(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.meta.insert(key.into(), value.into());
        self
    }

    /// `host:port` of the HTTP listener.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// The gRPC port from metadata, falling back to the registered port.
    pub fn grpc_port(&self) -> u16 {
        self.meta
            .get(GRPC_PORT_META)
            .and_then(|p| p.parse().ok())
            .unwrap_or(self.port)
    }

    /// `http://host:grpc_port`, suitable for a tonic endpoint.
    pub fn grpc_uri(&self) -> String {
        format!("http://{}:{}", self.host, self.grpc_port())
    }
}

#[async_trait]
pub trait Registry: Send + Sync {
    async fn register(&self, instance: &ServiceInstance) -> Result<(), AppError>;

    async fn deregister(&self, instance_id: &str) -> Result<(), AppError>;

    /// Instances of `service` and the registry index they were read at.
    ///
    /// `wait_index == 0` returns immediately; otherwise the call blocks until
    /// the index is greater than `wait_index` or the wait period expires, in
    /// which case the unchanged list is returned.
    async fn instances(
        &self,
        service: &str,
        passing_only: bool,
        wait_index: u64,
    ) -> Result<(Vec<ServiceInstance>, u64), AppError>;
}

/// Consul client when `CONSUL_URL` is configured, otherwise `None`.
pub fn from_config(config: &RegistryConfig) -> Result<Option<Arc<dyn Registry>>, AppError> {
    match &config.consul_url {
        Some(url) => Ok(Some(Arc::new(ConsulRegistry::new(url)?))),
        None => Ok(None),
    }
}

/// A registered instance. Call [`Registration::deregister`] on shutdown.
pub struct Registration {
    registry: Arc<dyn Registry>,
    instance: ServiceInstance,
}

impl Registration {
    pub async fn register(
        registry: Arc<dyn Registry>,
        instance: ServiceInstance,
    ) -> Result<Self, AppError> {
        registry.register(&instance).await?;
        tracing::info!(
            service = %instance.name,
            instance_id = %instance.id,
            address = %instance.address(),
            "Registered service instance"
        );
        Ok(Self { registry, instance })
    }

    /// Register the running process when a registry is configured.
    pub async fn from_config(
        registry: &RegistryConfig,
        service: &ServiceConfig,
        http_port: u16,
        grpc_port: u16,
    ) -> Result<Option<Self>, AppError> {
        let Some(client) = from_config(registry)? else {
            tracing::info!("No registry configured, skipping registration");
            return Ok(None);
        };
        let instance = ServiceInstance::for_service(service, registry, http_port, grpc_port);
        Self::register(client, instance).await.map(Some)
    }

    pub fn instance(&self) -> &ServiceInstance {
        &self.instance
    }

    pub async fn deregister(self) -> Result<(), AppError> {
        self.registry.deregister(&self.instance.id).await?;
        tracing::info!(instance_id = %self.instance.id, "Deregistered service instance");
        Ok(())
    }
}
