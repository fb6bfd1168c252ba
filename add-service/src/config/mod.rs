use serde::Deserialize;
use service_core::config::{
    self as core_config, EndpointConfig, RegistryConfig, ServiceConfig, TelemetryConfig,
};
use service_core::error::AppError;

pub const SERVICE_NAME: &str = "addsvc";
const DEFAULT_PORT: u16 = 8081;

#[derive(Debug, Clone, Deserialize)]
pub struct AddConfig {
    #[serde(flatten)]
    pub common: core_config::Config,
    pub grpc_port: u16,
    pub service: ServiceConfig,
    pub registry: RegistryConfig,
    pub telemetry: TelemetryConfig,
    pub endpoint: EndpointConfig,
}

impl AddConfig {
    pub fn load() -> Result<Self, AppError> {
        let common = core_config::Config::load_with_port(DEFAULT_PORT)?;
        let grpc_port = common.grpc_port()?;

        Ok(AddConfig {
            common,
            grpc_port,
            service: ServiceConfig::from_env(SERVICE_NAME)?,
            registry: RegistryConfig::from_env(),
            telemetry: TelemetryConfig::from_env(),
            endpoint: EndpointConfig::from_env()?,
        })
    }

    /// Ephemeral ports, no registry. Used by tests.
    pub fn for_tests() -> Self {
        AddConfig {
            common: core_config::Config { port: 0 },
            grpc_port: 0,
            service: ServiceConfig {
                name: SERVICE_NAME.to_string(),
                host: "127.0.0.1".to_string(),
                instance_id: format!("{}-test", SERVICE_NAME),
            },
            registry: RegistryConfig {
                consul_url: None,
                health_check_path: "health".to_string(),
            },
            telemetry: TelemetryConfig {
                log_level: "error".to_string(),
                otlp_endpoint: None,
            },
            endpoint: EndpointConfig::default(),
        }
    }
}
