use secrecy::Secret;
use serde::Deserialize;
use service_core::config::{
    self as core_config, get_env, get_env_parsed, is_prod, EndpointConfig, InfraConfig,
    RegistryConfig, ServiceConfig, TelemetryConfig,
};
use service_core::error::AppError;

pub const SERVICE_NAME: &str = "usersvc";
const DEFAULT_PORT: u16 = 8083;
const DEFAULT_DATABASE: &str = "usersvc";
const DEV_JWT_SECRET: &str = "dev-only-jwt-secret";

#[derive(Debug, Clone, Deserialize)]
pub struct UserConfig {
    #[serde(flatten)]
    pub common: core_config::Config,
    pub grpc_port: u16,
    pub service: ServiceConfig,
    pub registry: RegistryConfig,
    pub telemetry: TelemetryConfig,
    pub endpoint: EndpointConfig,
    pub infra: InfraConfig,
    pub jwt: JwtConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    /// HS256 signing secret shared by every instance.
    pub secret: Secret<String>,
    pub expiry_seconds: i64,
}

impl JwtConfig {
    pub fn from_env() -> Result<Self, AppError> {
        Ok(Self {
            secret: Secret::new(get_env("JWT_SECRET", Some(DEV_JWT_SECRET), is_prod())?),
            expiry_seconds: get_env_parsed("JWT_EXPIRY_SECONDS", 3600)?,
        })
    }
}

impl UserConfig {
    pub fn load() -> Result<Self, AppError> {
        let common = core_config::Config::load_with_port(DEFAULT_PORT)?;
        let grpc_port = common.grpc_port()?;

        let infra = InfraConfig::from_env(DEFAULT_DATABASE);
        if is_prod() && infra.mongodb.is_none() {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "MONGODB_URI is required in production but not set"
            )));
        }

        Ok(UserConfig {
            common,
            grpc_port,
            service: ServiceConfig::from_env(SERVICE_NAME)?,
            registry: RegistryConfig::from_env(),
            telemetry: TelemetryConfig::from_env(),
            endpoint: EndpointConfig::from_env()?,
            infra,
            jwt: JwtConfig::from_env()?,
        })
    }

    /// Ephemeral ports, no registry and no stores; users are kept in memory.
    pub fn for_tests() -> Self {
        UserConfig {
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
            infra: InfraConfig::default(),
            jwt: JwtConfig {
                secret: Secret::new("test-secret".to_string()),
                expiry_seconds: 3600,
            },
        }
    }
}
