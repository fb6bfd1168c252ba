//! Configuration shared by every svckit process.
//!
//! `Config` is loaded through the `config` crate (optional `configuration`
//! file, `APP__*` environment overrides). The remaining sections are read from
//! plain environment variables with [`get_env`], which fails in production when
//! a value is missing and falls back to a default in development.

use crate::error::AppError;
use config::{Config as Cfg, File};
use serde::Deserialize;
use std::env;
use uuid::Uuid;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_port() -> u16 {
    8080
}

impl Config {
    pub fn load() -> Result<Self, AppError> {
        Self::load_with_port(default_port())
    }

    /// Like [`Config::load`] with a per-process default port. `PORT` wins
    /// over `APP__PORT`, which wins over the file.
    pub fn load_with_port(default: u16) -> Result<Self, AppError> {
        dotenvy::dotenv().ok();

        let config = Cfg::builder()
            .set_default("port", i64::from(default))?
            .add_source(File::with_name("configuration").required(false))
            .add_source(config::Environment::with_prefix("APP").separator("__"))
            .build()?;

        let mut config: Config = config.try_deserialize()?;
        config.port = get_env_parsed("PORT", config.port)?;
        Ok(config)
    }

    /// gRPC listens next to HTTP unless `GRPC_PORT` says otherwise. Port 0
    /// (tests) stays 0 so the OS picks both.
    pub fn grpc_port(&self) -> Result<u16, AppError> {
        let default = if self.port == 0 {
            0
        } else {
            self.port.saturating_add(1)
        };
        get_env_parsed("GRPC_PORT", default)
    }
}

/// Returns true when `ENVIRONMENT=prod`.
pub fn is_prod() -> bool {
    env::var("ENVIRONMENT").unwrap_or_else(|_| "dev".to_string()) == "prod"
}

pub fn get_env(key: &str, default: Option<&str>, is_prod: bool) -> Result<String, AppError> {
    match env::var(key) {
        Ok(val) => Ok(val),
        Err(_) => {
            if is_prod {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required in production but not set",
                    key
                )))
            } else if let Some(def) = default {
                Ok(def.to_string())
            } else {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required but not set",
                    key
                )))
            }
        }
    }
}

/// Parse an optional numeric environment variable, keeping `default` when the
/// variable is unset and failing when it is set but malformed.
pub fn get_env_parsed<T>(key: &str, default: T) -> Result<T, AppError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw.parse::<T>().map_err(|e| {
            AppError::ConfigError(anyhow::anyhow!("{} has invalid value '{}': {}", key, raw, e))
        }),
        Err(_) => Ok(default),
    }
}

fn get_env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Identity of the running instance as announced to the registry.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    pub name: String,
    pub host: String,
    pub instance_id: String,
}

impl ServiceConfig {
    pub fn from_env(default_name: &str) -> Result<Self, AppError> {
        let name = get_env("SERVICE_NAME", Some(default_name), false)?;
        let host = get_env("SERVICE_HOST", Some("127.0.0.1"), false)?;
        let instance_id = get_env_opt("SERVICE_INSTANCE_ID")
            .unwrap_or_else(|| format!("{}-{}", name, Uuid::new_v4()));
        Ok(Self {
            name,
            host,
            instance_id,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegistryConfig {
    /// Consul agent address. Registration and discovery are skipped when unset.
    pub consul_url: Option<String>,
    pub health_check_path: String,
}

impl RegistryConfig {
    pub fn from_env() -> Self {
        Self {
            consul_url: get_env_opt("CONSUL_URL"),
            health_check_path: get_env_opt("HEALTH_CHECK_PATH")
                .unwrap_or_else(|| "health".to_string()),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MongoConfig {
    pub uri: String,
    pub database: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RedisConfig {
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MysqlConfig {
    pub url: String,
}

/// Connection settings for the shared stores. Every store is optional; only
/// the configured ones are connected at startup.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InfraConfig {
    pub mongodb: Option<MongoConfig>,
    pub redis: Option<RedisConfig>,
    pub mysql: Option<MysqlConfig>,
}

impl InfraConfig {
    pub fn from_env(default_database: &str) -> Self {
        Self {
            mongodb: get_env_opt("MONGODB_URI").map(|uri| MongoConfig {
                uri,
                database: get_env_opt("MONGODB_DATABASE")
                    .unwrap_or_else(|| default_database.to_string()),
            }),
            redis: get_env_opt("REDIS_URL").map(|url| RedisConfig { url }),
            mysql: get_env_opt("MYSQL_URL").map(|url| MysqlConfig { url }),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TelemetryConfig {
    pub log_level: String,
    pub otlp_endpoint: Option<String>,
}

impl TelemetryConfig {
    pub fn from_env() -> Self {
        Self {
            log_level: get_env_opt("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
            otlp_endpoint: get_env_opt("OTLP_ENDPOINT"),
        }
    }
}

/// Settings for the per-endpoint middleware chain.
#[derive(Debug, Clone, Deserialize)]
pub struct EndpointConfig {
    /// Requests per second admitted by the rate limiter. Zero disables it.
    pub rate_limit_per_second: u32,
    pub breaker_max_failures: u32,
    pub breaker_open_seconds: u64,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            rate_limit_per_second: 100,
            breaker_max_failures: 5,
            breaker_open_seconds: 30,
        }
    }
}

impl EndpointConfig {
    pub fn from_env() -> Result<Self, AppError> {
        let defaults = Self::default();
        Ok(Self {
            rate_limit_per_second: get_env_parsed(
                "RATE_LIMIT_PER_SECOND",
                defaults.rate_limit_per_second,
            )?,
            breaker_max_failures: get_env_parsed(
                "BREAKER_MAX_FAILURES",
                defaults.breaker_max_failures,
            )?,
            breaker_open_seconds: get_env_parsed(
                "BREAKER_OPEN_SECONDS",
                defaults.breaker_open_seconds,
            )?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_env_uses_default_outside_prod() {
        let value = get_env("SVCKIT_TEST_UNSET_KEY", Some("fallback"), false).unwrap();
        assert_eq!(value, "fallback");
    }

    #[test]
    fn get_env_requires_value_in_prod() {
        let err = get_env("SVCKIT_TEST_UNSET_KEY", Some("fallback"), true).unwrap_err();
        assert!(matches!(err, AppError::ConfigError(_)));
    }

    #[test]
    fn get_env_parsed_keeps_default_when_unset() {
        let value: u32 = get_env_parsed("SVCKIT_TEST_UNSET_NUMBER", 7).unwrap();
        assert_eq!(value, 7);
    }

    #[test]
    fn grpc_port_stays_zero_for_ephemeral_http() {
        let config = Config { port: 0 };
        assert_eq!(config.grpc_port().unwrap(), 0);
    }

    #[test]
    fn endpoint_defaults() {
        let config = EndpointConfig::default();
        assert_eq!(config.rate_limit_per_second, 100);
        assert_eq!(config.breaker_max_failures, 5);
    }
}
