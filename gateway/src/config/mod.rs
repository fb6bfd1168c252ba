use std::time::Duration;

use serde::Deserialize;
use service_core::config::{
    self as core_config, get_env, get_env_parsed, is_prod, EndpointConfig, RegistryConfig,
    TelemetryConfig,
};
use service_core::error::AppError;

pub const SERVICE_NAME: &str = "gateway";
const DEFAULT_PORT: u16 = 9090;
const DEFAULT_RETRY_MAX: usize = 3;
const DEFAULT_RETRY_TIMEOUT_MS: u64 = 500;
const DEFAULT_IP_RATE_LIMIT_PER_MINUTE: u32 = 600;

#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
    #[serde(flatten)]
    pub common: core_config::Config,
    pub registry: RegistryConfig,
    pub telemetry: TelemetryConfig,
    /// Per-instance rate limit and circuit breaker settings.
    pub endpoint: EndpointConfig,
    pub retry: RetryConfig,
    pub cors_allowed_origins: Vec<String>,
    /// Requests per client IP per minute; 0 disables the limit.
    pub ip_rate_limit_per_minute: u32,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct RetryConfig {
    /// Attempts per request, across instances.
    pub max: usize,
    /// Deadline shared by all attempts of one request.
    pub timeout_ms: u64,
}

impl RetryConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max: DEFAULT_RETRY_MAX,
            timeout_ms: DEFAULT_RETRY_TIMEOUT_MS,
        }
    }
}

impl GatewayConfig {
    pub fn load() -> Result<Self, AppError> {
        let registry = RegistryConfig::from_env();
        if is_prod() && registry.consul_url.is_none() {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "CONSUL_URL is required in production but not set"
            )));
        }

        let cors_allowed_origins = get_env(
            "CORS_ALLOWED_ORIGINS",
            Some("http://localhost:3000"),
            false,
        )?
        .split(',')
        .map(|o| o.trim().to_string())
        .filter(|o| !o.is_empty())
        .collect();

        Ok(GatewayConfig {
            common: core_config::Config::load_with_port(DEFAULT_PORT)?,
            registry,
            telemetry: TelemetryConfig::from_env(),
            endpoint: EndpointConfig::from_env()?,
            retry: RetryConfig {
                max: get_env_parsed("GATEWAY_RETRY_MAX", DEFAULT_RETRY_MAX)?,
                timeout_ms: get_env_parsed("GATEWAY_RETRY_TIMEOUT_MS", DEFAULT_RETRY_TIMEOUT_MS)?,
            },
            cors_allowed_origins,
            ip_rate_limit_per_minute: get_env_parsed(
                "GATEWAY_IP_RATE_LIMIT_PER_MINUTE",
                DEFAULT_IP_RATE_LIMIT_PER_MINUTE,
            )?,
        })
    }

    /// Ephemeral port, in-memory registry supplied by the test, no per-IP
    /// limit. The retry deadline is generous so cold gRPC connections do not
    /// trip it.
    pub fn for_tests() -> Self {
        GatewayConfig {
            common: core_config::Config { port: 0 },
            registry: RegistryConfig {
                consul_url: None,
                health_check_path: "health".to_string(),
            },
            telemetry: TelemetryConfig {
                log_level: "error".to_string(),
                otlp_endpoint: None,
            },
            endpoint: EndpointConfig::default(),
            retry: RetryConfig {
                max: DEFAULT_RETRY_MAX,
                timeout_ms: 5_000,
            },
            cors_allowed_origins: vec!["http://localhost:3000".to_string()],
            ip_rate_limit_per_minute: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retry_defaults() {
        let retry = RetryConfig::default();
        assert_eq!(retry.max, 3);
        assert_eq!(retry.timeout(), Duration::from_millis(500));
    }
}
