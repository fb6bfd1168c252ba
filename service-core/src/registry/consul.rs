use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{Registry, ServiceInstance};
use crate::error::AppError;

const CONSUL_INDEX_HEADER: &str = "X-Consul-Index";
const CHECK_INTERVAL: &str = "15s";
const DEREGISTER_CRITICAL_AFTER: &str = "30s";

/// Registry backed by the Consul agent HTTP API.
#[derive(Clone)]
pub struct ConsulRegistry {
    client: Client,
    base_url: String,
    wait: Duration,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct AgentServiceRegistration<'a> {
    #[serde(rename = "ID")]
    id: &'a str,
    name: &'a str,
    address: &'a str,
    port: u16,
    meta: &'a HashMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    check: Option<AgentServiceCheck<'a>>,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct AgentServiceCheck<'a> {
    #[serde(rename = "HTTP")]
    http: &'a str,
    interval: &'a str,
    deregister_critical_service_after: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct HealthEntry {
    node: HealthNode,
    service: HealthService,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct HealthNode {
    #[serde(default)]
    address: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct HealthService {
    #[serde(rename = "ID")]
    id: String,
    service: String,
    #[serde(default)]
    address: String,
    port: u16,
    #[serde(default)]
    meta: Option<HashMap<String, String>>,
}

impl From<HealthEntry> for ServiceInstance {
    fn from(entry: HealthEntry) -> Self {
        // Consul leaves the service address empty when it equals the node's.
        let host = if entry.service.address.is_empty() {
            entry.node.address
        } else {
            entry.service.address
        };
        ServiceInstance {
            id: entry.service.id,
            name: entry.service.service,
            host,
            port: entry.service.port,
            health_check_url: None,
            meta: entry.service.meta.unwrap_or_default(),
        }
    }
}

fn parse_health_entries(body: &[u8]) -> Result<Vec<ServiceInstance>, AppError> {
    let entries: Vec<HealthEntry> = serde_json::from_slice(body).map_err(|e| {
        AppError::BadGateway(format!("invalid Consul health response: {}", e))
    })?;
    Ok(entries.into_iter().map(ServiceInstance::from).collect())
}

impl ConsulRegistry {
    pub fn new(base_url: &str) -> Result<Self, AppError> {
        Self::with_wait(base_url, Duration::from_secs(30))
    }

    /// `wait` bounds each blocking query. The HTTP timeout is kept above it.
    pub fn with_wait(base_url: &str, wait: Duration) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(wait + Duration::from_secs(10))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            wait,
        })
    }
}

#[async_trait]
impl Registry for ConsulRegistry {
    async fn register(&self, instance: &ServiceInstance) -> Result<(), AppError> {
        let body = AgentServiceRegistration {
            id: &instance.id,
            name: &instance.name,
            address: &instance.host,
            port: instance.port,
            meta: &instance.meta,
            check: instance
                .health_check_url
                .as_deref()
                .map(|http| AgentServiceCheck {
                    http,
                    interval: CHECK_INTERVAL,
                    deregister_critical_service_after: DEREGISTER_CRITICAL_AFTER,
                }),
        };

        self.client
            .put(format!("{}/v1/agent/service/register", self.base_url))
            .json(&body)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    async fn deregister(&self, instance_id: &str) -> Result<(), AppError> {
        self.client
            .put(format!(
                "{}/v1/agent/service/deregister/{}",
                self.base_url, instance_id
            ))
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    async fn instances(
        &self,
        service: &str,
        passing_only: bool,
        wait_index: u64,
    ) -> Result<(Vec<ServiceInstance>, u64), AppError> {
        let mut query: Vec<(&str, String)> = Vec::new();
        if passing_only {
            query.push(("passing", "true".to_string()));
        }
        if wait_index > 0 {
            query.push(("index", wait_index.to_string()));
            query.push(("wait", format!("{}s", self.wait.as_secs().max(1))));
        }

        let response = self
            .client
            .get(format!("{}/v1/health/service/{}", self.base_url, service))
            .query(&query)
            .send()
            .await?
            .error_for_status()?;

        let index = response
            .headers()
            .get(CONSUL_INDEX_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(wait_index);

        let body = response.bytes().await?;
        Ok((parse_health_entries(&body)?, index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_health_entries() {
        let body = br#"[
            {
                "Node": {"Node": "n1", "Address": "10.0.0.5"},
                "Service": {
                    "ID": "addsvc-1",
                    "Service": "addsvc",
                    "Address": "",
                    "Port": 8080,
                    "Meta": {"grpc_port": "50051"}
                },
                "Checks": []
            },
            {
                "Node": {"Node": "n2", "Address": "10.0.0.6"},
                "Service": {
                    "ID": "addsvc-2",
                    "Service": "addsvc",
                    "Address": "192.168.1.9",
                    "Port": 8081,
                    "Meta": null
                },
                "Checks": []
            }
        ]"#;

        let instances = parse_health_entries(body).unwrap();
        assert_eq!(instances.len(), 2);
        assert_eq!(instances[0].host, "10.0.0.5");
        assert_eq!(instances[0].grpc_port(), 50051);
        assert_eq!(instances[1].host, "192.168.1.9");
        assert_eq!(instances[1].grpc_port(), 8081);
    }

    #[test]
    fn rejects_malformed_response() {
        let err = parse_health_entries(b"{not json").unwrap_err();
        assert!(matches!(err, AppError::BadGateway(_)));
    }

    #[test]
    fn registration_body_uses_consul_field_names() {
        let meta = HashMap::from([("grpc_port".to_string(), "50051".to_string())]);
        let body = AgentServiceRegistration {
            id: "addsvc-1",
            name: "addsvc",
            address: "10.0.0.5",
            port: 8080,
            meta: &meta,
            check: Some(AgentServiceCheck {
                http: "http://10.0.0.5:8080/health",
                interval: CHECK_INTERVAL,
                deregister_critical_service_after: DEREGISTER_CRITICAL_AFTER,
            }),
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["ID"], "addsvc-1");
        assert_eq!(json["Name"], "addsvc");
        assert_eq!(json["Check"]["HTTP"], "http://10.0.0.5:8080/health");
        assert_eq!(json["Check"]["Interval"], "15s");
        assert_eq!(json["Check"]["DeregisterCriticalServiceAfter"], "30s");
    }

    #[tokio::test]
    #[ignore = "requires a local Consul agent on 127.0.0.1:8500"]
    async fn register_and_discover_against_consul() {
        let registry = ConsulRegistry::new("http://127.0.0.1:8500").unwrap();
        let instance = ServiceInstance::new("svckit-test-1", "svckit-test", "127.0.0.1", 18080);
        registry.register(&instance).await.unwrap();

        let (found, index) = registry.instances("svckit-test", false, 0).await.unwrap();
        assert!(found.iter().any(|i| i.id == "svckit-test-1"));
        assert!(index > 0);

        registry.deregister("svckit-test-1").await.unwrap();
    }
}
