//! Connections to the shared stores.
//!
//! [`Infrastructure`] is built once at process start from [`InfraConfig`] and
//! handed to the components that need it. Every store is optional: a handle is
//! present only when its connection settings were provided.

use std::collections::BTreeMap;
use std::time::Duration;

use mongodb::{bson::doc, Client as MongoClient, Database};
use redis::aio::ConnectionManager;
use serde::Serialize;
use sqlx::mysql::{MySqlPool, MySqlPoolOptions};

use crate::config::{InfraConfig, MongoConfig, MysqlConfig, RedisConfig};
use crate::error::AppError;

#[derive(Clone, Default)]
pub struct Infrastructure {
    pub mongo: Option<Database>,
    pub redis: Option<ConnectionManager>,
    pub mysql: Option<MySqlPool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreStatus {
    Up,
    Down,
}

/// Per-store status as reported on `/health`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct InfraHealth {
    #[serde(flatten)]
    pub stores: BTreeMap<&'static str, StoreStatus>,
}

impl InfraHealth {
    pub fn is_healthy(&self) -> bool {
        self.stores.values().all(|s| *s == StoreStatus::Up)
    }
}

impl Infrastructure {
    pub async fn connect(config: &InfraConfig) -> Result<Self, AppError> {
        let mongo = match &config.mongodb {
            Some(cfg) => Some(connect_mongo(cfg).await?),
            None => None,
        };
        let redis = match &config.redis {
            Some(cfg) => Some(connect_redis(cfg).await?),
            None => None,
        };
        let mysql = match &config.mysql {
            Some(cfg) => Some(connect_mysql(cfg).await?),
            None => None,
        };
        Ok(Self {
            mongo,
            redis,
            mysql,
        })
    }

    pub fn mongo(&self) -> Result<&Database, AppError> {
        self.mongo.as_ref().ok_or_else(|| {
            AppError::ConfigError(anyhow::anyhow!("MongoDB is not configured"))
        })
    }

    /// Ping every configured store.
    pub async fn health(&self) -> InfraHealth {
        let mut stores = BTreeMap::new();

        if let Some(db) = &self.mongo {
            let status = match db.run_command(doc! { "ping": 1 }, None).await {
                Ok(_) => StoreStatus::Up,
                Err(e) => {
                    tracing::error!("MongoDB health check failed: {}", e);
                    StoreStatus::Down
                }
            };
            stores.insert("mongodb", status);
        }

        if let Some(manager) = &self.redis {
            let mut conn = manager.clone();
            let status = match redis::cmd("PING").query_async::<_, String>(&mut conn).await {
                Ok(_) => StoreStatus::Up,
                Err(e) => {
                    tracing::error!("Redis health check failed: {}", e);
                    StoreStatus::Down
                }
            };
            stores.insert("redis", status);
        }

        if let Some(pool) = &self.mysql {
            let status = match sqlx::query("SELECT 1").execute(pool).await {
                Ok(_) => StoreStatus::Up,
                Err(e) => {
                    tracing::error!("MySQL health check failed: {}", e);
                    StoreStatus::Down
                }
            };
            stores.insert("mysql", status);
        }

        InfraHealth { stores }
    }
}

async fn connect_mongo(config: &MongoConfig) -> Result<Database, AppError> {
    tracing::info!("Connecting to MongoDB");
    let client = MongoClient::with_uri_str(&config.uri).await.map_err(|e| {
        tracing::error!("Failed to connect to MongoDB: {}", e);
        AppError::DatabaseError(anyhow::anyhow!(e.to_string()))
    })?;
    tracing::info!(database = %config.database, "Connected to MongoDB");
    Ok(client.database(&config.database))
}

async fn connect_redis(config: &RedisConfig) -> Result<ConnectionManager, AppError> {
    tracing::info!("Connecting to Redis");
    let client = redis::Client::open(config.url.clone())?;
    let manager = client.get_connection_manager().await.map_err(|e| {
        tracing::error!("Failed to get Redis connection manager: {}", e);
        AppError::RedisError(e)
    })?;
    tracing::info!("Connected to Redis");
    Ok(manager)
}

async fn connect_mysql(config: &MysqlConfig) -> Result<MySqlPool, AppError> {
    tracing::info!("Connecting to MySQL");
    let pool = MySqlPoolOptions::new()
        .max_connections(10)
        .acquire_timeout(Duration::from_secs(30))
        .idle_timeout(Duration::from_secs(600))
        .connect(&config.url)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to connect: {}", e)))?;
    tracing::info!("MySQL connection pool established");
    Ok(pool)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn empty_infrastructure_is_healthy() {
        let infra = Infrastructure::connect(&InfraConfig::default()).await.unwrap();
        let health = infra.health().await;
        assert!(health.stores.is_empty());
        assert!(health.is_healthy());
        assert!(infra.mongo().is_err());
    }

    #[test]
    fn health_serializes_per_store() {
        let mut stores = BTreeMap::new();
        stores.insert("mongodb", StoreStatus::Up);
        stores.insert("redis", StoreStatus::Down);
        let health = InfraHealth { stores };
        assert!(!health.is_healthy());
        assert_eq!(
            serde_json::to_value(&health).unwrap(),
            serde_json::json!({"mongodb": "up", "redis": "down"})
        );
    }

    #[tokio::test]
    #[ignore = "requires MongoDB on localhost:27017"]
    async fn connects_to_local_mongo() {
        let config = InfraConfig {
            mongodb: Some(MongoConfig {
                uri: "mongodb://localhost:27017".to_string(),
                database: "svckit_test".to_string(),
            }),
            ..Default::default()
        };
        let infra = Infrastructure::connect(&config).await.unwrap();
        assert!(infra.health().await.is_healthy());
    }
}
