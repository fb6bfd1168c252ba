//! Process wiring for the user service: stores, HTTP and gRPC servers.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{routing::get, Router};
use service_core::error::AppError;
use service_core::grpc::{
    create_health_service, create_reflection_service, server_interceptor, spawn_infra_watch,
    GrpcServerBuilder,
};
use service_core::infra::Infrastructure;
use service_core::middleware::with_standard_layers;
use service_core::observability::metrics_endpoint;
use service_core::registry::Registration;
use tokio::net::TcpListener;
use tokio_stream::wrappers::TcpListenerStream;
use tokio_util::sync::CancellationToken;

use crate::config::{UserConfig, SERVICE_NAME};
use crate::endpoints::UserEndpoints;
use crate::grpc::proto::{user_service_server::UserServiceServer, FILE_DESCRIPTOR_SET};
use crate::grpc::UserGrpcService;
use crate::handlers::{self, health};
use crate::services::{self, JwtService};
use crate::store::{InMemoryUserStore, MongoUserStore, UserStore};

const GRPC_SERVICE: &str = "svckit.user.v1.UserService";
const INFRA_CHECK_INTERVAL: Duration = Duration::from_secs(15);

/// Full HTTP surface; `/health` reports every configured store.
pub fn build_router(endpoints: UserEndpoints, infra: Infrastructure) -> Router {
    let app = Router::new()
        .route("/health", get(health::health_check))
        .with_state(infra)
        .route("/ready", get(health::readiness_check))
        .route("/metrics", get(metrics_endpoint))
        .merge(handlers::router(endpoints));
    with_standard_layers(app)
}

/// MongoDB when configured, otherwise an in-process store.
pub async fn create_store(infra: &Infrastructure) -> Result<Arc<dyn UserStore>, AppError> {
    match &infra.mongo {
        Some(db) => Ok(Arc::new(MongoUserStore::new(db).await?)),
        None => {
            tracing::warn!("MongoDB not configured, users are kept in memory");
            Ok(Arc::new(InMemoryUserStore::new()))
        }
    }
}

pub struct Application {
    http_port: u16,
    grpc_port: u16,
    http_listener: TcpListener,
    grpc_listener: TcpListener,
    config: UserConfig,
    infra: Infrastructure,
    endpoints: UserEndpoints,
    shutdown: CancellationToken,
}

impl Application {
    pub async fn build(config: UserConfig) -> Result<Self, AppError> {
        let infra = Infrastructure::connect(&config.infra).await?;
        let store = create_store(&infra).await?;
        let service = services::new_service(store, JwtService::from_config(&config.jwt));
        let endpoints = UserEndpoints::new(service, &config.endpoint);

        let http_addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
        let http_listener = TcpListener::bind(http_addr).await.map_err(|e| {
            tracing::error!("Failed to bind HTTP listener to {}: {}", http_addr, e);
            AppError::from(e)
        })?;
        let http_port = http_listener.local_addr()?.port();

        let grpc_addr = SocketAddr::from(([0, 0, 0, 0], config.grpc_port));
        let grpc_listener = TcpListener::bind(grpc_addr).await.map_err(|e| {
            tracing::error!("Failed to bind gRPC listener to {}: {}", grpc_addr, e);
            AppError::from(e)
        })?;
        let grpc_port = grpc_listener.local_addr()?.port();

        tracing::info!(
            "User service: HTTP on port {}, gRPC on port {}",
            http_port,
            grpc_port
        );

        Ok(Self {
            http_port,
            grpc_port,
            http_listener,
            grpc_listener,
            config,
            infra,
            endpoints,
            shutdown: CancellationToken::new(),
        })
    }

    pub fn http_port(&self) -> u16 {
        self.http_port
    }

    pub fn grpc_port(&self) -> u16 {
        self.grpc_port
    }

    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        let registration = Registration::from_config(
            &self.config.registry,
            &self.config.service,
            self.http_port,
            self.grpc_port,
        )
        .await
        .map_err(|e| std::io::Error::other(format!("Registration failed: {}", e)))?;

        let http_router = build_router(self.endpoints.clone(), self.infra.clone());

        let health = create_health_service(GRPC_SERVICE).await;
        let infra_watch = spawn_infra_watch(
            health.reporter.clone(),
            self.infra.clone(),
            INFRA_CHECK_INTERVAL,
            self.shutdown.clone(),
        );
        let reflection_service = create_reflection_service(&[FILE_DESCRIPTOR_SET]).map_err(|e| {
            std::io::Error::other(format!("Failed to build reflection service: {}", e))
        })?;

        let shutdown = self.shutdown.clone();
        let incoming = TcpListenerStream::new(self.grpc_listener);
        let grpc_server = GrpcServerBuilder::new(SERVICE_NAME)
            .build_server()
            .add_service(health.server)
            .add_service(reflection_service)
            .add_service(UserServiceServer::with_interceptor(
                UserGrpcService::new(self.endpoints),
                server_interceptor,
            ))
            .serve_with_incoming_shutdown(incoming, shutdown.clone().cancelled_owned());

        let http_server = axum::serve(self.http_listener, http_router)
            .with_graceful_shutdown(shutdown.clone().cancelled_owned());

        let result = tokio::select! {
            result = http_server => result.map_err(|e| {
                tracing::error!("HTTP server error: {}", e);
                std::io::Error::other(format!("HTTP server error: {}", e))
            }),
            result = grpc_server => result.map_err(|e| {
                tracing::error!("gRPC server error: {}", e);
                std::io::Error::other(format!("gRPC server error: {}", e))
            }),
        };

        shutdown.cancel();
        if let Err(e) = infra_watch.await {
            tracing::warn!("Infrastructure watch ended abnormally: {}", e);
        }
        health.reporter.set_not_serving().await;
        if let Some(registration) = registration {
            if let Err(e) = registration.deregister().await {
                tracing::warn!("Failed to deregister: {}", e);
            }
        }

        result
    }
}
