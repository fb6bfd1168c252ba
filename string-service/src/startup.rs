//! Process wiring: HTTP (health, metrics, business routes) and gRPC (health,
//! reflection, StringService) servers sharing one set of endpoints.

use std::net::SocketAddr;

use axum::{routing::get, Router};
use service_core::error::AppError;
use service_core::grpc::{
    create_health_service, create_reflection_service, server_interceptor, GrpcServerBuilder,
};
use service_core::middleware::with_standard_layers;
use service_core::observability::metrics_endpoint;
use service_core::registry::Registration;
use tokio::net::TcpListener;
use tokio_stream::wrappers::TcpListenerStream;
use tokio_util::sync::CancellationToken;

use crate::config::{StringConfig, SERVICE_NAME};
use crate::endpoints::StringEndpoints;
use crate::grpc::proto::{string_service_server::StringServiceServer, FILE_DESCRIPTOR_SET};
use crate::grpc::StringGrpcService;
use crate::handlers::{self, health};
use crate::services;

const GRPC_SERVICE: &str = "svckit.string.v1.StringService";

/// Full HTTP surface of the service.
pub fn build_router(endpoints: StringEndpoints) -> Router {
    let app = Router::new()
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        .route("/metrics", get(metrics_endpoint))
        .merge(handlers::router(endpoints));
    with_standard_layers(app)
}

pub struct Application {
    http_port: u16,
    grpc_port: u16,
    http_listener: TcpListener,
    grpc_listener: TcpListener,
    config: StringConfig,
    endpoints: StringEndpoints,
    shutdown: CancellationToken,
}

impl Application {
    pub async fn build(config: StringConfig) -> Result<Self, AppError> {
        let endpoints = StringEndpoints::new(services::new_service(), &config.endpoint);

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
            "String service: HTTP on port {}, gRPC on port {}",
            http_port,
            grpc_port
        );

        Ok(Self {
            http_port,
            grpc_port,
            http_listener,
            grpc_listener,
            config,
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

    /// Cancelling the token stops both servers and deregisters the instance.
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

        let http_router = build_router(self.endpoints.clone());

        let health = create_health_service(GRPC_SERVICE).await;
        let reflection_service = create_reflection_service(&[FILE_DESCRIPTOR_SET]).map_err(|e| {
            std::io::Error::other(format!("Failed to build reflection service: {}", e))
        })?;

        let shutdown = self.shutdown.clone();
        let incoming = TcpListenerStream::new(self.grpc_listener);
        let grpc_server = GrpcServerBuilder::new(SERVICE_NAME)
            .build_server()
            .add_service(health.server)
            .add_service(reflection_service)
            .add_service(StringServiceServer::with_interceptor(
                StringGrpcService::new(self.endpoints),
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
        health.reporter.set_not_serving().await;
        if let Some(registration) = registration {
            if let Err(e) = registration.deregister().await {
                tracing::warn!("Failed to deregister: {}", e);
            }
        }

        result
    }
}
