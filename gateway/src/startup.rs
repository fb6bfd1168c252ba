//! Process wiring: one instancer per backend, the backend routers mounted
//! under their service names, and the gateway's own health and metrics.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::{header, HeaderValue, Method};
use axum::middleware::from_fn_with_state;
use axum::{routing::get, Router};
use service_core::error::AppError;
use service_core::middleware::{
    create_ip_rate_limiter, ip_rate_limit_middleware, with_standard_layers,
};
use service_core::observability::metrics_endpoint;
use service_core::registry::{self, InMemoryRegistry, Registry};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;

use crate::config::GatewayConfig;
use crate::handlers::health::{self, Backends};
use crate::routes::{addsvc, stringsvc, usersvc};
use crate::sd::Instancer;

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::error!("Invalid CORS origin '{}': {}. Skipping.", origin, e);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
}

/// Full HTTP surface of the gateway. Instancers start watching the registry
/// immediately and stop when `cancel` fires.
pub fn build_router(
    config: &GatewayConfig,
    registry: Arc<dyn Registry>,
    cancel: &CancellationToken,
) -> (Router, Vec<Instancer>) {
    let instancers: Vec<Instancer> = [addsvc::SERVICE, stringsvc::SERVICE, usersvc::SERVICE]
        .into_iter()
        .map(|service| Instancer::spawn(registry.clone(), service, cancel.child_token()))
        .collect();

    let backends = Backends(Arc::new(vec![
        (addsvc::SERVICE, instancers[0].subscribe()),
        (stringsvc::SERVICE, instancers[1].subscribe()),
        (usersvc::SERVICE, instancers[2].subscribe()),
    ]));

    let app = Router::new()
        .route("/health", get(health::health_check))
        .with_state(backends)
        .route("/metrics", get(metrics_endpoint))
        .nest("/addsvc", addsvc::router(instancers[0].subscribe(), config))
        .nest("/stringsvc", stringsvc::router(instancers[1].subscribe(), config))
        .nest("/usersvc", usersvc::router(instancers[2].subscribe(), config));

    let app = if config.ip_rate_limit_per_minute > 0 {
        app.layer(from_fn_with_state(
            create_ip_rate_limiter(config.ip_rate_limit_per_minute, 60),
            ip_rate_limit_middleware,
        ))
    } else {
        app
    };

    let app = with_standard_layers(app).layer(cors_layer(&config.cors_allowed_origins));
    (app, instancers)
}

pub struct Application {
    port: u16,
    listener: TcpListener,
    router: Router,
    instancers: Vec<Instancer>,
    shutdown: CancellationToken,
}

impl Application {
    /// Discovers through Consul when configured, otherwise through an empty
    /// in-memory registry, which leaves every backend unavailable.
    pub async fn build(config: GatewayConfig) -> Result<Self, AppError> {
        let registry = match registry::from_config(&config.registry)? {
            Some(registry) => registry,
            None => {
                tracing::warn!("No registry configured; all backends will be unavailable");
                Arc::new(InMemoryRegistry::new()) as Arc<dyn Registry>
            }
        };
        Self::build_with_registry(config, registry).await
    }

    pub async fn build_with_registry(
        config: GatewayConfig,
        registry: Arc<dyn Registry>,
    ) -> Result<Self, AppError> {
        let addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind HTTP listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        let shutdown = CancellationToken::new();
        let (router, instancers) = build_router(&config, registry, &shutdown);

        tracing::info!(
            "Gateway listening on port {} (retry max {}, timeout {:?})",
            port,
            config.retry.max,
            config.retry.timeout()
        );

        Ok(Self {
            port,
            listener,
            router,
            instancers,
            shutdown,
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Cancelling the token stops the server and every instancer.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        let shutdown = self.shutdown.clone();
        // Peer addresses feed the per-IP limit when no X-Forwarded-For is sent.
        let service = self
            .router
            .into_make_service_with_connect_info::<SocketAddr>();
        let result = axum::serve(self.listener, service)
            .with_graceful_shutdown(shutdown.clone().cancelled_owned())
            .await
            .map_err(|e| {
                tracing::error!("HTTP server error: {}", e);
                std::io::Error::other(format!("HTTP server error: {}", e))
            });

        shutdown.cancel();
        for instancer in self.instancers {
            instancer.stopped().await;
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    #[tokio::test]
    async fn backends_without_instances_are_unavailable() {
        let cancel = CancellationToken::new();
        let registry: Arc<dyn Registry> = Arc::new(InMemoryRegistry::new());
        let (router, _instancers) =
            build_router(&GatewayConfig::for_tests(), registry, &cancel);

        let response = router
            .oneshot(
                Request::post("/addsvc/sum")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"a":1,"b":2}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        cancel.cancel();
    }

    #[tokio::test]
    async fn health_reports_backend_counts() {
        let cancel = CancellationToken::new();
        let registry: Arc<dyn Registry> = Arc::new(InMemoryRegistry::new());
        let (router, _instancers) =
            build_router(&GatewayConfig::for_tests(), registry, &cancel);

        let response = router
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        cancel.cancel();
    }

    fn preflight(origin: &str) -> Request<Body> {
        Request::builder()
            .method(Method::OPTIONS)
            .uri("/addsvc/sum")
            .header(header::ORIGIN, origin)
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
            .body(Body::empty())
            .unwrap()
    }

    #[tokio::test]
    async fn cors_allows_configured_origins_and_skips_invalid_ones() {
        let cancel = CancellationToken::new();
        let registry: Arc<dyn Registry> = Arc::new(InMemoryRegistry::new());
        let config = GatewayConfig {
            cors_allowed_origins: vec![
                "http://ok.example".to_string(),
                "bad\norigin".to_string(),
            ],
            ..GatewayConfig::for_tests()
        };
        let (router, _instancers) = build_router(&config, registry, &cancel);

        let allowed = router
            .clone()
            .oneshot(preflight("http://ok.example"))
            .await
            .unwrap();
        assert_eq!(
            allowed.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "http://ok.example"
        );

        let other = router.oneshot(preflight("http://evil.example")).await.unwrap();
        assert!(!other
            .headers()
            .contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN));
        cancel.cancel();
    }

    #[tokio::test]
    async fn limits_requests_per_client_ip() {
        let cancel = CancellationToken::new();
        let registry: Arc<dyn Registry> = Arc::new(InMemoryRegistry::new());
        let config = GatewayConfig {
            ip_rate_limit_per_minute: 1,
            ..GatewayConfig::for_tests()
        };
        let (router, _instancers) = build_router(&config, registry, &cancel);

        let health_from = |ip: &str| {
            Request::get("/health")
                .header("x-forwarded-for", ip)
                .body(Body::empty())
                .unwrap()
        };

        let first = router.clone().oneshot(health_from("10.1.1.1")).await.unwrap();
        assert_eq!(first.status(), StatusCode::OK);

        let second = router.clone().oneshot(health_from("10.1.1.1")).await.unwrap();
        assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);
        assert!(second.headers().contains_key(header::RETRY_AFTER));

        let other = router.oneshot(health_from("10.1.1.2")).await.unwrap();
        assert_eq!(other.status(), StatusCode::OK);
        cancel.cancel();
    }
}
