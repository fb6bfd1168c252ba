//! gRPC health checking on top of `tonic-health`.
//!
//! The reporter is driven by the process's store health: [`spawn_infra_watch`]
//! pings the configured stores periodically and flips the gRPC status between
//! `SERVING` and `NOT_SERVING`.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tonic_health::server::HealthReporter as TonicHealthReporter;

use crate::infra::Infrastructure;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthStatus {
    Serving,
    NotServing,
    Unknown,
}

impl From<HealthStatus> for tonic_health::ServingStatus {
    fn from(status: HealthStatus) -> Self {
        match status {
            HealthStatus::Serving => tonic_health::ServingStatus::Serving,
            HealthStatus::NotServing => tonic_health::ServingStatus::NotServing,
            HealthStatus::Unknown => tonic_health::ServingStatus::Unknown,
        }
    }
}

/// Updates the status of one named gRPC service and of the server as a whole
/// (the empty service name).
#[derive(Clone)]
pub struct HealthReporter {
    inner: Arc<Mutex<TonicHealthReporter>>,
    service_name: String,
}

impl HealthReporter {
    pub fn new(reporter: TonicHealthReporter, service_name: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(reporter)),
            service_name: service_name.into(),
        }
    }

    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    pub async fn set_status(&self, status: HealthStatus) {
        let mut reporter = self.inner.lock().await;
        reporter
            .set_service_status(&self.service_name, status.into())
            .await;
        reporter.set_service_status("", status.into()).await;
    }

    pub async fn set_serving(&self) {
        self.set_status(HealthStatus::Serving).await;
    }

    pub async fn set_not_serving(&self) {
        self.set_status(HealthStatus::NotServing).await;
    }
}

pub struct HealthComponents<S> {
    pub server: tonic_health::pb::health_server::HealthServer<S>,
    pub reporter: HealthReporter,
}

/// Health service for `service_name` (the fully-qualified proto service),
/// initially `SERVING`.
pub async fn create_health_service(
    service_name: impl Into<String>,
) -> HealthComponents<impl tonic_health::pb::health_server::Health> {
    let (reporter, health_server) = tonic_health::server::health_reporter();
    let reporter = HealthReporter::new(reporter, service_name);
    reporter.set_serving().await;

    HealthComponents {
        server: health_server,
        reporter,
    }
}

/// Mirror store health into the gRPC health status every `interval` until
/// `cancel` fires.
pub fn spawn_infra_watch(
    reporter: HealthReporter,
    infra: Infrastructure,
    interval: Duration,
    cancel: CancellationToken,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut last = HealthStatus::Serving;
        let mut ticker = tokio::time::interval(interval);
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {}
            }

            let health = infra.health().await;
            let status = if health.is_healthy() {
                HealthStatus::Serving
            } else {
                HealthStatus::NotServing
            };
            if status != last {
                tracing::warn!(
                    service = %reporter.service_name(),
                    ?status,
                    stores = ?health.stores,
                    "gRPC health status changed"
                );
                reporter.set_status(status).await;
                last = status;
            }
        }
    })
}
