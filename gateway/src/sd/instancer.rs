use std::sync::Arc;
use std::time::Duration;

use service_core::registry::{Registry, ServiceInstance};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

const ERROR_PAUSE: Duration = Duration::from_secs(1);

/// Follows the passing instances of one service through registry blocking
/// queries and publishes every change on a watch channel.
pub struct Instancer {
    service: String,
    instances: watch::Receiver<Vec<ServiceInstance>>,
    handle: JoinHandle<()>,
}

impl Instancer {
    pub fn spawn(
        registry: Arc<dyn Registry>,
        service: impl Into<String>,
        cancel: CancellationToken,
    ) -> Self {
        let service = service.into();
        let (tx, rx) = watch::channel(Vec::new());
        let handle = tokio::spawn(watch_loop(registry, service.clone(), tx, cancel));

        Self {
            service,
            instances: rx,
            handle,
        }
    }

    pub fn service(&self) -> &str {
        &self.service
    }

    pub fn subscribe(&self) -> watch::Receiver<Vec<ServiceInstance>> {
        self.instances.clone()
    }

    pub fn current(&self) -> Vec<ServiceInstance> {
        self.instances.borrow().clone()
    }

    /// Waits for the watch task to exit after its token was cancelled.
    pub async fn stopped(self) {
        if let Err(e) = self.handle.await {
            tracing::warn!(service = %self.service, "Instancer task failed: {}", e);
        }
    }
}

async fn watch_loop(
    registry: Arc<dyn Registry>,
    service: String,
    tx: watch::Sender<Vec<ServiceInstance>>,
    cancel: CancellationToken,
) {
    let mut index = 0;
    loop {
        let result = tokio::select! {
            _ = cancel.cancelled() => break,
            result = registry.instances(&service, true, index) => result,
        };

        match result {
            Ok((mut instances, new_index)) => {
                instances.sort_by(|a, b| a.id.cmp(&b.id));
                // An index that goes backwards means the registry was reset.
                index = if new_index < index { 0 } else { new_index };

                tx.send_if_modified(|current| {
                    if *current == instances {
                        return false;
                    }
                    tracing::info!(
                        service = %service,
                        count = instances.len(),
                        "Instance set changed"
                    );
                    *current = instances;
                    true
                });
            }
            Err(e) => {
                tracing::warn!(service = %service, "Registry query failed: {}", e);
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = tokio::time::sleep(ERROR_PAUSE) => {}
                }
            }
        }
    }
    tracing::debug!(service = %service, "Instancer stopped");
}
