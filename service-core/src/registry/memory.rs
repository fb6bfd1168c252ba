use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::sync::watch;

use super::{Registry, ServiceInstance};
use crate::error::AppError;

#[derive(Clone)]
struct Entry {
    instance: ServiceInstance,
    passing: bool,
}

/// Process-local registry with the same blocking-query behaviour as Consul.
/// Every mutation bumps a shared index.
#[derive(Clone)]
pub struct InMemoryRegistry {
    entries: Arc<DashMap<String, Entry>>,
    index: Arc<watch::Sender<u64>>,
    wait: Duration,
}

impl Default for InMemoryRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryRegistry {
    pub fn new() -> Self {
        Self::with_wait(Duration::from_secs(30))
    }

    pub fn with_wait(wait: Duration) -> Self {
        let (index, _) = watch::channel(1);
        Self {
            entries: Arc::new(DashMap::new()),
            index: Arc::new(index),
            wait,
        }
    }

    /// Flip an instance's health; failing instances are hidden from
    /// `passing_only` queries.
    pub fn set_passing(&self, instance_id: &str, passing: bool) {
        if let Some(mut entry) = self.entries.get_mut(instance_id) {
            entry.passing = passing;
        }
        self.bump();
    }

    pub fn current_index(&self) -> u64 {
        *self.index.borrow()
    }

    fn bump(&self) {
        self.index.send_modify(|index| *index += 1);
    }

    fn snapshot(&self, service: &str, passing_only: bool) -> Vec<ServiceInstance> {
        let mut instances: Vec<ServiceInstance> = self
            .entries
            .iter()
            .filter(|e| e.instance.name == service && (!passing_only || e.passing))
            .map(|e| e.instance.clone())
            .collect();
        instances.sort_by(|a, b| a.id.cmp(&b.id));
        instances
    }
}

#[async_trait]
impl Registry for InMemoryRegistry {
    async fn register(&self, instance: &ServiceInstance) -> Result<(), AppError> {
        self.entries.insert(
            instance.id.clone(),
            Entry {
                instance: instance.clone(),
                passing: true,
            },
        );
        self.bump();
        Ok(())
    }

    async fn deregister(&self, instance_id: &str) -> Result<(), AppError> {
        self.entries.remove(instance_id);
        self.bump();
        Ok(())
    }

    async fn instances(
        &self,
        service: &str,
        passing_only: bool,
        wait_index: u64,
    ) -> Result<(Vec<ServiceInstance>, u64), AppError> {
        let mut rx = self.index.subscribe();
        if wait_index > 0 {
            let deadline = tokio::time::Instant::now() + self.wait;
            while *rx.borrow_and_update() <= wait_index {
                match tokio::time::timeout_at(deadline, rx.changed()).await {
                    Ok(Ok(())) => continue,
                    // Wait elapsed or sender gone: answer with what we have.
                    Ok(Err(_)) | Err(_) => break,
                }
            }
        }
        let index = *rx.borrow();
        Ok((self.snapshot(service, passing_only), index))
    }
}
