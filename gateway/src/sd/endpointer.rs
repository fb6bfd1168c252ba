use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use service_core::error::AppError;
use service_core::registry::ServiceInstance;
use tokio::sync::watch;

/// Builds the endpoint for one instance. Called again only when the
/// instance's registration changes.
pub type Factory<T> = Arc<dyn Fn(&ServiceInstance) -> Result<T, AppError> + Send + Sync>;

struct Cached<T> {
    instance: ServiceInstance,
    endpoint: T,
}

struct State<T> {
    instances: watch::Receiver<Vec<ServiceInstance>>,
    cache: HashMap<String, Cached<T>>,
    endpoints: Arc<Vec<T>>,
}

/// One endpoint per discovered instance, in instance order.
///
/// The set is rebuilt lazily, on the first read after the instance list
/// changed. Instances whose registration is unchanged keep their endpoint;
/// instances the factory fails for are left out until the next change.
pub struct Endpointer<T> {
    service: String,
    factory: Factory<T>,
    state: Mutex<State<T>>,
}

impl<T: Clone + Send + Sync + 'static> Endpointer<T> {
    pub fn new(
        service: impl Into<String>,
        mut instances: watch::Receiver<Vec<ServiceInstance>>,
        factory: Factory<T>,
    ) -> Self {
        let service = service.into();
        let current = instances.borrow_and_update().clone();
        let mut state = State {
            instances,
            cache: HashMap::new(),
            endpoints: Arc::new(Vec::new()),
        };
        rebuild(&service, &factory, &mut state, &current);

        Self {
            service,
            factory,
            state: Mutex::new(state),
        }
    }

    pub fn endpoints(&self) -> Arc<Vec<T>> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        // A closed channel keeps the last known set.
        if state.instances.has_changed().unwrap_or(false) {
            let current = state.instances.borrow_and_update().clone();
            rebuild(&self.service, &self.factory, &mut state, &current);
        }
        state.endpoints.clone()
    }
}

fn rebuild<T: Clone>(
    service: &str,
    factory: &Factory<T>,
    state: &mut State<T>,
    instances: &[ServiceInstance],
) {
    let mut previous = std::mem::take(&mut state.cache);
    let mut endpoints = Vec::with_capacity(instances.len());

    for instance in instances {
        let reused = previous
            .remove(&instance.id)
            .filter(|cached| cached.instance == *instance);

        let cached = match reused {
            Some(cached) => cached,
            None => match factory(instance) {
                Ok(endpoint) => Cached {
                    instance: instance.clone(),
                    endpoint,
                },
                Err(e) => {
                    tracing::warn!(
                        service = %service,
                        instance_id = %instance.id,
                        "Failed to create endpoint: {}",
                        e
                    );
                    continue;
                }
            },
        };

        endpoints.push(cached.endpoint.clone());
        state.cache.insert(instance.id.clone(), cached);
    }

    metrics::gauge!("gateway_backend_endpoints", "service" => service.to_string())
        .set(endpoints.len() as f64);
    tracing::debug!(
        service = %service,
        endpoints = endpoints.len(),
        dropped = previous.len(),
        "Endpoint set rebuilt"
    );
    state.endpoints = Arc::new(endpoints);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn instance(id: &str, port: u16) -> ServiceInstance {
        ServiceInstance::new(id, "addsvc", "127.0.0.1", port)
    }

    fn counting_factory(calls: Arc<AtomicUsize>) -> Factory<String> {
        Arc::new(move |instance: &ServiceInstance| {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(instance.address())
        })
    }

    #[test]
    fn builds_one_endpoint_per_instance() {
        let (_tx, rx) = watch::channel(vec![instance("a", 1), instance("b", 2)]);
        let calls = Arc::new(AtomicUsize::new(0));
        let endpointer = Endpointer::new("addsvc", rx, counting_factory(calls.clone()));

        assert_eq!(
            *endpointer.endpoints(),
            vec!["127.0.0.1:1".to_string(), "127.0.0.1:2".to_string()]
        );
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn reuses_unchanged_instances_and_drops_removed_ones() {
        let (tx, rx) = watch::channel(vec![instance("a", 1), instance("b", 2)]);
        let calls = Arc::new(AtomicUsize::new(0));
        let endpointer = Endpointer::new("addsvc", rx, counting_factory(calls.clone()));
        assert_eq!(endpointer.endpoints().len(), 2);

        tx.send(vec![instance("b", 2), instance("c", 3)]).unwrap();
        assert_eq!(
            *endpointer.endpoints(),
            vec!["127.0.0.1:2".to_string(), "127.0.0.1:3".to_string()]
        );
        // only "c" was new
        assert_eq!(calls.load(Ordering::SeqCst), 3);

        tx.send(vec![instance("b", 9)]).unwrap();
        assert_eq!(*endpointer.endpoints(), vec!["127.0.0.1:9".to_string()]);
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn factory_failures_skip_the_instance() {
        let (_tx, rx) = watch::channel(vec![instance("bad", 1), instance("good", 2)]);
        let factory: Factory<String> = Arc::new(|instance: &ServiceInstance| {
            if instance.id == "bad" {
                Err(AppError::BadGateway("unreachable".to_string()))
            } else {
                Ok(instance.id.clone())
            }
        });
        let endpointer = Endpointer::new("addsvc", rx, factory);
        assert_eq!(*endpointer.endpoints(), vec!["good".to_string()]);
    }
}
