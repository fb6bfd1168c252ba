use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use service_core::error::AppError;

use super::Endpointer;

/// Picks the endpoint for one call.
pub trait Balancer<T>: Send + Sync {
    fn endpoint(&self) -> Result<T, AppError>;
}

pub struct RoundRobin<T> {
    endpointer: Arc<Endpointer<T>>,
    cursor: AtomicUsize,
}

impl<T> RoundRobin<T> {
    pub fn new(endpointer: Arc<Endpointer<T>>) -> Self {
        Self {
            endpointer,
            cursor: AtomicUsize::new(0),
        }
    }
}

impl<T: Clone + Send + Sync + 'static> Balancer<T> for RoundRobin<T> {
    fn endpoint(&self) -> Result<T, AppError> {
        let endpoints = self.endpointer.endpoints();
        if endpoints.is_empty() {
            return Err(AppError::ServiceUnavailable(
                "no endpoints available".to_string(),
            ));
        }
        let idx = self.cursor.fetch_add(1, Ordering::Relaxed) % endpoints.len();
        Ok(endpoints[idx].clone())
    }
}
