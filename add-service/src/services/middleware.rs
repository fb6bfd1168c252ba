//! Service-level middleware: wraps an [`AddService`] with logging or
//! business metrics without touching the rules themselves.

use std::sync::Arc;

use async_trait::async_trait;
use metrics::counter;

use super::add::{AddError, AddService};

pub struct LoggingAddService {
    next: Arc<dyn AddService>,
}

impl LoggingAddService {
    pub fn new(next: Arc<dyn AddService>) -> Self {
        Self { next }
    }
}

#[async_trait]
impl AddService for LoggingAddService {
    async fn sum(&self, a: i64, b: i64) -> Result<i64, AddError> {
        let result = self.next.sum(a, b).await;
        match &result {
            Ok(v) => tracing::info!(method = "sum", a, b, v, "called"),
            Err(e) => tracing::info!(method = "sum", a, b, err = %e, "called"),
        }
        result
    }

    async fn concat(&self, a: &str, b: &str) -> Result<String, AddError> {
        let result = self.next.concat(a, b).await;
        match &result {
            Ok(v) => tracing::info!(method = "concat", a, b, v = %v, "called"),
            Err(e) => tracing::info!(method = "concat", a, b, err = %e, "called"),
        }
        result
    }
}

/// Counts `integers_summed` (magnitude of each result) and
/// `characters_concatenated`.
pub struct InstrumentingAddService {
    next: Arc<dyn AddService>,
}

impl InstrumentingAddService {
    pub fn new(next: Arc<dyn AddService>) -> Self {
        Self { next }
    }
}

#[async_trait]
impl AddService for InstrumentingAddService {
    async fn sum(&self, a: i64, b: i64) -> Result<i64, AddError> {
        let v = self.next.sum(a, b).await?;
        counter!("integers_summed").increment(v.unsigned_abs());
        Ok(v)
    }

    async fn concat(&self, a: &str, b: &str) -> Result<String, AddError> {
        let v = self.next.concat(a, b).await?;
        counter!("characters_concatenated").increment(v.len() as u64);
        Ok(v)
    }
}
