use std::sync::Arc;

use async_trait::async_trait;
use metrics::counter;

use super::string::{StringError, StringService};

pub struct LoggingStringService {
    next: Arc<dyn StringService>,
}

impl LoggingStringService {
    pub fn new(next: Arc<dyn StringService>) -> Self {
        Self { next }
    }
}

#[async_trait]
impl StringService for LoggingStringService {
    async fn uppercase(&self, s: &str) -> Result<String, StringError> {
        let result = self.next.uppercase(s).await;
        match &result {
            Ok(v) => tracing::info!(method = "uppercase", s, v = %v, "called"),
            Err(e) => tracing::info!(method = "uppercase", s, err = %e, "called"),
        }
        result
    }

    async fn count(&self, s: &str) -> usize {
        let v = self.next.count(s).await;
        tracing::info!(method = "count", s, v, "called");
        v
    }
}

/// Counts `characters_uppercased` and `characters_counted`.
pub struct InstrumentingStringService {
    next: Arc<dyn StringService>,
}

impl InstrumentingStringService {
    pub fn new(next: Arc<dyn StringService>) -> Self {
        Self { next }
    }
}

#[async_trait]
impl StringService for InstrumentingStringService {
    async fn uppercase(&self, s: &str) -> Result<String, StringError> {
        let v = self.next.uppercase(s).await?;
        counter!("characters_uppercased").increment(v.chars().count() as u64);
        Ok(v)
    }

    async fn count(&self, s: &str) -> usize {
        let v = self.next.count(s).await;
        counter!("characters_counted").increment(v as u64);
        v
    }
}
