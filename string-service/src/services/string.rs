use async_trait::async_trait;
use service_core::domain::DomainError;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StringError {
    #[error("Empty string")]
    Empty,
    #[error("{0}")]
    Remote(String),
}

impl DomainError for StringError {
    fn from_message(msg: &str) -> Option<Self> {
        (msg == StringError::Empty.to_string()).then_some(StringError::Empty)
    }

    fn remote(msg: String) -> Self {
        StringError::Remote(msg)
    }

    fn is_business(&self) -> bool {
        matches!(self, StringError::Empty)
    }
}

#[async_trait]
pub trait StringService: Send + Sync {
    async fn uppercase(&self, s: &str) -> Result<String, StringError>;

    /// Length of `s` in bytes.
    async fn count(&self, s: &str) -> usize;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct BasicStringService;

#[async_trait]
impl StringService for BasicStringService {
    async fn uppercase(&self, s: &str) -> Result<String, StringError> {
        if s.is_empty() {
            return Err(StringError::Empty);
        }
        Ok(s.to_uppercase())
    }

    async fn count(&self, s: &str) -> usize {
        s.len()
    }
}
