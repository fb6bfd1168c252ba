//! Persistence for user accounts.

mod memory;
mod mongo;

use async_trait::async_trait;
use service_core::error::AppError;
use thiserror::Error;

use crate::models::User;

pub use memory::InMemoryUserStore;
pub use mongo::MongoUserStore;

#[derive(Debug, Error)]
pub enum StoreError {
    /// The unique username index rejected the insert.
    #[error("username already taken")]
    Duplicate,
    #[error(transparent)]
    Backend(#[from] AppError),
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn insert(&self, user: &User) -> Result<(), StoreError>;

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, AppError>;

    /// Swap the hash only if it still equals `current_hash`, returning the
    /// updated user. `None` when no user matched.
    async fn replace_password_hash(
        &self,
        username: &str,
        current_hash: &str,
        new_hash: &str,
    ) -> Result<Option<User>, AppError>;
}
