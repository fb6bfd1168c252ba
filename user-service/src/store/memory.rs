use async_trait::async_trait;
use dashmap::{mapref::entry::Entry, DashMap};
use service_core::error::AppError;

use super::{StoreError, UserStore};
use crate::models::User;

/// Users keyed by username. Used when no MongoDB is configured and in tests.
#[derive(Default)]
pub struct InMemoryUserStore {
    users: DashMap<String, User>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn insert(&self, user: &User) -> Result<(), StoreError> {
        match self.users.entry(user.username.clone()) {
            Entry::Occupied(_) => Err(StoreError::Duplicate),
            Entry::Vacant(slot) => {
                slot.insert(user.clone());
                Ok(())
            }
        }
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        Ok(self.users.get(username).map(|u| u.clone()))
    }

    async fn replace_password_hash(
        &self,
        username: &str,
        current_hash: &str,
        new_hash: &str,
    ) -> Result<Option<User>, AppError> {
        let Some(mut user) = self.users.get_mut(username) else {
            return Ok(None);
        };
        if user.password_hash != current_hash {
            return Ok(None);
        }
        user.password_hash = new_hash.to_string();
        Ok(Some(user.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(name: &str) -> User {
        User::new(name.to_string(), "nick".to_string(), "h1".to_string())
    }

    #[tokio::test]
    async fn duplicate_username_is_rejected() {
        let store = InMemoryUserStore::new();
        store.insert(&user("alice")).await.unwrap();
        assert!(matches!(
            store.insert(&user("alice")).await,
            Err(StoreError::Duplicate)
        ));
    }

    #[tokio::test]
    async fn replace_requires_current_hash() {
        let store = InMemoryUserStore::new();
        store.insert(&user("bob")).await.unwrap();

        let stale = store.replace_password_hash("bob", "nope", "h2").await.unwrap();
        assert!(stale.is_none());

        let updated = store
            .replace_password_hash("bob", "h1", "h2")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.password_hash, "h2");
        assert!(store
            .replace_password_hash("carol", "h1", "h2")
            .await
            .unwrap()
            .is_none());
    }
}
