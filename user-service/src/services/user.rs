use std::sync::Arc;

use async_trait::async_trait;
use service_core::domain::DomainError;
use service_core::error::AppError;
use thiserror::Error;

use super::jwt::JwtService;
use super::password::{hash_password, verify_password};
use crate::models::User;
use crate::store::{StoreError, UserStore};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UserError {
    #[error("username existed")]
    UsernameExists,
    #[error("user not found")]
    NotFound,
    #[error("wrong password")]
    WrongPassword,
    #[error("username or password not match")]
    UsernameOrPasswordMismatch,
    #[error("invalid token")]
    InvalidToken,
    #[error("{0}")]
    Remote(String),
}

impl DomainError for UserError {
    fn from_message(msg: &str) -> Option<Self> {
        [
            UserError::UsernameExists,
            UserError::NotFound,
            UserError::WrongPassword,
            UserError::UsernameOrPasswordMismatch,
            UserError::InvalidToken,
        ]
        .into_iter()
        .find(|e| e.to_string() == msg)
    }

    fn remote(msg: String) -> Self {
        UserError::Remote(msg)
    }

    fn is_business(&self) -> bool {
        !matches!(self, UserError::Remote(_))
    }
}

/// Either a rule violation, reported to the caller as a value, or a failure
/// of the store or hashing, which surfaces as a transport error.
#[derive(Debug, Error)]
pub enum UserServiceError {
    #[error(transparent)]
    Domain(#[from] UserError),
    #[error(transparent)]
    Infra(#[from] AppError),
}

impl From<StoreError> for UserServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Duplicate => UserError::UsernameExists.into(),
            StoreError::Backend(e) => e.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedToken {
    pub token: String,
    pub expires_in: i64,
}

#[async_trait]
pub trait UserService: Send + Sync {
    /// Returns the new user's id.
    async fn register(
        &self,
        username: &str,
        password: &str,
        nickname: &str,
    ) -> Result<String, UserServiceError>;

    async fn login(&self, username: &str, password: &str)
        -> Result<IssuedToken, UserServiceError>;

    async fn update_password(
        &self,
        username: &str,
        password: &str,
        new_password: &str,
    ) -> Result<(), UserServiceError>;

    /// The username carried by a valid, unexpired token.
    async fn valid_token(&self, token: &str) -> Result<String, UserServiceError>;
}

pub struct DefaultUserService {
    store: Arc<dyn UserStore>,
    jwt: JwtService,
}

impl DefaultUserService {
    pub fn new(store: Arc<dyn UserStore>, jwt: JwtService) -> Self {
        Self { store, jwt }
    }
}

#[async_trait]
impl UserService for DefaultUserService {
    async fn register(
        &self,
        username: &str,
        password: &str,
        nickname: &str,
    ) -> Result<String, UserServiceError> {
        let user = User::new(
            username.to_string(),
            nickname.to_string(),
            hash_password(password).await?,
        );
        // The unique index decides; there is no lookup beforehand.
        self.store.insert(&user).await?;
        Ok(user.id)
    }

    async fn login(
        &self,
        username: &str,
        password: &str,
    ) -> Result<IssuedToken, UserServiceError> {
        let user = self
            .store
            .find_by_username(username)
            .await?
            .ok_or(UserError::NotFound)?;

        if !verify_password(password, &user.password_hash).await? {
            return Err(UserError::WrongPassword.into());
        }

        Ok(IssuedToken {
            token: self.jwt.issue(&user.username)?,
            expires_in: self.jwt.expires_in(),
        })
    }

    async fn update_password(
        &self,
        username: &str,
        password: &str,
        new_password: &str,
    ) -> Result<(), UserServiceError> {
        let user = self
            .store
            .find_by_username(username)
            .await?
            .ok_or(UserError::UsernameOrPasswordMismatch)?;

        if !verify_password(password, &user.password_hash).await? {
            return Err(UserError::UsernameOrPasswordMismatch.into());
        }

        let new_hash = hash_password(new_password).await?;
        // Conditional on the hash we verified, so a concurrent change wins.
        self.store
            .replace_password_hash(username, &user.password_hash, &new_hash)
            .await?
            .ok_or(UserError::UsernameOrPasswordMismatch)?;
        Ok(())
    }

    async fn valid_token(&self, token: &str) -> Result<String, UserServiceError> {
        match self.jwt.validate(token) {
            Ok(claims) => Ok(claims.username),
            Err(e) => {
                tracing::debug!(error = %e, "Token rejected");
                Err(UserError::InvalidToken.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryUserStore;
    use secrecy::Secret;

    fn service_with(expiry_seconds: i64) -> (DefaultUserService, Arc<InMemoryUserStore>) {
        let store = Arc::new(InMemoryUserStore::new());
        let jwt = JwtService::new(&Secret::new("secret".to_string()), expiry_seconds);
        (DefaultUserService::new(store.clone(), jwt), store)
    }

    fn domain(err: UserServiceError) -> UserError {
        match err {
            UserServiceError::Domain(e) => e,
            UserServiceError::Infra(e) => panic!("unexpected infra error: {e}"),
        }
    }

    #[tokio::test]
    async fn second_registration_fails_and_password_is_hashed() {
        let (svc, store) = service_with(3600);
        let id = svc.register("alice", "pw", "Alice").await.unwrap();
        assert!(!id.is_empty());

        let err = svc.register("alice", "pw2", "Other").await.unwrap_err();
        assert_eq!(domain(err), UserError::UsernameExists);

        let stored = store.find_by_username("alice").await.unwrap().unwrap();
        assert_ne!(stored.password_hash, "pw");
        assert_eq!(stored.nickname, "Alice");
    }

    #[tokio::test]
    async fn login_distinguishes_unknown_user_and_wrong_password() {
        let (svc, _) = service_with(3600);
        svc.register("bob", "secret", "Bob").await.unwrap();

        let err = svc.login("nobody", "secret").await.unwrap_err();
        assert_eq!(domain(err), UserError::NotFound);

        let err = svc.login("bob", "nope").await.unwrap_err();
        assert_eq!(domain(err), UserError::WrongPassword);

        let issued = svc.login("bob", "secret").await.unwrap();
        assert_eq!(issued.expires_in, 3600);
        assert_eq!(svc.valid_token(&issued.token).await.unwrap(), "bob");
    }

    #[tokio::test]
    async fn token_fails_after_expiry() {
        let (svc, _) = service_with(-1);
        svc.register("eve", "pw", "Eve").await.unwrap();
        let issued = svc.login("eve", "pw").await.unwrap();

        let err = svc.valid_token(&issued.token).await.unwrap_err();
        assert_eq!(domain(err), UserError::InvalidToken);
    }

    #[tokio::test]
    async fn wrong_old_password_leaves_hash_unchanged() {
        let (svc, store) = service_with(3600);
        svc.register("carol", "old", "Carol").await.unwrap();
        let before = store.find_by_username("carol").await.unwrap().unwrap();

        let err = svc.update_password("carol", "wrong", "new").await.unwrap_err();
        assert_eq!(domain(err), UserError::UsernameOrPasswordMismatch);

        let after = store.find_by_username("carol").await.unwrap().unwrap();
        assert_eq!(before.password_hash, after.password_hash);

        let err = svc.update_password("ghost", "old", "new").await.unwrap_err();
        assert_eq!(domain(err), UserError::UsernameOrPasswordMismatch);
    }

    #[tokio::test]
    async fn correct_update_makes_only_new_password_work() {
        let (svc, _) = service_with(3600);
        svc.register("dave", "old", "Dave").await.unwrap();

        svc.update_password("dave", "old", "new").await.unwrap();

        let err = svc.login("dave", "old").await.unwrap_err();
        assert_eq!(domain(err), UserError::WrongPassword);
        assert!(svc.login("dave", "new").await.is_ok());
    }

    #[test]
    fn wire_messages_round_trip() {
        use service_core::domain::{err2str, str2err};

        for err in [
            UserError::UsernameExists,
            UserError::NotFound,
            UserError::WrongPassword,
            UserError::UsernameOrPasswordMismatch,
            UserError::InvalidToken,
        ] {
            assert_eq!(str2err::<UserError>(&err2str(Some(&err))), Some(err));
        }
    }
}
