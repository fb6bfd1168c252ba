//! Logging and business metrics around a [`UserService`]. Passwords and
//! tokens are never logged.

use std::sync::Arc;

use async_trait::async_trait;
use metrics::counter;

use super::user::{IssuedToken, UserService, UserServiceError};

fn outcome<T>(result: &Result<T, UserServiceError>) -> &'static str {
    match result {
        Ok(_) => "ok",
        Err(UserServiceError::Domain(_)) => "rejected",
        Err(UserServiceError::Infra(_)) => "error",
    }
}

pub struct LoggingUserService {
    next: Arc<dyn UserService>,
}

impl LoggingUserService {
    pub fn new(next: Arc<dyn UserService>) -> Self {
        Self { next }
    }
}

#[async_trait]
impl UserService for LoggingUserService {
    async fn register(
        &self,
        username: &str,
        password: &str,
        nickname: &str,
    ) -> Result<String, UserServiceError> {
        let result = self.next.register(username, password, nickname).await;
        match &result {
            Ok(id) => tracing::info!(method = "register", username, id = %id, "called"),
            Err(e) => tracing::info!(method = "register", username, err = %e, "called"),
        }
        result
    }

    async fn login(
        &self,
        username: &str,
        password: &str,
    ) -> Result<IssuedToken, UserServiceError> {
        let result = self.next.login(username, password).await;
        match &result {
            Ok(_) => tracing::info!(method = "login", username, "called"),
            Err(e) => tracing::info!(method = "login", username, err = %e, "called"),
        }
        result
    }

    async fn update_password(
        &self,
        username: &str,
        password: &str,
        new_password: &str,
    ) -> Result<(), UserServiceError> {
        let result = self
            .next
            .update_password(username, password, new_password)
            .await;
        match &result {
            Ok(()) => tracing::info!(method = "update_password", username, "called"),
            Err(e) => tracing::info!(method = "update_password", username, err = %e, "called"),
        }
        result
    }

    async fn valid_token(&self, token: &str) -> Result<String, UserServiceError> {
        let result = self.next.valid_token(token).await;
        match &result {
            Ok(username) => tracing::debug!(method = "valid_token", username = %username, "called"),
            Err(e) => tracing::debug!(method = "valid_token", err = %e, "called"),
        }
        result
    }
}

/// Counts `users_registered_total`, `user_logins_total` and
/// `password_updates_total`, labelled by outcome.
pub struct InstrumentingUserService {
    next: Arc<dyn UserService>,
}

impl InstrumentingUserService {
    pub fn new(next: Arc<dyn UserService>) -> Self {
        Self { next }
    }
}

#[async_trait]
impl UserService for InstrumentingUserService {
    async fn register(
        &self,
        username: &str,
        password: &str,
        nickname: &str,
    ) -> Result<String, UserServiceError> {
        let result = self.next.register(username, password, nickname).await;
        counter!("users_registered_total", "outcome" => outcome(&result)).increment(1);
        result
    }

    async fn login(
        &self,
        username: &str,
        password: &str,
    ) -> Result<IssuedToken, UserServiceError> {
        let result = self.next.login(username, password).await;
        counter!("user_logins_total", "outcome" => outcome(&result)).increment(1);
        result
    }

    async fn update_password(
        &self,
        username: &str,
        password: &str,
        new_password: &str,
    ) -> Result<(), UserServiceError> {
        let result = self
            .next
            .update_password(username, password, new_password)
            .await;
        counter!("password_updates_total", "outcome" => outcome(&result)).increment(1);
        result
    }

    async fn valid_token(&self, token: &str) -> Result<String, UserServiceError> {
        self.next.valid_token(token).await
    }
}
