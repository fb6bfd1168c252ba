//! Typed endpoints for the user operations.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use service_core::config::EndpointConfig;
use service_core::endpoint::{endpoint_fn, BoxEndpoint, Chain};
use service_core::error::AppError;
use validator::Validate;

use crate::services::{IssuedToken, UserError, UserService, UserServiceError};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 1, max = 64))]
    pub username: String,
    #[validate(length(min = 1, max = 128))]
    pub password: String,
    #[validate(length(max = 64))]
    #[serde(default)]
    pub nickname: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RegisterResponse {
    pub id: String,
    pub err: Option<UserError>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1))]
    pub username: String,
    #[validate(length(min = 1))]
    pub password: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoginResponse {
    pub token: String,
    pub expires_in: i64,
    pub err: Option<UserError>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct UpdatePasswordRequest {
    #[validate(length(min = 1))]
    pub username: String,
    #[validate(length(min = 1))]
    pub password: String,
    #[validate(length(min = 1, max = 128))]
    pub new_password: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UpdatePasswordResponse {
    pub err: Option<UserError>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidTokenRequest {
    pub token: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValidTokenResponse {
    pub valid: bool,
    pub username: String,
    pub err: Option<UserError>,
}

impl RegisterResponse {
    pub fn into_result(self) -> Result<String, UserError> {
        match self.err {
            Some(err) => Err(err),
            None => Ok(self.id),
        }
    }
}

impl From<Result<String, UserError>> for RegisterResponse {
    fn from(result: Result<String, UserError>) -> Self {
        match result {
            Ok(id) => RegisterResponse { id, err: None },
            Err(err) => RegisterResponse {
                id: String::new(),
                err: Some(err),
            },
        }
    }
}

impl LoginResponse {
    pub fn into_result(self) -> Result<IssuedToken, UserError> {
        match self.err {
            Some(err) => Err(err),
            None => Ok(IssuedToken {
                token: self.token,
                expires_in: self.expires_in,
            }),
        }
    }
}

impl From<Result<IssuedToken, UserError>> for LoginResponse {
    fn from(result: Result<IssuedToken, UserError>) -> Self {
        match result {
            Ok(issued) => LoginResponse {
                token: issued.token,
                expires_in: issued.expires_in,
                err: None,
            },
            Err(err) => LoginResponse {
                token: String::new(),
                expires_in: 0,
                err: Some(err),
            },
        }
    }
}

impl UpdatePasswordResponse {
    pub fn into_result(self) -> Result<(), UserError> {
        self.err.map_or(Ok(()), Err)
    }
}

impl From<Result<(), UserError>> for UpdatePasswordResponse {
    fn from(result: Result<(), UserError>) -> Self {
        UpdatePasswordResponse { err: result.err() }
    }
}

impl ValidTokenResponse {
    pub fn into_result(self) -> Result<String, UserError> {
        match self.err {
            Some(err) => Err(err),
            None if self.valid => Ok(self.username),
            None => Err(UserError::InvalidToken),
        }
    }
}

impl From<Result<String, UserError>> for ValidTokenResponse {
    fn from(result: Result<String, UserError>) -> Self {
        match result {
            Ok(username) => ValidTokenResponse {
                valid: true,
                username,
                err: None,
            },
            Err(err) => ValidTokenResponse {
                valid: false,
                username: String::new(),
                err: Some(err),
            },
        }
    }
}

/// Rule violations stay in the response; store failures become the
/// endpoint's error.
fn split<T>(result: Result<T, UserServiceError>) -> Result<Result<T, UserError>, AppError> {
    match result {
        Ok(v) => Ok(Ok(v)),
        Err(UserServiceError::Domain(e)) => Ok(Err(e)),
        Err(UserServiceError::Infra(e)) => Err(e),
    }
}

#[derive(Clone)]
pub struct UserEndpoints {
    pub register: BoxEndpoint<RegisterRequest, RegisterResponse>,
    pub login: BoxEndpoint<LoginRequest, LoginResponse>,
    pub update_password: BoxEndpoint<UpdatePasswordRequest, UpdatePasswordResponse>,
    pub valid_token: BoxEndpoint<ValidTokenRequest, ValidTokenResponse>,
}

impl UserEndpoints {
    pub fn new(service: Arc<dyn UserService>, config: &EndpointConfig) -> Self {
        let register = {
            let svc = service.clone();
            Chain::standard("register", config).build(endpoint_fn(move |req: RegisterRequest| {
                let svc = svc.clone();
                async move {
                    let result = svc
                        .register(&req.username, &req.password, &req.nickname)
                        .await;
                    split(result).map(RegisterResponse::from)
                }
            }))
        };

        let login = {
            let svc = service.clone();
            Chain::standard("login", config).build(endpoint_fn(move |req: LoginRequest| {
                let svc = svc.clone();
                async move {
                    let result = svc.login(&req.username, &req.password).await;
                    split(result).map(LoginResponse::from)
                }
            }))
        };

        let update_password = {
            let svc = service.clone();
            Chain::standard("update_password", config).build(endpoint_fn(
                move |req: UpdatePasswordRequest| {
                    let svc = svc.clone();
                    async move {
                        let result = svc
                            .update_password(&req.username, &req.password, &req.new_password)
                            .await;
                        split(result).map(UpdatePasswordResponse::from)
                    }
                },
            ))
        };

        let valid_token = {
            let svc = service;
            Chain::standard("valid_token", config).build(endpoint_fn(
                move |req: ValidTokenRequest| {
                    let svc = svc.clone();
                    async move {
                        let result = svc.valid_token(&req.token).await;
                        split(result).map(ValidTokenResponse::from)
                    }
                },
            ))
        };

        Self {
            register,
            login,
            update_password,
            valid_token,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::{DefaultUserService, JwtService};
    use crate::store::InMemoryUserStore;
    use secrecy::Secret;

    fn endpoints() -> UserEndpoints {
        let service = DefaultUserService::new(
            Arc::new(InMemoryUserStore::new()),
            JwtService::new(&Secret::new("secret".to_string()), 60),
        );
        UserEndpoints::new(Arc::new(service), &EndpointConfig::default())
    }

    #[tokio::test]
    async fn login_then_validate_through_endpoints() {
        let e = endpoints();
        e.register
            .call(RegisterRequest {
                username: "amy".into(),
                password: "pw".into(),
                nickname: "Amy".into(),
            })
            .await
            .unwrap()
            .into_result()
            .unwrap();

        let login = e
            .login
            .call(LoginRequest {
                username: "amy".into(),
                password: "pw".into(),
            })
            .await
            .unwrap()
            .into_result()
            .unwrap();
        assert_eq!(login.expires_in, 60);

        let valid = e
            .valid_token
            .call(ValidTokenRequest { token: login.token })
            .await
            .unwrap();
        assert!(valid.valid);
        assert_eq!(valid.into_result(), Ok("amy".to_string()));
    }

    #[tokio::test]
    async fn invalid_token_is_a_response_error() {
        let resp = endpoints()
            .valid_token
            .call(ValidTokenRequest {
                token: "garbage".into(),
            })
            .await
            .unwrap();
        assert!(!resp.valid);
        assert_eq!(resp.err, Some(UserError::InvalidToken));
    }

    #[test]
    fn validation_rejects_empty_username() {
        let req = RegisterRequest {
            username: String::new(),
            password: "pw".into(),
            nickname: String::new(),
        };
        assert!(req.validate().is_err());
    }
}
