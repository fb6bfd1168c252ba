use axum::{extract::State, response::Response};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use serde::Serialize;
use service_core::domain::domain_response;
use service_core::error::AppError;

use crate::endpoints::{
    LoginRequest, RegisterRequest, UpdatePasswordRequest, UserEndpoints, ValidTokenRequest,
};
use crate::services::UserError;
use crate::utils::ValidatedJson;

#[derive(Debug, Serialize)]
pub struct RegisterBody {
    pub id: String,
}

#[derive(Debug, Serialize)]
pub struct LoginBody {
    pub token: String,
    pub expires_in: i64,
}

#[derive(Debug, Serialize)]
pub struct UpdatedBody {
    pub updated: bool,
}

#[derive(Debug, Serialize)]
pub struct ValidBody {
    pub valid: bool,
    pub username: String,
}

pub async fn register(
    State(endpoints): State<UserEndpoints>,
    ValidatedJson(req): ValidatedJson<RegisterRequest>,
) -> Result<Response, AppError> {
    let resp = endpoints.register.call(req).await?;
    Ok(domain_response(
        resp.into_result().map(|id| RegisterBody { id }),
    ))
}

pub async fn login(
    State(endpoints): State<UserEndpoints>,
    ValidatedJson(req): ValidatedJson<LoginRequest>,
) -> Result<Response, AppError> {
    let resp = endpoints.login.call(req).await?;
    Ok(domain_response(resp.into_result().map(|issued| LoginBody {
        token: issued.token,
        expires_in: issued.expires_in,
    })))
}

pub async fn update_password(
    State(endpoints): State<UserEndpoints>,
    ValidatedJson(req): ValidatedJson<UpdatePasswordRequest>,
) -> Result<Response, AppError> {
    let resp = endpoints.update_password.call(req).await?;
    Ok(domain_response(
        resp.into_result().map(|()| UpdatedBody { updated: true }),
    ))
}

/// `Authorization: Bearer <token>`; a missing header counts as an invalid
/// token.
pub async fn valid_token(
    State(endpoints): State<UserEndpoints>,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
) -> Result<Response, AppError> {
    let Some(TypedHeader(Authorization(bearer))) = bearer else {
        return Ok(domain_response::<ValidBody, _>(Err(UserError::InvalidToken)));
    };

    let resp = endpoints
        .valid_token
        .call(ValidTokenRequest {
            token: bearer.token().to_string(),
        })
        .await?;
    Ok(domain_response(resp.into_result().map(|username| ValidBody {
        valid: true,
        username,
    })))
}
