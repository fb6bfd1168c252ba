use axum::{extract::State, response::Response, Json};
use service_core::domain::{domain_response, ValueBody};
use service_core::error::AppError;

use crate::endpoints::{AddEndpoints, ConcatRequest, SumRequest};

pub async fn sum(
    State(endpoints): State<AddEndpoints>,
    Json(req): Json<SumRequest>,
) -> Result<Response, AppError> {
    let resp = endpoints.sum.call(req).await?;
    Ok(domain_response(resp.into_result().map(|v| ValueBody { v })))
}

pub async fn concat(
    State(endpoints): State<AddEndpoints>,
    Json(req): Json<ConcatRequest>,
) -> Result<Response, AppError> {
    let resp = endpoints.concat.call(req).await?;
    Ok(domain_response(resp.into_result().map(|v| ValueBody { v })))
}
