use axum::{extract::State, response::Response, Json};
use service_core::domain::{domain_response, ValueBody};
use service_core::error::AppError;

use crate::endpoints::{CountRequest, StringEndpoints, UppercaseRequest};

pub async fn uppercase(
    State(endpoints): State<StringEndpoints>,
    Json(req): Json<UppercaseRequest>,
) -> Result<Response, AppError> {
    let resp = endpoints.uppercase.call(req).await?;
    Ok(domain_response(resp.into_result().map(|v| ValueBody { v })))
}

pub async fn count(
    State(endpoints): State<StringEndpoints>,
    Json(req): Json<CountRequest>,
) -> Result<Json<ValueBody<i64>>, AppError> {
    let resp = endpoints.count.call(req).await?;
    Ok(Json(ValueBody { v: resp.v }))
}
