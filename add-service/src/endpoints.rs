//! Typed endpoints for the add operations, decorated with the standard
//! middleware chain. Both transports and the gateway call through these.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use service_core::config::EndpointConfig;
use service_core::endpoint::{BoxEndpoint, Chain, endpoint_fn};

use crate::services::{AddError, AddService};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SumRequest {
    pub a: i64,
    pub b: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SumResponse {
    pub v: i64,
    pub err: Option<AddError>,
}

impl SumResponse {
    pub fn into_result(self) -> Result<i64, AddError> {
        match self.err {
            Some(err) => Err(err),
            None => Ok(self.v),
        }
    }
}

impl From<Result<i64, AddError>> for SumResponse {
    fn from(result: Result<i64, AddError>) -> Self {
        match result {
            Ok(v) => SumResponse { v, err: None },
            Err(err) => SumResponse { v: 0, err: Some(err) },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConcatRequest {
    pub a: String,
    pub b: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConcatResponse {
    pub v: String,
    pub err: Option<AddError>,
}

impl ConcatResponse {
    pub fn into_result(self) -> Result<String, AddError> {
        match self.err {
            Some(err) => Err(err),
            None => Ok(self.v),
        }
    }
}

impl From<Result<String, AddError>> for ConcatResponse {
    fn from(result: Result<String, AddError>) -> Self {
        match result {
            Ok(v) => ConcatResponse { v, err: None },
            Err(err) => ConcatResponse {
                v: String::new(),
                err: Some(err),
            },
        }
    }
}

#[derive(Clone)]
pub struct AddEndpoints {
    pub sum: BoxEndpoint<SumRequest, SumResponse>,
    pub concat: BoxEndpoint<ConcatRequest, ConcatResponse>,
}

impl AddEndpoints {
    /// Server-side endpoints: rate limit, circuit breaker, logging and
    /// instrumenting, outermost first.
    pub fn new(service: Arc<dyn AddService>, config: &EndpointConfig) -> Self {
        let sum = {
            let svc = service.clone();
            Chain::standard("sum", config).build(endpoint_fn(move |req: SumRequest| {
                let svc = svc.clone();
                async move { Ok(SumResponse::from(svc.sum(req.a, req.b).await)) }
            }))
        };

        let concat = {
            let svc = service;
            Chain::standard("concat", config).build(endpoint_fn(move |req: ConcatRequest| {
                let svc = svc.clone();
                async move { Ok(ConcatResponse::from(svc.concat(&req.a, &req.b).await)) }
            }))
        };

        Self { sum, concat }
    }
}
