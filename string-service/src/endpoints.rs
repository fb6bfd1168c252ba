//! Typed endpoints for the string operations.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use service_core::config::EndpointConfig;
use service_core::endpoint::{BoxEndpoint, Chain, endpoint_fn};

use crate::services::{StringError, StringService};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UppercaseRequest {
    pub s: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UppercaseResponse {
    pub v: String,
    pub err: Option<StringError>,
}

impl UppercaseResponse {
    pub fn into_result(self) -> Result<String, StringError> {
        match self.err {
            Some(err) => Err(err),
            None => Ok(self.v),
        }
    }
}

impl From<Result<String, StringError>> for UppercaseResponse {
    fn from(result: Result<String, StringError>) -> Self {
        match result {
            Ok(v) => UppercaseResponse { v, err: None },
            Err(err) => UppercaseResponse {
                v: String::new(),
                err: Some(err),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountRequest {
    pub s: String,
}

/// `Count` cannot fail, so there is no `err`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CountResponse {
    pub v: i64,
}

#[derive(Clone)]
pub struct StringEndpoints {
    pub uppercase: BoxEndpoint<UppercaseRequest, UppercaseResponse>,
    pub count: BoxEndpoint<CountRequest, CountResponse>,
}

impl StringEndpoints {
    pub fn new(service: Arc<dyn StringService>, config: &EndpointConfig) -> Self {
        let uppercase = {
            let svc = service.clone();
            Chain::standard("uppercase", config).build(endpoint_fn(move |req: UppercaseRequest| {
                let svc = svc.clone();
                async move { Ok(UppercaseResponse::from(svc.uppercase(&req.s).await)) }
            }))
        };

        let count = {
            let svc = service;
            Chain::standard("count", config).build(endpoint_fn(move |req: CountRequest| {
                let svc = svc.clone();
                async move {
                    let n = svc.count(&req.s).await;
                    Ok(CountResponse {
                        v: i64::try_from(n).unwrap_or(i64::MAX),
                    })
                }
            }))
        };

        Self { uppercase, count }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::BasicStringService;

    #[tokio::test]
    async fn empty_uppercase_is_a_response_error() {
        let e = StringEndpoints::new(Arc::new(BasicStringService), &EndpointConfig::default());
        let resp = e
            .uppercase
            .call(UppercaseRequest { s: String::new() })
            .await
            .unwrap();
        assert_eq!(resp.into_result(), Err(StringError::Empty));

        let resp = e
            .count
            .call(CountRequest {
                s: "four".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(resp.v, 4);
    }
}
