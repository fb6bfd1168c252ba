//! Domain errors as values.
//!
//! Business failures (two zeroes, username taken, ...) are part of an
//! operation's response rather than its `Err`. Over gRPC they travel as the
//! message string in the reply's `err` field: [`err2str`] encodes, [`str2err`]
//! decodes back to the known variant, or to the type's `Remote` variant when
//! the message is unknown. Over HTTP, [`domain_response`] renders business
//! violations as 400 and anything else as 500, with `{"error": "<message>"}`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

pub trait DomainError: std::error::Error + Sized + Send + Sync + 'static {
    /// The known variant whose message is `msg`.
    fn from_message(msg: &str) -> Option<Self>;

    /// Wrap a message that matched no known variant.
    fn remote(msg: String) -> Self;

    /// Whether this is a rule violation by the caller (HTTP 400).
    fn is_business(&self) -> bool;

    fn status_code(&self) -> StatusCode {
        if self.is_business() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

/// Empty string for success.
pub fn err2str<E: DomainError>(err: Option<&E>) -> String {
    err.map(|e| e.to_string()).unwrap_or_default()
}

pub fn str2err<E: DomainError>(msg: &str) -> Option<E> {
    if msg.is_empty() {
        return None;
    }
    Some(E::from_message(msg).unwrap_or_else(|| E::remote(msg.to_string())))
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

/// `200` with `value` as JSON, or the error's status with `{"error": msg}`.
pub fn domain_response<T: Serialize, E: DomainError>(result: Result<T, E>) -> Response {
    match result {
        Ok(value) => (StatusCode::OK, Json(value)).into_response(),
        Err(err) => {
            let status = err.status_code();
            if status.is_server_error() {
                tracing::error!(error = %err, "Request failed");
            }
            (
                status,
                Json(ErrorBody {
                    error: err.to_string(),
                }),
            )
                .into_response()
        }
    }
}

/// `{"v": ...}`, the success body of the single-value operations.
#[derive(Debug, Serialize)]
pub struct ValueBody<T> {
    pub v: T,
}

#[cfg(test)]
mod tests {
    use super::*;
    use thiserror::Error;

    #[derive(Debug, Error, PartialEq)]
    enum TestError {
        #[error("bad input")]
        BadInput,
        #[error("{0}")]
        Remote(String),
    }

    impl DomainError for TestError {
        fn from_message(msg: &str) -> Option<Self> {
            (msg == "bad input").then_some(TestError::BadInput)
        }

        fn remote(msg: String) -> Self {
            TestError::Remote(msg)
        }

        fn is_business(&self) -> bool {
            matches!(self, TestError::BadInput)
        }
    }

    #[test]
    fn wire_encoding_is_symmetric() {
        let encoded = err2str(Some(&TestError::BadInput));
        assert_eq!(encoded, "bad input");
        assert_eq!(str2err::<TestError>(&encoded), Some(TestError::BadInput));
    }

    #[test]
    fn empty_string_means_success() {
        assert_eq!(err2str::<TestError>(None), "");
        assert_eq!(str2err::<TestError>(""), None);
    }

    #[test]
    fn unknown_message_becomes_remote() {
        assert_eq!(
            str2err::<TestError>("disk on fire"),
            Some(TestError::Remote("disk on fire".to_string()))
        );
    }

    #[test]
    fn business_errors_map_to_400() {
        let res = domain_response::<ValueBody<i64>, _>(Err(TestError::BadInput));
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);

        let res = domain_response::<ValueBody<i64>, _>(Err(TestError::Remote("x".into())));
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let res = domain_response::<_, TestError>(Ok(ValueBody { v: 1 }));
        assert_eq!(res.status(), StatusCode::OK);
    }
}
