//! Conversions between `AppError` and `tonic::Status`.
//!
//! | AppError | gRPC Status |
//! |----------|-------------|
//! | `ValidationError`, `BadRequest` | `INVALID_ARGUMENT` |
//! | `NotFound` | `NOT_FOUND` |
//! | `Unauthorized`, `InvalidToken` | `UNAUTHENTICATED` |
//! | `Conflict` | `ALREADY_EXISTS` |
//! | `TooManyRequests` | `RESOURCE_EXHAUSTED` |
//! | `BadGateway`, `ServiceUnavailable` | `UNAVAILABLE` |
//! | everything else | `INTERNAL` |
//!
//! Domain errors never travel as a `Status`; they are carried in the reply's
//! `err` field.

use tonic::{Code, Status};

use crate::error::AppError;

pub trait IntoStatus {
    fn into_status(self) -> Status;
}

impl IntoStatus for AppError {
    fn into_status(self) -> Status {
        match self {
            AppError::ValidationError(err) => {
                Status::invalid_argument(format!("Validation error: {}", err))
            }
            AppError::BadRequest(err) => Status::invalid_argument(err.to_string()),
            AppError::NotFound(err) => Status::not_found(err.to_string()),
            AppError::Unauthorized(err) => Status::unauthenticated(err.to_string()),
            AppError::Conflict(err) => Status::already_exists(err.to_string()),
            AppError::TooManyRequests(msg, retry_after) => {
                let mut status = Status::resource_exhausted(msg);
                if let Some(seconds) = retry_after
                    && let Ok(value) = seconds.to_string().parse()
                {
                    status.metadata_mut().insert("retry-after", value);
                }
                status
            }
            AppError::InternalError(err) => {
                tracing::error!(error = %err, "Internal error");
                Status::internal("Internal server error")
            }
            AppError::BadGateway(msg) => Status::unavailable(format!("Bad gateway: {}", msg)),
            AppError::ServiceUnavailable(msg) => Status::unavailable(msg),
            AppError::DatabaseError(err) => {
                tracing::error!(error = %err, "Database error");
                Status::internal("Database error")
            }
            AppError::RedisError(err) => {
                tracing::error!(error = %err, "Redis error");
                Status::internal("Cache error")
            }
            AppError::InvalidToken(err) => {
                Status::unauthenticated(format!("Invalid token: {}", err))
            }
            AppError::ConfigError(err) => {
                tracing::error!(error = %err, "Configuration error");
                Status::internal("Configuration error")
            }
        }
    }
}

impl From<AppError> for Status {
    fn from(err: AppError) -> Self {
        err.into_status()
    }
}

/// Status received by a client, mapped back for propagation.
impl From<Status> for AppError {
    fn from(status: Status) -> Self {
        match status.code() {
            Code::InvalidArgument | Code::FailedPrecondition | Code::OutOfRange => {
                AppError::BadRequest(anyhow::anyhow!("{}", status.message()))
            }
            Code::NotFound => AppError::NotFound(anyhow::anyhow!("{}", status.message())),
            Code::Unauthenticated | Code::PermissionDenied => {
                AppError::Unauthorized(anyhow::anyhow!("{}", status.message()))
            }
            Code::AlreadyExists => AppError::Conflict(anyhow::anyhow!("{}", status.message())),
            Code::ResourceExhausted => {
                let retry_after = status
                    .metadata()
                    .get("retry-after")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|s| s.parse().ok());
                AppError::TooManyRequests(status.message().to_string(), retry_after)
            }
            Code::Unavailable => AppError::ServiceUnavailable(status.message().to_string()),
            Code::DeadlineExceeded | Code::Cancelled | Code::Aborted => {
                AppError::BadGateway(format!("request failed: {}", status.message()))
            }
            Code::Unimplemented => {
                AppError::InternalError(anyhow::anyhow!("Not implemented: {}", status.message()))
            }
            Code::Internal | Code::Unknown | Code::DataLoss => {
                AppError::InternalError(anyhow::anyhow!("{}", status.message()))
            }
            Code::Ok => AppError::InternalError(anyhow::anyhow!("Unexpected OK status as error")),
        }
    }
}
