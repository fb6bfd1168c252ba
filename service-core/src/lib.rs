//! service-core: Shared infrastructure for the svckit services and gateway.
pub mod config;
pub mod domain;
pub mod endpoint;
pub mod error;
pub mod grpc;
pub mod infra;
pub mod middleware;
pub mod observability;
pub mod registry;
pub mod shutdown;

pub use async_trait;
pub use axum;
pub use mongodb;
pub use prost;
pub use serde;
pub use serde_json;
pub use tokio;
pub use tonic;
pub use tower;
pub use tower_http;
pub use tracing;
pub use validator;
