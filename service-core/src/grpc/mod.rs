//! gRPC plumbing shared by the services and the gateway: status mapping,
//! health reporting, interceptors, server setup and typed clients for each
//! svckit service.

pub mod add_client;
pub mod error;
pub mod health;
pub mod interceptors;
pub mod server;
pub mod string_client;
pub mod user_client;

pub mod proto {
    pub mod add {
        tonic::include_proto!("svckit.add.v1");
    }
    pub mod string {
        tonic::include_proto!("svckit.string.v1");
    }
    pub mod user {
        tonic::include_proto!("svckit.user.v1");
    }
}

pub use add_client::{AddClient, AddClientConfig};
pub use error::IntoStatus;
pub use health::{
    HealthComponents, HealthReporter, HealthStatus, create_health_service, spawn_infra_watch,
};
pub use interceptors::{
    REQUEST_ID_KEY, extract_request_id, extract_traceparent, inject_request_id,
    inject_trace_context, metrics_interceptor, propagate_context, server_interceptor,
    trace_context_interceptor,
};
pub use server::{GrpcServerBuilder, create_reflection_service};
pub use string_client::{StringClient, StringClientConfig};
pub use user_client::{UserClient, UserClientConfig};

pub use tonic::{Code, Request, Response, Status};
