pub mod config;
pub mod endpoints;
pub mod grpc;
pub mod handlers;
pub mod services;
pub mod startup;

pub use startup::build_router;
