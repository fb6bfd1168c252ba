pub mod config;
pub mod endpoints;
pub mod grpc;
pub mod handlers;
pub mod models;
pub mod services;
pub mod startup;
pub mod store;
pub mod utils;

pub use startup::build_router;
