pub mod config;
pub mod handlers;
pub mod routes;
pub mod sd;
pub mod startup;

pub use startup::build_router;
