pub mod add;
pub mod health;

use axum::{routing::post, Router};

use crate::endpoints::AddEndpoints;

/// Business routes only; the process adds health and metrics around them.
/// The gateway mounts this same router over its remote endpoints.
pub fn router(endpoints: AddEndpoints) -> Router {
    Router::new()
        .route("/sum", post(add::sum))
        .route("/concat", post(add::concat))
        .with_state(endpoints)
}
