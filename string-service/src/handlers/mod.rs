pub mod health;
pub mod string;

use axum::{routing::post, Router};

use crate::endpoints::StringEndpoints;

pub fn router(endpoints: StringEndpoints) -> Router {
    Router::new()
        .route("/uppercase", post(string::uppercase))
        .route("/count", post(string::count))
        .with_state(endpoints)
}
