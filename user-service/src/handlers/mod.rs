pub mod health;
pub mod user;

use axum::{
    routing::{get, post},
    Router,
};

use crate::endpoints::UserEndpoints;

pub fn router(endpoints: UserEndpoints) -> Router {
    Router::new()
        .route("/user/v1/register", post(user::register))
        .route("/user/v1/login", post(user::login))
        .route("/user/v1/password", post(user::update_password))
        .route("/user/v1/valid", get(user::valid_token))
        .with_state(endpoints)
}
