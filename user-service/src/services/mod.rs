pub mod jwt;
pub mod middleware;
pub mod password;
pub mod user;

use std::sync::Arc;

pub use jwt::{Claims, JwtService};
pub use middleware::{InstrumentingUserService, LoggingUserService};
pub use user::{DefaultUserService, IssuedToken, UserError, UserService, UserServiceError};

use crate::store::UserStore;

pub fn new_service(store: Arc<dyn UserStore>, jwt: JwtService) -> Arc<dyn UserService> {
    let svc: Arc<dyn UserService> = Arc::new(DefaultUserService::new(store, jwt));
    let svc: Arc<dyn UserService> = Arc::new(InstrumentingUserService::new(svc));
    Arc::new(LoggingUserService::new(svc))
}
