pub mod middleware;
pub mod string;

use std::sync::Arc;

pub use middleware::{InstrumentingStringService, LoggingStringService};
pub use string::{BasicStringService, StringError, StringService};

pub fn new_service() -> Arc<dyn StringService> {
    let svc: Arc<dyn StringService> = Arc::new(BasicStringService);
    let svc: Arc<dyn StringService> = Arc::new(InstrumentingStringService::new(svc));
    Arc::new(LoggingStringService::new(svc))
}
