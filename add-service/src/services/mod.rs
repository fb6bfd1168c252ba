pub mod add;
pub mod middleware;

use std::sync::Arc;

pub use add::{AddError, AddService, BasicAddService};
pub use middleware::{InstrumentingAddService, LoggingAddService};

/// The production stack: rules, then metrics, then logging outermost.
pub fn new_service() -> Arc<dyn AddService> {
    let svc: Arc<dyn AddService> = Arc::new(BasicAddService);
    let svc: Arc<dyn AddService> = Arc::new(InstrumentingAddService::new(svc));
    Arc::new(LoggingAddService::new(svc))
}
