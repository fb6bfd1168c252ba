//! Service discovery on the client side: watch a service's instances in the
//! registry, keep one endpoint per instance, pick one per call and retry
//! across them.

mod balancer;
mod endpointer;
mod instancer;
mod retry;

pub use balancer::{Balancer, RoundRobin};
pub use endpointer::{Endpointer, Factory};
pub use instancer::Instancer;
pub use retry::{retry, Retry};
