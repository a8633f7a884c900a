pub mod domain;
pub mod nats;
pub mod sync_worker;

pub use domain::*;
pub use nats::*;
pub use sync_worker::*;
