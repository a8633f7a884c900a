mod client;
mod kv_store;
mod middleware;
mod tower_consumer;
mod traits;

pub use client::*;
pub use kv_store::*;
pub use middleware::*;
pub use tower_consumer::*;
pub use traits::*;
