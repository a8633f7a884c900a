mod device_write_consumer;
mod device_write_service;

pub use device_write_consumer::*;
pub use device_write_service::*;
