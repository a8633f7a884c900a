mod consumer_logging;
mod consumer_types;

pub use consumer_logging::*;
pub use consumer_types::*;
