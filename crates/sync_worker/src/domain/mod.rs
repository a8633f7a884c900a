mod mirror_service;
mod status;

pub use mirror_service::*;
pub use status::*;
