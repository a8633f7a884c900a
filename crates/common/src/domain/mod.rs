mod device;
mod mirror;
mod result;

pub use device::*;
pub use mirror::*;
pub use result::*;
