pub mod codec;
pub mod domain;
pub mod nats;
pub mod telemetry;

pub use codec::*;
pub use domain::*;
pub use nats::*;

// Re-export mocks when testing feature is enabled
#[cfg(any(test, feature = "testing"))]
pub use domain::MockMirrorStore;
#[cfg(any(test, feature = "testing"))]
pub use nats::MockJetStreamConsumer;
#[cfg(any(test, feature = "testing"))]
pub use nats::MockPullConsumer;
