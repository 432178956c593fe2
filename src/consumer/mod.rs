//! Consumer side: resolve inbound frames, invoke handlers, fan out to groups.

mod consumer;
mod context;
mod transport;

pub use consumer::{ConsumeError, ConsumeOutcome, Consumer};
pub use context::Context;
pub use transport::{subscribe, TransportHandle, TransportStats};
