//! Wire frames and the worker envelope.
//!
//! ```text
//! build(Some("events"), "user.create", body)
//!     → { routingKey: "user.create", body, exchange: "events" }
//!
//! build(None, "do.mail.send", body)
//!     → { routingKey: "worker", body: { routingKey: "do.mail.send", body } }
//! ```

mod builder;
mod frame;

pub use builder::FrameBuilder;
pub use frame::{Frame, ENVELOPE_BODY, ENVELOPE_ROUTING_KEY};
