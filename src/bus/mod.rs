//! Transport seam.
//!
//! The routing core never talks to a broker itself. Producers hand frames
//! to a [`Publisher`]; consumers pull [`Delivery`]s from a [`Subscriber`]
//! and ack or nack them once the consumer has routed and handled the frame.
//!
//! ```text
//!  Producer ──build──▶ Frame ──publish──▶ broker ──poll──▶ Consumer
//!                                            ▲                │
//!                                            └── ack / nack ──┘
//! ```

mod in_memory_queue;
mod producer;
mod publisher;
mod subscriber;

pub use in_memory_queue::InMemoryQueue;
pub use producer::{ProduceError, Producer};
pub use publisher::{Delivery, PublishError, Publisher};
pub use subscriber::{Subscribable, Subscriber};
