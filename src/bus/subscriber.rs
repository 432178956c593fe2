//! Core subscriber traits for the transport.

use super::publisher::{Delivery, PublishError};

/// Pull-based consumer side of the transport.
pub trait Subscriber: Send + Sync {
    /// Poll for the next delivery, blocking until one is available or timeout.
    fn poll(&self, timeout_ms: u64) -> Result<Option<Delivery>, PublishError>;

    /// Acknowledge that a delivery has been processed.
    fn ack(&self, tag: &str) -> Result<(), PublishError>;

    /// Reject a delivery. The broker dead-letters it; nothing here retries.
    fn nack(&self, tag: &str, reason: &str) -> Result<(), PublishError>;
}

/// Subscribers that can create independent subscriber instances.
pub trait Subscribable: Subscriber + Sized {
    /// Create a new subscriber sharing the same frame source but with its
    /// own read position.
    fn new_subscriber(&self) -> Self;
}
