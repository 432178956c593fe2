//! Core transport traits.

use thiserror::Error;

use crate::frame::Frame;

/// A frame as handed out by a subscriber, tagged for ack/nack.
#[derive(Debug, Clone, PartialEq)]
pub struct Delivery {
    /// Transport-assigned delivery tag
    pub tag: String,
    pub frame: Frame,
}

impl Delivery {
    pub fn new(tag: impl Into<String>, frame: Frame) -> Self {
        Self {
            tag: tag.into(),
            frame,
        }
    }
}

/// Error type for transport operations.
#[derive(Debug, Error)]
pub enum PublishError {
    /// Connection to the broker failed
    #[error("connection failed: {0}")]
    ConnectionFailed(String),
    /// Encoding the frame failed
    #[error("serialization failed: {0}")]
    SerializationFailed(String),
    /// The broker rejected the frame
    #[error("frame rejected: {0}")]
    Rejected(String),
    /// Timeout waiting for acknowledgment
    #[error("publish timeout")]
    Timeout,
    #[error("publish error: {0}")]
    Other(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Sends frames to the broker.
///
/// Implementations might wrap AMQP, NATS or Kafka clients; the routing
/// core only needs this seam. [`InMemoryQueue`](super::InMemoryQueue) is
/// included for tests and single-process use.
pub trait Publisher: Send + Sync {
    /// Publish a single frame.
    fn publish(&self, frame: Frame) -> Result<(), PublishError>;

    /// Publish several frames.
    ///
    /// Default implementation publishes sequentially.
    fn publish_batch(&self, frames: Vec<Frame>) -> Result<(), PublishError> {
        for frame in frames {
            self.publish(frame)?;
        }
        Ok(())
    }
}
