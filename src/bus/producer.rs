//! Publish-side convenience: frame and send in one call.

use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use super::{PublishError, Publisher};
use crate::error::RoutingError;
use crate::frame::{Frame, FrameBuilder};

#[derive(Debug, Error)]
pub enum ProduceError {
    #[error(transparent)]
    Routing(#[from] RoutingError),
    #[error(transparent)]
    Publish(#[from] PublishError),
}

/// Frames messages with a [`FrameBuilder`] and hands them to a [`Publisher`].
///
/// ```
/// use queue_routing::bus::{InMemoryQueue, Producer};
/// use queue_routing::FrameBuilder;
/// use serde_json::json;
///
/// let queue = InMemoryQueue::new();
/// let producer = Producer::new(FrameBuilder::default(), queue.clone());
///
/// producer.publish(Some("events"), "user.create", json!({ "id": 1 })).unwrap();
/// producer.queue("do.mail.send", json!({ "to": "a@b.com" })).unwrap();
///
/// assert_eq!(queue.routing_keys(), vec!["user.create", "worker"]);
/// ```
pub struct Producer<P: Publisher> {
    builder: FrameBuilder,
    publisher: P,
}

impl<P: Publisher> Producer<P> {
    pub fn new(builder: FrameBuilder, publisher: P) -> Self {
        Self { builder, publisher }
    }

    /// Frame and send. Returns the frame that went on the wire.
    pub fn publish(
        &self,
        exchange: Option<&str>,
        routing_key: &str,
        body: Value,
    ) -> Result<Frame, ProduceError> {
        let frame = self.builder.build(exchange, routing_key, body)?;
        self.send(frame)
    }

    /// Send through the worker queue for asynchronous processing.
    pub fn queue(&self, routing_key: &str, body: Value) -> Result<Frame, ProduceError> {
        self.publish(None, routing_key, body)
    }

    /// Send the deferred `post_<event>` notification.
    pub fn publish_post_event(
        &self,
        exchange: Option<&str>,
        event: &str,
        body: Value,
    ) -> Result<Frame, ProduceError> {
        let frame = self.builder.build_post_event(exchange, event, body)?;
        self.send(frame)
    }

    pub fn builder(&self) -> &FrameBuilder {
        &self.builder
    }

    pub fn publisher(&self) -> &P {
        &self.publisher
    }

    fn send(&self, frame: Frame) -> Result<Frame, ProduceError> {
        self.publisher.publish(frame.clone())?;
        debug!(routing_key = %frame.routing_key, "published frame");
        Ok(frame)
    }
}
