//! Publish-side framing.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};

use super::frame::Frame;
use crate::catalog::{ContractPolicy, EventCatalog};
use crate::error::RoutingError;
use crate::names::post_event;

/// Turns a publish request into the frame that goes on the transport.
///
/// - With a non-empty exchange, the frame is published unchanged
///   (the synchronous `#consumer` path).
/// - Without one, it is wrapped in the worker envelope (the asynchronous
///   `#work` path) and a generic worker redispatches it by its embedded key.
#[derive(Debug, Clone, Default)]
pub struct FrameBuilder {
    catalog: Arc<EventCatalog>,
    policy: ContractPolicy,
}

impl FrameBuilder {
    pub fn new(catalog: Arc<EventCatalog>, policy: ContractPolicy) -> Self {
        Self { catalog, policy }
    }

    pub fn catalog(&self) -> &EventCatalog {
        &self.catalog
    }

    pub fn policy(&self) -> ContractPolicy {
        self.policy
    }

    /// Build the wire frame for `routing_key`.
    ///
    /// The contract of `routing_key` is checked before any wrapping. Under
    /// [`ContractPolicy::Enforce`] issues reject the publish; under
    /// [`ContractPolicy::Advisory`] they are logged and the frame is built.
    pub fn build(
        &self,
        exchange: Option<&str>,
        routing_key: &str,
        body: Value,
    ) -> Result<Frame, RoutingError> {
        self.check_contract(routing_key, &body)?;

        let frame = match exchange.filter(|e| !e.is_empty()) {
            Some(exchange) => Frame::direct(exchange, routing_key, body),
            None => Frame::worker(routing_key, body),
        };
        debug!(
            routing_key,
            wire_key = %frame.routing_key,
            exchange = ?frame.exchange,
            "built frame"
        );
        Ok(frame)
    }

    /// Build the deferred `post_<event>` frame emitted after the primary
    /// handler of `event` completes. Shares the base event's contract.
    pub fn build_post_event(
        &self,
        exchange: Option<&str>,
        event: &str,
        body: Value,
    ) -> Result<Frame, RoutingError> {
        self.check_contract(event, &body)?;
        let name = post_event(event);
        let frame = match exchange.filter(|e| !e.is_empty()) {
            Some(exchange) => Frame::direct(exchange, name, body),
            None => Frame::worker(name, body),
        };
        Ok(frame)
    }

    fn check_contract(&self, routing_key: &str, body: &Value) -> Result<(), RoutingError> {
        if self.policy == ContractPolicy::Off {
            return Ok(());
        }
        let issues = self.catalog.check(routing_key, body);
        if issues.is_empty() {
            return Ok(());
        }
        match self.policy {
            ContractPolicy::Enforce => Err(RoutingError::ContractViolation {
                event: routing_key.to_string(),
                issues,
            }),
            _ => {
                warn!(routing_key, ?issues, "payload does not match its contract");
                Ok(())
            }
        }
    }
}
