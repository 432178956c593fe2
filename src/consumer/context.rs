//! Context passed to message handlers.

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::catalog::Category;
use crate::error::HandlerError;
use crate::group::TaskCommand;
use crate::registry::HandlerRef;
use crate::resolver::{Delivery, ResolvedTarget, Route};

/// Everything a handler knows about the message it received.
///
/// The body is always the effective one: worker frames arrive unwrapped.
pub struct Context<'a> {
    target: &'a ResolvedTarget,
    handler: &'a HandlerRef,
    task: Option<&'a TaskCommand>,
}

impl<'a> Context<'a> {
    pub(crate) fn new(
        target: &'a ResolvedTarget,
        handler: &'a HandlerRef,
        task: Option<&'a TaskCommand>,
    ) -> Self {
        Self {
            target,
            handler,
            task,
        }
    }

    /// Deserialize the body into a typed struct.
    pub fn input<T: DeserializeOwned>(&self) -> Result<T, HandlerError> {
        serde_json::from_value(self.target.body.clone())
            .map_err(|e| HandlerError::DecodeFailed(e.to_string()))
    }

    pub fn raw_body(&self) -> &Value {
        &self.target.body
    }

    /// The effective routing key.
    pub fn routing_key(&self) -> &str {
        &self.target.routing_key
    }

    /// The handler this message was routed to.
    pub fn handler(&self) -> &HandlerRef {
        self.handler
    }

    pub fn route(&self) -> &Route {
        &self.target.route
    }

    pub fn delivery(&self) -> Delivery {
        self.target.delivery
    }

    /// Whether the message arrived through the worker envelope.
    pub fn is_async(&self) -> bool {
        self.target.delivery == Delivery::Worker
    }

    pub fn category(&self) -> Option<Category> {
        self.target.category
    }

    /// The validated task, for commands constrained by a task group.
    pub fn task(&self) -> Option<&TaskCommand> {
        self.task
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.target.body.get(field).is_some()
    }

    pub fn has_fields(&self, fields: &[&str]) -> bool {
        fields.iter().all(|f| self.has_field(f))
    }
}
