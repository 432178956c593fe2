//! Consume-side routing.
//!
//! Resolution runs in a fixed order:
//!
//! 1. `worker` frames are unwrapped exactly once; a malformed or
//!    double-wrapped envelope is rejected.
//! 2. An EXACT binding on the (unwrapped) routing key wins.
//! 3. Otherwise a `do.<service>` key routes to `<service>`.
//! 4. Otherwise the frame is unroutable. The resolver never retries.

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, trace};

use crate::catalog::{Category, EventCatalog};
use crate::error::RoutingError;
use crate::frame::Frame;
use crate::registry::{ConsumerRegistry, HandlerRef};

/// How the message reached the consumer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Delivery {
    /// Published to an exchange; processed in the normal event stream.
    Direct,
    /// Unwrapped from the worker envelope; processed asynchronously.
    Worker,
}

/// Which rule picked the target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Route {
    Exact { handler: HandlerRef },
    /// `handler` is the PREFIX binding claiming `service`, if one exists.
    Prefix {
        service: String,
        handler: Option<HandlerRef>,
    },
}

impl Route {
    /// The handler that should receive the message.
    ///
    /// PREFIX targets without an explicit binding go to the handler named
    /// after the service.
    pub fn handler(&self) -> HandlerRef {
        match self {
            Route::Exact { handler } => handler.clone(),
            Route::Prefix {
                handler: Some(handler),
                ..
            } => handler.clone(),
            Route::Prefix { service, .. } => HandlerRef::new(service.as_str()),
        }
    }
}

/// The dispatch decision for one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedTarget {
    /// Effective routing key, after unwrapping.
    pub routing_key: String,
    /// Effective body, after unwrapping.
    pub body: Value,
    pub route: Route,
    pub delivery: Delivery,
    pub category: Option<Category>,
}

/// Resolves inbound frames against an immutable registry and catalog.
///
/// Holds no mutable state, so one resolver can be shared by any number of
/// consumer threads without locking.
#[derive(Debug, Clone, Default)]
pub struct RoutingResolver {
    registry: Arc<ConsumerRegistry>,
    catalog: Arc<EventCatalog>,
}

impl RoutingResolver {
    pub fn new(registry: Arc<ConsumerRegistry>, catalog: Arc<EventCatalog>) -> Self {
        Self { registry, catalog }
    }

    pub fn registry(&self) -> &ConsumerRegistry {
        &self.registry
    }

    pub fn catalog(&self) -> &EventCatalog {
        &self.catalog
    }

    /// Resolve a frame to its dispatch target.
    pub fn resolve(&self, frame: &Frame) -> Result<ResolvedTarget, RoutingError> {
        let (routing_key, body, delivery) = self.unwrap_frame(frame)?;

        let route = self.route(&routing_key)?;
        let category = self.catalog.classify(&routing_key);
        debug!(
            routing_key = %routing_key,
            handler = %route.handler(),
            ?delivery,
            "resolved frame"
        );

        Ok(ResolvedTarget {
            routing_key,
            body,
            route,
            delivery,
            category,
        })
    }

    /// The effective `(routing_key, body)` of a frame, unwrapping a worker
    /// envelope exactly once. No route lookup happens here.
    pub fn unwrap_frame(&self, frame: &Frame) -> Result<(String, Value, Delivery), RoutingError> {
        if frame.is_worker() {
            let (key, body) = frame.unwrap_worker()?;
            trace!(embedded = %key, "unwrapped worker frame");
            Ok((key, body, Delivery::Worker))
        } else {
            Ok((frame.routing_key.clone(), frame.body.clone(), Delivery::Direct))
        }
    }

    /// Pick the route for an already unwrapped routing key.
    pub fn route(&self, routing_key: &str) -> Result<Route, RoutingError> {
        if let Some(handler) = self.registry.find_exact(routing_key) {
            return Ok(Route::Exact {
                handler: handler.clone(),
            });
        }
        if let Some((service, handler)) = self.registry.find_by_prefix(routing_key) {
            return Ok(Route::Prefix {
                service: service.to_string(),
                handler: handler.cloned(),
            });
        }
        Err(RoutingError::Unroutable(routing_key.to_string()))
    }
}
