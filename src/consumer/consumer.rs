//! Resolves frames and invokes the owning handler.

use std::collections::HashMap;

use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use super::context::Context;
use crate::config::Routing;
use crate::error::{contain_panic, HandlerError, RoutingError};
use crate::frame::Frame;
use crate::group::{DispatchReport, GroupDispatcher};
use crate::registry::HandlerRef;
use crate::resolver::{ResolvedTarget, RoutingResolver};

type HandlerFn = dyn Fn(&Context<'_>) -> Result<Value, HandlerError> + Send + Sync;

/// Why a frame could not be consumed.
///
/// Event-group fan-out still runs when the unwrapped routing key belongs to
/// a group, so both variants carry the reports it produced.
#[derive(Debug, Error)]
pub enum ConsumeError {
    #[error("{source}")]
    Routing {
        #[source]
        source: RoutingError,
        fan_out: Vec<DispatchReport>,
    },
    #[error("handler `{handler}` failed: {source}")]
    Handler {
        handler: HandlerRef,
        #[source]
        source: HandlerError,
        fan_out: Vec<DispatchReport>,
    },
}

impl From<RoutingError> for ConsumeError {
    fn from(source: RoutingError) -> Self {
        ConsumeError::Routing {
            source,
            fan_out: Vec::new(),
        }
    }
}

impl ConsumeError {
    pub fn status_code(&self) -> u16 {
        match self {
            ConsumeError::Routing { source, .. } => source.status_code(),
            ConsumeError::Handler { source, .. } => source.status_code(),
        }
    }

    /// Whether the transport should dead-letter the message.
    pub fn should_dead_letter(&self) -> bool {
        match self {
            ConsumeError::Routing { source, .. } => source.should_dead_letter(),
            ConsumeError::Handler { source, .. } => {
                matches!(source, HandlerError::UnknownHandler(_))
            }
        }
    }

    /// Group fan-out that ran before the failure was reported.
    pub fn fan_out(&self) -> &[DispatchReport] {
        match self {
            ConsumeError::Routing { fan_out, .. } | ConsumeError::Handler { fan_out, .. } => {
                fan_out
            }
        }
    }
}

/// Result of consuming one frame.
#[derive(Debug)]
pub struct ConsumeOutcome {
    pub target: ResolvedTarget,
    pub handler: HandlerRef,
    /// What the handler returned.
    pub response: Value,
    /// One report per group fan-out triggered by the message.
    pub fan_out: Vec<DispatchReport>,
}

impl ConsumeOutcome {
    /// Every group handler that failed during fan-out.
    pub fn failed_group_handlers(&self) -> Vec<&HandlerRef> {
        self.fan_out.iter().flat_map(DispatchReport::failed).collect()
    }
}

/// Routes inbound frames to registered handlers.
///
/// Generic consumers register one handler per service name; PREFIX routes
/// without an explicit binding go to the handler named after the service.
///
/// ## Example
///
/// ```
/// use std::sync::Arc;
/// use queue_routing::consumer::Consumer;
/// use queue_routing::{ConsumerBinding, ConsumerRegistry, EventCatalog, Frame, RoutingResolver};
/// use queue_routing::group::GroupDispatcher;
/// use serde_json::json;
///
/// let registry = ConsumerRegistry::from_bindings([
///     ConsumerBinding::exact("user.create", "user-service"),
/// ])
/// .unwrap();
/// let resolver = RoutingResolver::new(Arc::new(registry), Arc::new(EventCatalog::empty()));
///
/// let consumer = Consumer::new(resolver, GroupDispatcher::new())
///     .handler("user-service", |ctx| Ok(json!({ "seen": ctx.routing_key() })))
///     .handler("mail.send", |_ctx| Ok(json!({ "sent": true })));
///
/// let outcome = consumer
///     .consume(&Frame::worker("do.mail.send", json!({ "to": "a@b.com" })))
///     .unwrap();
/// assert_eq!(outcome.response, json!({ "sent": true }));
/// ```
pub struct Consumer {
    resolver: RoutingResolver,
    groups: GroupDispatcher,
    handlers: HashMap<HandlerRef, Box<HandlerFn>>,
}

impl Consumer {
    pub fn new(resolver: RoutingResolver, groups: GroupDispatcher) -> Self {
        Self {
            resolver,
            groups,
            handlers: HashMap::new(),
        }
    }

    /// Consumer over components built from a [`RoutingConfig`](crate::RoutingConfig).
    pub fn from_routing(routing: Routing) -> Self {
        Self::new(routing.resolver, routing.groups)
    }

    /// Register a handler.
    ///
    /// Returns `self` for chaining.
    pub fn handler<F>(mut self, name: impl Into<HandlerRef>, handler: F) -> Self
    where
        F: Fn(&Context<'_>) -> Result<Value, HandlerError> + Send + Sync + 'static,
    {
        self.handlers.insert(name.into(), Box::new(handler));
        self
    }

    /// Resolve a frame without invoking anything.
    pub fn on_frame_received(&self, frame: &Frame) -> Result<ResolvedTarget, RoutingError> {
        self.resolver.resolve(frame)
    }

    /// Resolve, validate, handle and fan out one frame.
    ///
    /// 1. Resolve the frame (unwrapping worker envelopes).
    /// 2. If the routing key is a task command, reject unknown tasks
    ///    before any handler runs.
    /// 3. Invoke the target handler.
    /// 4. Fan out to every event group containing the routing key, and to
    ///    the task group for task commands.
    ///
    /// Event-group fan-out in step 4 also runs when steps 1 to 3 fail after
    /// the envelope was unwrapped. The task group only runs on success.
    pub fn consume(&self, frame: &Frame) -> Result<ConsumeOutcome, ConsumeError> {
        let target = match self.resolver.resolve(frame) {
            Ok(target) => target,
            Err(source) => {
                let fan_out = match self.resolver.unwrap_frame(frame) {
                    Ok((routing_key, body, _)) => self.fan_out_events(&routing_key, &body),
                    Err(_) => Vec::new(),
                };
                return Err(ConsumeError::Routing { source, fan_out });
            }
        };

        let task = match self.groups.validate_task(&target.routing_key, &target.body) {
            Ok(task) => task.map(|(group, task)| (group.name().to_string(), task)),
            Err(source) => {
                return Err(ConsumeError::Routing {
                    source,
                    fan_out: self.fan_out_events(&target.routing_key, &target.body),
                });
            }
        };

        let handler = target.route.handler();
        let result = match self.handlers.get(&handler) {
            Some(call) => {
                let ctx = Context::new(&target, &handler, task.as_ref().map(|(_, task)| task));
                contain_panic(|| call(&ctx))
            }
            None => Err(HandlerError::UnknownHandler(handler.to_string())),
        };

        let mut fan_out = self.fan_out_events(&target.routing_key, &target.body);

        let response = match result {
            Ok(response) => response,
            Err(source) => {
                warn!(
                    routing_key = %target.routing_key,
                    handler = %handler,
                    error = %source,
                    fan_out = fan_out.len(),
                    "handler failed"
                );
                return Err(ConsumeError::Handler {
                    handler,
                    source,
                    fan_out,
                });
            }
        };

        if let Some((group, task)) = &task {
            if !self.groups.handlers(group).is_empty() {
                fan_out.push(self.groups.dispatch(group, &task.task, &task.body)?);
            }
        }

        debug!(
            routing_key = %target.routing_key,
            handler = %handler,
            fan_out = fan_out.len(),
            "consumed frame"
        );
        Ok(ConsumeOutcome {
            target,
            handler,
            response,
            fan_out,
        })
    }

    /// Dispatch `routing_key` to every event group containing it that has
    /// handlers, in configuration order.
    fn fan_out_events(&self, routing_key: &str, body: &Value) -> Vec<DispatchReport> {
        self.groups
            .groups_containing(routing_key)
            .into_iter()
            .filter_map(|group| {
                let handlers = self.groups.handlers(group.name());
                if handlers.is_empty() {
                    return None;
                }
                // Membership was checked by `groups_containing`.
                GroupDispatcher::dispatch_with(group, routing_key, body, handlers).ok()
            })
            .collect()
    }

    /// Registered handler names.
    pub fn handlers(&self) -> Vec<&str> {
        self.handlers.keys().map(HandlerRef::as_str).collect()
    }

    pub fn resolver(&self) -> &RoutingResolver {
        &self.resolver
    }

    pub fn groups(&self) -> &GroupDispatcher {
        &self.groups
    }
}
