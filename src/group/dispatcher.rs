//! Best-effort fan-out to group handlers.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};

use super::event_group::EventGroup;
use super::task::TaskCommand;
use crate::error::{contain_panic, HandlerError, RoutingError};
use crate::registry::HandlerRef;

type GroupFn = dyn Fn(&str, &Value) -> Result<(), HandlerError> + Send + Sync;

/// A handler bound to a group. Receives the member name and its body.
#[derive(Clone)]
pub struct GroupHandler {
    handler: HandlerRef,
    call: Arc<GroupFn>,
}

impl GroupHandler {
    pub fn new<F>(handler: impl Into<HandlerRef>, call: F) -> Self
    where
        F: Fn(&str, &Value) -> Result<(), HandlerError> + Send + Sync + 'static,
    {
        Self {
            handler: handler.into(),
            call: Arc::new(call),
        }
    }

    pub fn handler_ref(&self) -> &HandlerRef {
        &self.handler
    }

    /// Invoke the handler, containing any panic as a `HandlerError`.
    fn invoke(&self, member: &str, body: &Value) -> Result<(), HandlerError> {
        contain_panic(|| (self.call)(member, body))
    }
}

impl std::fmt::Debug for GroupHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GroupHandler")
            .field("handler", &self.handler)
            .finish_non_exhaustive()
    }
}

/// Result of one handler during fan-out.
#[derive(Debug)]
pub struct HandlerOutcome {
    pub handler: HandlerRef,
    pub result: Result<(), HandlerError>,
}

/// Aggregate result of a fan-out, one outcome per handler in order.
#[derive(Debug)]
pub struct DispatchReport {
    pub group: String,
    pub member: String,
    pub outcomes: Vec<HandlerOutcome>,
}

impl DispatchReport {
    /// Handlers that failed, for retry or alerting by the caller.
    pub fn failed(&self) -> Vec<&HandlerRef> {
        self.outcomes
            .iter()
            .filter(|o| o.result.is_err())
            .map(|o| &o.handler)
            .collect()
    }

    pub fn is_success(&self) -> bool {
        self.outcomes.iter().all(|o| o.result.is_ok())
    }
}

/// Holds the configured groups and the handlers bound to each.
///
/// ## Example
///
/// ```
/// use queue_routing::group::{EventGroup, GroupDispatcher};
/// use serde_json::json;
///
/// let dispatcher = GroupDispatcher::with_groups([
///     EventGroup::events("delete", ["user.delete", "lo.delete"]),
/// ])
/// .unwrap()
/// .on("delete", "search-cleanup", |_name, _body| Ok(()))
/// .unwrap();
///
/// let report = dispatcher.dispatch("delete", "user.delete", &json!({ "id": 1 })).unwrap();
/// assert!(report.is_success());
/// ```
#[derive(Debug, Clone, Default)]
pub struct GroupDispatcher {
    /// Configuration order is the fan-out order.
    groups: Vec<EventGroup>,
    /// Registration order is the invocation order.
    handlers: HashMap<String, Vec<GroupHandler>>,
}

impl GroupDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a dispatcher over `groups`. Duplicate group names, or two task
    /// groups constraining the same command, are configuration errors.
    pub fn with_groups<I>(groups: I) -> Result<Self, RoutingError>
    where
        I: IntoIterator<Item = EventGroup>,
    {
        let mut dispatcher = Self::new();
        for group in groups {
            dispatcher.add_group(group)?;
        }
        Ok(dispatcher)
    }

    pub fn add_group(&mut self, group: EventGroup) -> Result<(), RoutingError> {
        if self.group(group.name()).is_some() {
            return Err(RoutingError::Configuration(format!(
                "duplicate group `{}`",
                group.name()
            )));
        }
        if let Some(command) = group.command() {
            if self.task_group_for(command).is_some() {
                return Err(RoutingError::Configuration(format!(
                    "more than one task group for command `{}`",
                    command
                )));
            }
        }
        self.groups.push(group);
        Ok(())
    }

    /// Bind a handler to a group. Handlers run in the order they are bound.
    pub fn on<F>(
        mut self,
        group: &str,
        handler: impl Into<HandlerRef>,
        call: F,
    ) -> Result<Self, RoutingError>
    where
        F: Fn(&str, &Value) -> Result<(), HandlerError> + Send + Sync + 'static,
    {
        if self.group(group).is_none() {
            return Err(RoutingError::UnknownGroup(group.to_string()));
        }
        self.handlers
            .entry(group.to_string())
            .or_default()
            .push(GroupHandler::new(handler, call));
        Ok(self)
    }

    pub fn group(&self, name: &str) -> Option<&EventGroup> {
        self.groups.iter().find(|g| g.name() == name)
    }

    /// Configured groups, in configuration order.
    pub fn groups(&self) -> impl Iterator<Item = &EventGroup> {
        self.groups.iter()
    }

    /// Whether `name` belongs to `group`. Unknown groups have no members.
    pub fn is_member(&self, group: &str, name: &str) -> bool {
        self.group(group).is_some_and(|g| g.contains(name))
    }

    /// Event groups (not task groups) that list `routing_key`, in
    /// configuration order.
    pub fn groups_containing<'a>(
        &'a self,
        routing_key: &'a str,
    ) -> impl Iterator<Item = &'a EventGroup> + 'a {
        self.groups
            .iter()
            .filter(move |g| !g.is_task_group() && g.contains(routing_key))
    }

    /// The task group constraining `command`, if any.
    pub fn task_group_for(&self, command: &str) -> Option<&EventGroup> {
        self.groups.iter().find(|g| g.command() == Some(command))
    }

    /// Handlers bound to `group`, in invocation order.
    pub fn handlers(&self, group: &str) -> &[GroupHandler] {
        self.handlers.get(group).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Fan `name` out to every handler bound to `group`.
    pub fn dispatch(
        &self,
        group: &str,
        name: &str,
        body: &Value,
    ) -> Result<DispatchReport, RoutingError> {
        let event_group = self
            .group(group)
            .ok_or_else(|| RoutingError::UnknownGroup(group.to_string()))?;
        Self::dispatch_with(event_group, name, body, self.handlers(group))
    }

    /// Fan `name` out to an explicit handler sequence.
    ///
    /// Non-members are rejected before any handler runs. After that every
    /// handler is invoked regardless of earlier failures.
    pub fn dispatch_with(
        group: &EventGroup,
        name: &str,
        body: &Value,
        handlers: &[GroupHandler],
    ) -> Result<DispatchReport, RoutingError> {
        if !group.contains(name) {
            return Err(RoutingError::GroupMembershipViolation {
                group: group.name().to_string(),
                member: name.to_string(),
            });
        }

        let outcomes: Vec<HandlerOutcome> = handlers
            .iter()
            .map(|handler| {
                let result = handler.invoke(name, body);
                if let Err(err) = &result {
                    warn!(
                        group = group.name(),
                        member = name,
                        handler = %handler.handler_ref(),
                        error = %err,
                        "group handler failed"
                    );
                }
                HandlerOutcome {
                    handler: handler.handler_ref().clone(),
                    result,
                }
            })
            .collect();

        debug!(
            group = group.name(),
            member = name,
            handlers = outcomes.len(),
            "group fan-out complete"
        );
        Ok(DispatchReport {
            group: group.name().to_string(),
            member: name.to_string(),
            outcomes,
        })
    }

    /// Check a task command against its task group without dispatching.
    ///
    /// Returns `Ok(None)` when `command` has no task group.
    pub fn validate_task(
        &self,
        command: &str,
        body: &Value,
    ) -> Result<Option<(&EventGroup, TaskCommand)>, RoutingError> {
        let Some(group) = self.task_group_for(command) else {
            return Ok(None);
        };
        let task = TaskCommand::parse(command, body)?;
        if !group.contains(&task.task) {
            return Err(RoutingError::GroupMembershipViolation {
                group: group.name().to_string(),
                member: task.task,
            });
        }
        Ok(Some((group, task)))
    }

    /// Validate a task command and fan its task out to the task group.
    pub fn dispatch_task(
        &self,
        command: &str,
        body: &Value,
    ) -> Result<DispatchReport, RoutingError> {
        let (group, task) = self
            .validate_task(command, body)?
            .ok_or_else(|| RoutingError::UnknownGroup(command.to_string()))?;
        Self::dispatch_with(group, &task.task, &task.body, self.handlers(group.name()))
    }
}
