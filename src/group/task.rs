//! Task commands: one `do.<service>` key carrying a `task` discriminator.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::RoutingError;

/// Body of a task command, `{ task: STRING, body: TASK_BODY }`.
///
/// Services define one DO key each and switch on `task`, rather than
/// minting a routing key per task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskCommand {
    pub task: String,
    #[serde(default)]
    pub body: Value,
}

impl TaskCommand {
    pub fn new(task: impl Into<String>, body: Value) -> Self {
        Self {
            task: task.into(),
            body,
        }
    }

    /// Parse the body of `command`.
    pub fn parse(command: &str, body: &Value) -> Result<Self, RoutingError> {
        let invalid = |reason: &str| RoutingError::InvalidCommand {
            command: command.to_string(),
            reason: reason.to_string(),
        };
        let object = body.as_object().ok_or_else(|| invalid("body is not an object"))?;
        let task = object
            .get("task")
            .ok_or_else(|| invalid("missing `task`"))?
            .as_str()
            .ok_or_else(|| invalid("`task` is not a string"))?;
        Ok(Self {
            task: task.to_string(),
            body: object.get("body").cloned().unwrap_or(Value::Null),
        })
    }
}
