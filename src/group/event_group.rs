//! Named, closed sets of event or task names.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// A curated set of names sharing cross-cutting handling.
///
/// An *event group* (no `command`) lists routing keys, such as the
/// deletion events that trigger cascading cleanup. A *task group* lists the
/// valid `task` values of one command, such as the tasks `do.notify`
/// accepts. Membership is exact set membership, never a naming pattern.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventGroup {
    name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    command: Option<String>,
    members: HashSet<String>,
}

impl EventGroup {
    /// A group of routing keys.
    pub fn events<I, S>(name: impl Into<String>, members: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            command: None,
            members: members.into_iter().map(Into::into).collect(),
        }
    }

    /// A group of task names valid for `command`.
    pub fn tasks<I, S>(name: impl Into<String>, command: impl Into<String>, members: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            command: Some(command.into()),
            members: members.into_iter().map(Into::into).collect(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The command whose `task` field this group constrains.
    pub fn command(&self) -> Option<&str> {
        self.command.as_deref()
    }

    pub fn is_task_group(&self) -> bool {
        self.command.is_some()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.members.contains(name)
    }

    pub fn members(&self) -> impl Iterator<Item = &str> {
        self.members.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}
