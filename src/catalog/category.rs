//! Semantic categories encoded by event naming conventions.

use serde::{Deserialize, Serialize};

use crate::names::{DO_PREFIX, POST_EVENT_PREFIX};

/// The semantic category of an event or command name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    LifecycleCreate,
    LifecycleUpdate,
    LifecycleDelete,
    View,
    CommandDo,
    NotifyTask,
    ExternalWebhook,
}

impl Category {
    /// Best-effort classification from the shape of the name alone.
    ///
    /// Rules are tried in order: `post_` prefix, `do.` prefix, a `view`
    /// segment, then the lifecycle suffixes. Notify-task membership is not
    /// structural and is applied by [`EventCatalog`](super::EventCatalog).
    pub fn infer(name: &str) -> Option<Category> {
        if name.starts_with(POST_EVENT_PREFIX) {
            return Some(Category::ExternalWebhook);
        }
        if name.starts_with(DO_PREFIX) {
            return Some(Category::CommandDo);
        }
        if name.contains(".view.") || name.ends_with(".view") {
            return Some(Category::View);
        }
        match name.rsplit_once('.') {
            Some((_, "create")) => Some(Category::LifecycleCreate),
            Some((_, "update")) => Some(Category::LifecycleUpdate),
            Some((_, "delete")) => Some(Category::LifecycleDelete),
            _ => None,
        }
    }

    /// Lifecycle events carry the full entity in their body.
    pub fn is_lifecycle(self) -> bool {
        matches!(
            self,
            Category::LifecycleCreate | Category::LifecycleUpdate | Category::LifecycleDelete
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Category::LifecycleCreate => "lifecycle_create",
            Category::LifecycleUpdate => "lifecycle_update",
            Category::LifecycleDelete => "lifecycle_delete",
            Category::View => "view",
            Category::CommandDo => "command_do",
            Category::NotifyTask => "notify_task",
            Category::ExternalWebhook => "external_webhook",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
