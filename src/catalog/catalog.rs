//! Immutable name → descriptor lookup.

use std::collections::{HashMap, HashSet};

use serde_json::Value;

use super::category::Category;
use super::contract::{ContractIssue, ContractRef};
use super::descriptor::EventDescriptor;
use crate::error::RoutingError;
use crate::group::EventGroup;
use crate::names::POST_EVENT_PREFIX;

/// Advisory metadata about every known event name.
///
/// The catalog is not an allow-list: names it has never heard of can still
/// be published and routed, and are classified from their structure.
#[derive(Debug, Clone, Default)]
pub struct EventCatalog {
    descriptors: HashMap<String, EventDescriptor>,
    notify_tasks: HashSet<String>,
}

impl EventCatalog {
    /// An empty catalog. Everything is classified by convention.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a catalog from descriptors and the groups whose task members
    /// classify as [`Category::NotifyTask`].
    pub fn new<I>(descriptors: I, groups: &[EventGroup]) -> Result<Self, RoutingError>
    where
        I: IntoIterator<Item = EventDescriptor>,
    {
        let mut map = HashMap::new();
        for descriptor in descriptors {
            if descriptor.name.is_empty() {
                return Err(RoutingError::Configuration(
                    "catalog entry with empty name".into(),
                ));
            }
            if map.contains_key(&descriptor.name) {
                return Err(RoutingError::Configuration(format!(
                    "duplicate catalog entry `{}`",
                    descriptor.name
                )));
            }
            map.insert(descriptor.name.clone(), descriptor);
        }

        let notify_tasks = groups
            .iter()
            .filter(|group| group.is_task_group())
            .flat_map(|group| group.members().map(str::to_string))
            .collect();

        Ok(Self {
            descriptors: map,
            notify_tasks,
        })
    }

    /// Look up a declared descriptor. `None` is not an error.
    pub fn lookup(&self, name: &str) -> Option<&EventDescriptor> {
        self.descriptors.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.descriptors.contains_key(name)
    }

    /// Classify a name: declared category first, then task-group membership,
    /// then structural inference.
    pub fn classify(&self, name: &str) -> Option<Category> {
        if let Some(category) = self.lookup(name).and_then(|d| d.category) {
            return Some(category);
        }
        if self.notify_tasks.contains(name) {
            return Some(Category::NotifyTask);
        }
        Category::infer(name)
    }

    /// Check a body against the contract registered for `name`, or against
    /// the lifecycle conventions alone when the name is unknown.
    ///
    /// `post_<event>` shares the contract of `<event>`.
    pub fn check(&self, name: &str, body: &Value) -> Vec<ContractIssue> {
        if let Some(base) = name
            .strip_prefix(POST_EVENT_PREFIX)
            .filter(|base| !base.is_empty())
        {
            return self.check(base, body);
        }
        let category = self.classify(name);
        match self.lookup(name) {
            Some(descriptor) => descriptor.check(category, body),
            None => ContractRef::default().check(category, body),
        }
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// All declared names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.descriptors.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}
