//! Catalog entries.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::category::Category;
use super::contract::{ContractIssue, ContractRef};

/// Declared metadata for one event name.
///
/// `category` is only set when the catalog declares one explicitly;
/// otherwise the catalog classifies the name by convention.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventDescriptor {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
    #[serde(flatten)]
    pub contract: ContractRef,
}

impl EventDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            category: None,
            contract: ContractRef::default(),
        }
    }

    pub fn with_category(mut self, category: Category) -> Self {
        self.category = Some(category);
        self
    }

    pub fn with_contract(mut self, contract: ContractRef) -> Self {
        self.contract = contract;
        self
    }

    /// Check a body against this descriptor's contract, classified as `category`.
    pub fn check(&self, category: Option<Category>, body: &Value) -> Vec<ContractIssue> {
        self.contract.check(category, body)
    }
}
