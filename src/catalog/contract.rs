//! Payload contracts and how strictly they are applied.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::category::Category;

/// Field that update events must carry alongside the new state.
pub const ORIGINAL_FIELD: &str = "original";

/// Logical shape requirement for an event body.
///
/// Lifecycle conventions always apply: create and delete bodies carry the
/// full entity (an object, never a bare id) and update bodies also carry the
/// pre-change value under `original`. `required_fields` adds a schema on top.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractRef {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required_fields: Vec<String>,
}

impl ContractRef {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn requiring<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            required_fields: fields.into_iter().map(Into::into).collect(),
        }
    }

    /// Whether a schema was registered for this contract.
    pub fn has_schema(&self) -> bool {
        !self.required_fields.is_empty()
    }

    /// Check a body against the lifecycle conventions and the schema.
    pub fn check(&self, category: Option<Category>, body: &Value) -> Vec<ContractIssue> {
        let mut issues = Vec::new();
        let lifecycle = category.is_some_and(Category::is_lifecycle);

        let Some(object) = body.as_object() else {
            if lifecycle || self.has_schema() {
                issues.push(ContractIssue::NotAnObject);
            }
            return issues;
        };

        if category == Some(Category::LifecycleUpdate) && !object.contains_key(ORIGINAL_FIELD) {
            issues.push(ContractIssue::MissingField(ORIGINAL_FIELD.to_string()));
        }
        for field in &self.required_fields {
            if !object.contains_key(field) {
                issues.push(ContractIssue::MissingField(field.clone()));
            }
        }
        issues
    }
}

/// A single way in which a body fails its contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContractIssue {
    /// The body is a scalar or array where an entity object is expected.
    NotAnObject,
    MissingField(String),
}

impl fmt::Display for ContractIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContractIssue::NotAnObject => write!(f, "body is not an object"),
            ContractIssue::MissingField(field) => write!(f, "missing field `{}`", field),
        }
    }
}

/// How contract issues found at publish time are treated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContractPolicy {
    /// Skip contract checks entirely.
    Off,
    /// Log issues and publish anyway.
    #[default]
    Advisory,
    /// Reject the publish with `ContractViolation`.
    Enforce,
}

impl FromStr for ContractPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "off" => Ok(ContractPolicy::Off),
            "advisory" => Ok(ContractPolicy::Advisory),
            "enforce" => Ok(ContractPolicy::Enforce),
            other => Err(format!("unknown contract policy `{}`", other)),
        }
    }
}
