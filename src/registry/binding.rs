//! Consumer bindings.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Names a handler (typically the owning service) that receives messages.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HandlerRef(String);

impl HandlerRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for HandlerRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for HandlerRef {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for HandlerRef {
    fn from(name: String) -> Self {
        Self(name)
    }
}

/// How a binding's pattern is matched against a routing key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    /// The pattern is one specific routing key.
    Exact,
    /// The pattern is `do.<service>`; it claims the service name.
    Prefix,
}

/// A consumer registration loaded from static configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsumerBinding {
    #[serde(rename = "match")]
    pub match_kind: MatchKind,
    pub pattern: String,
    pub handler: HandlerRef,
}

impl ConsumerBinding {
    pub fn exact(pattern: impl Into<String>, handler: impl Into<HandlerRef>) -> Self {
        Self {
            match_kind: MatchKind::Exact,
            pattern: pattern.into(),
            handler: handler.into(),
        }
    }

    pub fn prefix(pattern: impl Into<String>, handler: impl Into<HandlerRef>) -> Self {
        Self {
            match_kind: MatchKind::Prefix,
            pattern: pattern.into(),
            handler: handler.into(),
        }
    }
}
