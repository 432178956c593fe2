//! Error taxonomy for framing, routing, group dispatch and handlers.

use std::panic::{self, AssertUnwindSafe};

use thiserror::Error;

use crate::catalog::ContractIssue;

/// Errors raised by the routing core.
///
/// None of these are retried by the core itself. Framing and resolution
/// errors go straight back to the immediate caller; the transport layer
/// decides whether to dead-letter, log or drop.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoutingError {
    /// A `worker` frame without the two envelope fields, or a double wrap.
    #[error("malformed worker envelope: {0}")]
    MalformedEnvelope(String),

    /// No EXACT binding and no `do.<service>` convention matched.
    #[error("no route for routing key `{0}`")]
    Unroutable(String),

    /// Invalid static configuration. Only raised while building the registry.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A name is not a member of the closed group it was dispatched against.
    #[error("`{member}` is not a member of group `{group}`")]
    GroupMembershipViolation { group: String, member: String },

    /// A payload failed its registered contract under an enforcing policy.
    #[error("payload for `{event}` violates its contract: {}", describe(.issues))]
    ContractViolation {
        event: String,
        issues: Vec<ContractIssue>,
    },

    /// Dispatch named a group that was never configured.
    #[error("unknown group `{0}`")]
    UnknownGroup(String),

    /// A task command body without a usable `task` discriminator.
    #[error("invalid command `{command}`: {reason}")]
    InvalidCommand { command: String, reason: String },
}

fn describe(issues: &[ContractIssue]) -> String {
    issues
        .iter()
        .map(|issue| issue.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

impl RoutingError {
    /// Whether redelivering the same message could succeed.
    ///
    /// Every routing failure is a property of the message or the static
    /// configuration, so redelivery never helps.
    pub fn is_retryable(&self) -> bool {
        false
    }

    /// Whether the transport should move the message to a dead-letter queue.
    pub fn should_dead_letter(&self) -> bool {
        matches!(
            self,
            RoutingError::MalformedEnvelope(_)
                | RoutingError::Unroutable(_)
                | RoutingError::ContractViolation { .. }
                | RoutingError::InvalidCommand { .. }
        )
    }

    /// Map this error to an HTTP-style status code.
    pub fn status_code(&self) -> u16 {
        match self {
            RoutingError::MalformedEnvelope(_) => 400,
            RoutingError::Unroutable(_) => 404,
            RoutingError::Configuration(_) => 500,
            RoutingError::GroupMembershipViolation { .. } => 422,
            RoutingError::ContractViolation { .. } => 422,
            RoutingError::UnknownGroup(_) => 500,
            RoutingError::InvalidCommand { .. } => 400,
        }
    }
}

/// Error returned by a message handler.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// No handler registered under this name.
    #[error("unknown handler: {0}")]
    UnknownHandler(String),
    /// Body decode / deserialization failed.
    #[error("decode failed: {0}")]
    DecodeFailed(String),
    /// Business logic rejected the message.
    #[error("rejected: {0}")]
    Rejected(String),
    /// Referenced entity or resource not found.
    #[error("not found: {0}")]
    NotFound(String),
    /// The handler panicked; the panic was contained.
    #[error("handler panicked: {0}")]
    Panicked(String),
    #[error("handler error: {0}")]
    Other(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl From<serde_json::Error> for HandlerError {
    fn from(err: serde_json::Error) -> Self {
        HandlerError::DecodeFailed(err.to_string())
    }
}

impl HandlerError {
    /// Map this error to an HTTP-style status code.
    pub fn status_code(&self) -> u16 {
        match self {
            HandlerError::UnknownHandler(_) => 404,
            HandlerError::DecodeFailed(_) => 400,
            HandlerError::Rejected(_) => 422,
            HandlerError::NotFound(_) => 404,
            HandlerError::Panicked(_) => 500,
            HandlerError::Other(_) => 500,
        }
    }
}

/// Run a handler, turning a panic into [`HandlerError::Panicked`].
pub(crate) fn contain_panic<T>(
    call: impl FnOnce() -> Result<T, HandlerError>,
) -> Result<T, HandlerError> {
    match panic::catch_unwind(AssertUnwindSafe(call)) {
        Ok(result) => result,
        Err(payload) => {
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "non-string panic payload".to_string());
            Err(HandlerError::Panicked(message))
        }
    }
}
