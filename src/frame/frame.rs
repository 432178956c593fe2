//! The unit placed on the transport, and the worker envelope.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::error::RoutingError;
use crate::names::WORKER_QUEUE_NAME;

/// Envelope field carrying the original routing key.
pub const ENVELOPE_ROUTING_KEY: &str = "routingKey";
/// Envelope field carrying the original body.
pub const ENVELOPE_BODY: &str = "body";

/// A message as it travels on the transport.
///
/// Serialized with the same field names every other service on the bus
/// uses: `{ "routingKey": ..., "body": ..., "exchange": ... }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Frame {
    pub routing_key: String,
    #[serde(default)]
    pub body: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exchange: Option<String>,
}

impl Frame {
    /// A frame published straight to `exchange`.
    pub fn direct(exchange: impl Into<String>, routing_key: impl Into<String>, body: Value) -> Self {
        Self {
            routing_key: routing_key.into(),
            body,
            exchange: Some(exchange.into()),
        }
    }

    /// Wrap a message in the worker envelope.
    ///
    /// Apply at most once per publish: wrapping a frame that is already a
    /// worker frame produces a double wrap that consumers reject.
    pub fn worker(routing_key: impl Into<String>, body: Value) -> Self {
        Self {
            routing_key: WORKER_QUEUE_NAME.to_string(),
            body: json!({
                ENVELOPE_ROUTING_KEY: routing_key.into(),
                ENVELOPE_BODY: body,
            }),
            exchange: None,
        }
    }

    /// Whether this frame is addressed to the worker queue.
    pub fn is_worker(&self) -> bool {
        self.routing_key == WORKER_QUEUE_NAME
    }

    /// Extract the embedded `(routing_key, body)` pair from a worker frame.
    ///
    /// Never recurses: an embedded key that is itself `worker` is a
    /// double wrap and is rejected.
    pub fn unwrap_worker(&self) -> Result<(String, Value), RoutingError> {
        if !self.is_worker() {
            return Err(RoutingError::MalformedEnvelope(format!(
                "frame `{}` is not addressed to the worker queue",
                self.routing_key
            )));
        }
        let envelope = self.body.as_object().ok_or_else(|| {
            RoutingError::MalformedEnvelope("worker body is not an object".into())
        })?;
        let (key, body) = split_envelope(envelope)?;
        if key == WORKER_QUEUE_NAME {
            return Err(RoutingError::MalformedEnvelope(
                "embedded routing key is `worker` (double-wrapped frame)".into(),
            ));
        }
        Ok((key.to_string(), body.clone()))
    }

    /// Encode for the wire.
    pub fn to_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }

    /// Decode from the wire.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }
}

fn split_envelope(envelope: &Map<String, Value>) -> Result<(&str, &Value), RoutingError> {
    let key = envelope.get(ENVELOPE_ROUTING_KEY).ok_or_else(|| {
        RoutingError::MalformedEnvelope(format!("missing `{}`", ENVELOPE_ROUTING_KEY))
    })?;
    let key = key.as_str().ok_or_else(|| {
        RoutingError::MalformedEnvelope(format!("`{}` is not a string", ENVELOPE_ROUTING_KEY))
    })?;
    let body = envelope.get(ENVELOPE_BODY).ok_or_else(|| {
        RoutingError::MalformedEnvelope(format!("missing `{}`", ENVELOPE_BODY))
    })?;
    Ok((key, body))
}
