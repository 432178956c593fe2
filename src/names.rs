//! Reserved literals shared by every producer and consumer on the bus.
//!
//! These values are part of the wire contract. Changing any of them breaks
//! interoperability with every existing service.

/// Routing key used for frames published without a destination exchange.
pub const WORKER_QUEUE_NAME: &str = "worker";

/// Literal prefix of convention-routed command keys (`do.<service>`).
pub const DO_PREFIX: &str = "do.";

/// Prefix of the deferred, webhook-style twin of an event.
pub const POST_EVENT_PREFIX: &str = "post_";

/// Prefix of search re-index routing keys.
pub const REINDEX_PREFIX: &str = "go1-reindex.";

/// Notification command; its body carries `{ task, body }`.
pub const DO_NOTIFY: &str = "do.notify";

/// Cascading entity-deletion group.
pub const DELETE_GROUP: &str = "delete";

/// Valid `task` values for [`DO_NOTIFY`].
pub const NOTIFY_GROUP: &str = "notify";

/// Derive the deferred notification name for an event.
///
/// ```
/// assert_eq!(queue_routing::names::post_event("lo.create"), "post_lo.create");
/// ```
pub fn post_event(event: &str) -> String {
    format!("{POST_EVENT_PREFIX}{event}")
}

/// Routing key for re-indexing the given index.
pub fn reindex_key(index: &str) -> String {
    format!("{REINDEX_PREFIX}{index}")
}

/// The service a `do.<service>` key is addressed to.
///
/// Returns the full remainder after the prefix, so `do.mail.send` names the
/// service `mail.send`. An empty remainder is not a service.
pub fn service_of(routing_key: &str) -> Option<&str> {
    routing_key
        .strip_prefix(DO_PREFIX)
        .filter(|service| !service.is_empty())
}
