//! Lookup table from routing keys to handlers.

use std::collections::HashMap;

use tracing::debug;

use super::binding::{ConsumerBinding, HandlerRef, MatchKind};
use crate::error::RoutingError;
use crate::names::{service_of, WORKER_QUEUE_NAME};

/// Registered consumer bindings.
///
/// Filled once at startup and read-only afterwards. Every configuration
/// mistake is reported by [`register`](Self::register), never while routing.
#[derive(Debug, Clone, Default)]
pub struct ConsumerRegistry {
    exact: HashMap<String, HandlerRef>,
    /// Keyed by service name, i.e. the pattern without `do.`.
    prefix: HashMap<String, HandlerRef>,
    bindings: Vec<ConsumerBinding>,
}

impl ConsumerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from a list of bindings, stopping at the first error.
    pub fn from_bindings<I>(bindings: I) -> Result<Self, RoutingError>
    where
        I: IntoIterator<Item = ConsumerBinding>,
    {
        let mut registry = Self::new();
        for binding in bindings {
            registry.register(binding)?;
        }
        Ok(registry)
    }

    /// Register a binding.
    ///
    /// Fails with `Configuration` on a duplicate EXACT key, on two PREFIX
    /// bindings for the same service, on a PREFIX pattern that is not
    /// `do.<service>`, and on any binding for the reserved worker key.
    pub fn register(&mut self, binding: ConsumerBinding) -> Result<(), RoutingError> {
        if binding.pattern == WORKER_QUEUE_NAME {
            return Err(RoutingError::Configuration(format!(
                "`{}` is reserved for the worker envelope and cannot be bound",
                WORKER_QUEUE_NAME
            )));
        }

        match binding.match_kind {
            MatchKind::Exact => {
                if binding.pattern.is_empty() {
                    return Err(RoutingError::Configuration(
                        "exact binding with empty routing key".into(),
                    ));
                }
                if let Some(existing) = self.exact.get(&binding.pattern) {
                    return Err(RoutingError::Configuration(format!(
                        "duplicate exact binding on `{}` ({} and {})",
                        binding.pattern, existing, binding.handler
                    )));
                }
                self.exact
                    .insert(binding.pattern.clone(), binding.handler.clone());
            }
            MatchKind::Prefix => {
                let service = service_of(&binding.pattern).ok_or_else(|| {
                    RoutingError::Configuration(format!(
                        "prefix binding `{}` is not of the form `do.<service>`",
                        binding.pattern
                    ))
                })?;
                if let Some(existing) = self.prefix.get(service) {
                    return Err(RoutingError::Configuration(format!(
                        "prefix bindings collide on service `{}` ({} and {})",
                        service, existing, binding.handler
                    )));
                }
                self.prefix
                    .insert(service.to_string(), binding.handler.clone());
            }
        }

        debug!(
            kind = ?binding.match_kind,
            pattern = %binding.pattern,
            handler = %binding.handler,
            "registered consumer binding"
        );
        self.bindings.push(binding);
        Ok(())
    }

    /// Builder-style [`register`](Self::register).
    pub fn with(mut self, binding: ConsumerBinding) -> Result<Self, RoutingError> {
        self.register(binding)?;
        Ok(self)
    }

    /// The handler bound to exactly this routing key.
    pub fn find_exact(&self, key: &str) -> Option<&HandlerRef> {
        self.exact.get(key)
    }

    /// The service a `do.<service>` key names, with its PREFIX binding if any.
    ///
    /// Returns `None` when the key does not follow the convention.
    pub fn find_by_prefix<'k>(&self, key: &'k str) -> Option<(&'k str, Option<&HandlerRef>)> {
        let service = service_of(key)?;
        Some((service, self.prefix.get(service)))
    }

    /// Bindings in registration order.
    pub fn bindings(&self) -> &[ConsumerBinding] {
        &self.bindings
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}
