//! Consumer registry.
//!
//! EXACT bindings tie one routing key to a handler. PREFIX bindings claim a
//! service under the `do.<service>` convention; at most one may claim each
//! service name.

mod binding;
mod registry;

pub use binding::{ConsumerBinding, HandlerRef, MatchKind};
pub use registry::ConsumerRegistry;
