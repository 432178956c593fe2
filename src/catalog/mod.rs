//! Event taxonomy: categories, payload contracts and the advisory catalog.
//!
//! Names encode meaning. `<entity>.create|update|delete` are lifecycle
//! events whose bodies carry the full entity, `do.<service>` are commands
//! routed to the owning service, and `post_<event>` is the deferred twin of
//! an event. The catalog records what is known about each name; anything it
//! does not know falls back to these conventions.

mod catalog;
mod category;
mod contract;
mod descriptor;

pub use catalog::EventCatalog;
pub use category::Category;
pub use contract::{ContractIssue, ContractPolicy, ContractRef, ORIGINAL_FIELD};
pub use descriptor::EventDescriptor;
