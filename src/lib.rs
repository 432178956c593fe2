//! Event taxonomy, worker-envelope framing and `do.<service>` routing for a
//! publish/subscribe message bus.
//!
//! Producers build [`Frame`]s with a [`FrameBuilder`]; consumers resolve them
//! with a [`RoutingResolver`] and fan deletions and notifications out through
//! a [`GroupDispatcher`]. Transports plug in behind the traits in [`bus`].

pub mod catalog;
pub mod config;
pub mod error;
pub mod frame;
pub mod group;
pub mod names;
pub mod registry;
pub mod resolver;

#[cfg(feature = "bus")]
pub mod bus;
#[cfg(feature = "bus")]
pub mod consumer;

#[cfg(feature = "http")]
pub mod http;

pub use catalog::{Category, ContractIssue, ContractPolicy, ContractRef, EventCatalog, EventDescriptor};
pub use config::{Routing, RoutingConfig};
pub use error::{HandlerError, RoutingError};
pub use frame::{Frame, FrameBuilder};
pub use group::{DispatchReport, EventGroup, GroupDispatcher, TaskCommand};
pub use registry::{ConsumerBinding, ConsumerRegistry, HandlerRef, MatchKind};
pub use resolver::{Delivery, ResolvedTarget, Route, RoutingResolver};

#[cfg(feature = "bus")]
pub use consumer::{Consumer, Context};
