//! Event groups and best-effort fan-out.
//!
//! Groups are closed sets configured at startup. Dispatch checks
//! membership first, then calls every bound handler in registration order;
//! one handler failing never stops the others, and the caller receives the
//! full list of outcomes once fan-out completes.

mod dispatcher;
mod event_group;
mod task;

pub use dispatcher::{DispatchReport, GroupDispatcher, GroupHandler, HandlerOutcome};
pub use event_group::EventGroup;
pub use task::TaskCommand;
