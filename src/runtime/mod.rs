//! Execution runtime: ordering, dispatch, and scheduled triggers.

pub mod dispatcher;
pub mod resolver;
pub mod scheduler;

pub use dispatcher::Dispatcher;
pub use scheduler::TriggerService;
