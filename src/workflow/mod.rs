//! Workflow definitions, persistence, and the hot in-memory registry.

pub mod registry;
pub mod storage;
pub mod types;

pub use registry::WorkflowRegistry;
pub use storage::WorkflowStorage;
pub use types::{Workflow, NodeSpec, Edge, LogEntry, RunContext, RunOutcome};
