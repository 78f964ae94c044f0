/// Wireflow: workflow execution engine with hot-reload and cron/webhook triggers
///
/// This library provides a graph-ordered workflow runner with a pluggable
/// connector system, config templating, and a trigger subsystem.

// Core configuration and setup
pub mod config;

// Shared error types for the execution engine
pub mod error;

// Host services injected into connector executions
pub mod services;

// Workflow management layer - definitions, storage, and hot-reload registry
pub mod workflow;

// Connector capability layer - built-in connectors and the alias-aware registry
pub mod connector;

// Config templating and the constrained expression interpreter
pub mod expression;

// Runtime execution - ordering, dispatch, and scheduled triggers
pub mod runtime;

// HTTP API layer - REST endpoints for workflow management and webhook triggers
pub mod api;

// Server setup and initialization
pub mod server;

// Re-export commonly used types for external consumers
pub use error::{EngineError, EngineResult};
pub use runtime::{Dispatcher, TriggerService};
pub use server::start_server;
pub use workflow::{Edge, NodeSpec, RunOutcome, Workflow};
