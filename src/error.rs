//! Engine error taxonomy.
//!
//! Every variant is local to a single run: errors are captured into the
//! returned outcome and never cross the dispatcher boundary as a panic or
//! an unhandled propagation.

use thiserror::Error;

/// Result alias for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors raised while validating, ordering, or executing a workflow.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Definition is malformed: duplicate node ids, dangling references.
    #[error("invalid workflow definition: {0}")]
    Validation(String),

    /// Dependency cycle found during ordering.
    #[error("circular dependency detected at node {node_id}")]
    CircularDependency {
        /// Node at which the cycle was detected; always part of the cycle.
        node_id: String,
    },

    /// Node type does not resolve to any registered connector.
    #[error("no connector registered for node {node_id} (type {node_type})")]
    ConnectorNotFound {
        node_id: String,
        node_type: String,
    },

    /// A connector returned a failure or threw during execution.
    #[error("node {node_id} failed: {message}")]
    ConnectorExecution {
        node_id: String,
        message: String,
    },

    /// A connector required an injected service that was not configured.
    #[error("service not available: {service}")]
    ServiceUnavailable { service: String },
}
