//! Connector capability contract.
//!
//! A connector is a pluggable unit of work invoked by node type identifier.
//! The engine depends only on this interface, never on connector internals:
//! a connector receives the per-run context view plus its fully resolved
//! config, and reports success or failure through `ConnectorResult`.
//!
//! Connectors must be safe to call with partially-resolved config (template
//! resolution is best-effort) and should push at least one log entry so
//! failed runs remain debuggable.

pub mod builtin;
pub mod registry;

pub use registry::ConnectorRegistry;

use async_trait::async_trait;
use indexmap::IndexMap;
use serde_json::Value;

use crate::services::Services;
use crate::workflow::types::LogEntry;

/// Coarse classification of a connector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectorKind {
    /// Starts a run (webhook, cron, manual start); passes input through
    Trigger,
    /// Performs an external side effect (HTTP call, message send)
    Action,
    /// Shapes control flow (condition)
    Logic,
    /// Small helpers (print, delay, math, random)
    Utility,
}

/// View of the run context handed to a connector invocation.
pub struct ConnectorContext<'a> {
    /// Value feeding this node: trigger payload or predecessor output
    pub input: &'a Value,
    /// Outputs of previously completed nodes
    pub results: &'a IndexMap<String, Value>,
    /// Run log; connectors append their own entries here
    pub logs: &'a mut Vec<LogEntry>,
    /// Injected capability handles
    pub services: &'a Services,
    /// Id of the node currently executing, for log attribution
    pub node_id: &'a str,
}

impl ConnectorContext<'_> {
    /// Append a log entry attributed to the current node.
    pub fn log(&mut self, message: impl Into<String>, data: Option<Value>) {
        self.logs.push(LogEntry::new(self.node_id, message, data));
    }
}

/// Outcome of a single connector invocation.
#[derive(Debug, Clone)]
pub struct ConnectorResult {
    pub success: bool,
    pub output: Option<Value>,
    pub error: Option<String>,
}

impl ConnectorResult {
    pub fn ok(output: Value) -> Self {
        Self {
            success: true,
            output: Some(output),
            error: None,
        }
    }

    pub fn fail(error: impl Into<String>) -> Self {
        Self {
            success: false,
            output: None,
            error: Some(error.into()),
        }
    }
}

/// Pluggable unit of work, dispatched by node type identifier.
///
/// An `Err` return and a `ConnectorResult` with `success == false` are
/// treated identically by the dispatcher; `Err` is the ergonomic path for
/// connectors using `?` internally.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Canonical identifier (lowercase, no separators)
    fn id(&self) -> &'static str;

    /// Human-readable label
    fn name(&self) -> &'static str;

    /// Coarse kind for the editor palette
    fn kind(&self) -> ConnectorKind;

    /// Execute one node with the given context and resolved config.
    async fn execute(
        &self,
        ctx: &mut ConnectorContext<'_>,
        config: &Value,
    ) -> anyhow::Result<ConnectorResult>;
}
