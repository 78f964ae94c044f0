//! Core workflow type definitions.
//!
//! Defines the structures for workflow documents, nodes, and edges, plus the
//! per-run context and outcome types threaded through execution. Workflow
//! documents are serialized/deserialized from JSON for persistence and for
//! the editor contract.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

use crate::services::Services;

/// A complete workflow definition containing nodes and their connections.
///
/// Workflows are stored as JSON in SQLite and ordered into a linear node
/// sequence for execution. Immutable for the duration of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workflow {
    /// Unique workflow identifier (e.g., "wf-daily-report")
    pub id: String,
    /// Human-readable workflow name
    pub name: String,
    /// Nodes in this workflow
    pub nodes: Vec<NodeSpec>,
    /// Edges connecting nodes
    #[serde(default)]
    pub edges: Vec<Edge>,
}

/// A single node in a workflow.
///
/// The `type` field names a connector in the registry; `config` is an
/// arbitrary nested mapping that may contain template strings and an
/// optional `inputFrom` field naming a predecessor node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeSpec {
    /// Unique node identifier within the workflow (e.g., "n1", "fetch")
    pub id: String,
    /// Connector type identifier, resolved case/format-insensitively
    #[serde(rename = "type")]
    pub node_type: String,
    /// Node-specific configuration as flexible JSON
    #[serde(default)]
    pub config: Value,
}

impl NodeSpec {
    /// Declared predecessor, if the config names one.
    pub fn input_from(&self) -> Option<&str> {
        self.config.get("inputFrom").and_then(Value::as_str)
    }
}

/// Directed dependency between two nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    /// Source node ID
    pub source: String,
    /// Target node ID
    pub target: String,
}

/// One entry in a run's ordered log stream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    /// Node the entry belongs to
    pub node_id: String,
    /// Human-readable event message
    pub message: String,
    /// Optional structured payload (input, output, or error detail)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    /// Entry creation time
    pub timestamp: DateTime<Utc>,
}

impl LogEntry {
    pub fn new(node_id: impl Into<String>, message: impl Into<String>, data: Option<Value>) -> Self {
        Self {
            node_id: node_id.into(),
            message: message.into(),
            data,
            timestamp: Utc::now(),
        }
    }
}

/// Per-run mutable state, exclusively owned by the dispatcher.
///
/// `results` preserves insertion order, which equals execution order. No
/// entry is ever present for a node that has not completed successfully.
#[derive(Debug)]
pub struct RunContext {
    /// The triggering payload for this run
    pub input: Value,
    /// Completed node outputs, keyed by node id
    pub results: IndexMap<String, Value>,
    /// Ordered log stream for the run
    pub logs: Vec<LogEntry>,
    /// Injected capability handles (AI, credentials)
    pub services: Arc<Services>,
}

impl RunContext {
    pub fn new(input: Value, services: Arc<Services>) -> Self {
        Self {
            input,
            results: IndexMap::new(),
            logs: Vec::new(),
            services,
        }
    }

    /// Append a log entry for a node.
    pub fn log(&mut self, node_id: &str, message: impl Into<String>, data: Option<Value>) {
        self.logs.push(LogEntry::new(node_id, message, data));
    }
}

/// Final result of one run, returned to the caller and optionally persisted
/// as an immutable execution record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunOutcome {
    /// Whether every node completed
    pub success: bool,
    /// Outputs of all completed nodes, in execution order
    pub results: IndexMap<String, Value>,
    /// Full log stream for the run
    pub logs: Vec<LogEntry>,
    /// Error message when `success` is false
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn workflow_json_round_trip() {
        let workflow = Workflow {
            id: "wf-1".to_string(),
            name: "Round trip".to_string(),
            nodes: vec![
                NodeSpec {
                    id: "n1".to_string(),
                    node_type: "print".to_string(),
                    config: json!({ "message": "hi" }),
                },
                NodeSpec {
                    id: "n2".to_string(),
                    node_type: "http".to_string(),
                    config: json!({ "inputFrom": "n1", "url": "https://example.com" }),
                },
            ],
            edges: vec![Edge {
                source: "n1".to_string(),
                target: "n2".to_string(),
            }],
        };

        let encoded = serde_json::to_string(&workflow).unwrap();
        let decoded: Workflow = serde_json::from_str(&encoded).unwrap();
        assert_eq!(workflow, decoded);
    }

    #[test]
    fn node_type_uses_type_key_in_json() {
        let node: NodeSpec = serde_json::from_value(json!({
            "id": "n1",
            "type": "delay",
            "config": { "ms": 10 }
        }))
        .unwrap();
        assert_eq!(node.node_type, "delay");
        assert_eq!(node.input_from(), None);
    }

    #[test]
    fn input_from_reads_config_field() {
        let node: NodeSpec = serde_json::from_value(json!({
            "id": "n2",
            "type": "print",
            "config": { "inputFrom": "n1" }
        }))
        .unwrap();
        assert_eq!(node.input_from(), Some("n1"));
    }
}
