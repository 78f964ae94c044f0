//! Execution dispatcher: runs an ordered node sequence to completion or
//! first failure.
//!
//! The dispatcher owns the per-run context for the run's lifetime. Nodes
//! execute strictly one at a time; suspension happens only inside
//! capability invocations and is always awaited before the next node
//! starts. Every error is captured into the returned outcome; nothing is
//! thrown past `run`.

use serde_json::Value;
use std::sync::Arc;

use crate::connector::{ConnectorContext, ConnectorRegistry};
use crate::error::{EngineError, EngineResult};
use crate::expression::{render_config, View};
use crate::runtime::resolver;
use crate::services::Services;
use crate::workflow::types::{NodeSpec, RunContext, RunOutcome, Workflow};

/// Dispatches workflow runs against a shared connector registry.
pub struct Dispatcher {
    connectors: Arc<ConnectorRegistry>,
}

impl Dispatcher {
    pub fn new(connectors: Arc<ConnectorRegistry>) -> Self {
        Self { connectors }
    }

    /// Run a workflow with the given triggering payload and services.
    ///
    /// Always returns an outcome: validation and ordering failures abort
    /// before any node runs, a per-node failure aborts the remaining
    /// sequence (fail-fast), and in every case the accumulated results and
    /// logs are handed back to the caller.
    pub async fn run(
        &self,
        workflow: &Workflow,
        input: Value,
        services: Arc<Services>,
    ) -> RunOutcome {
        let started = std::time::Instant::now();
        tracing::info!("🚀 starting workflow run: {}", workflow.id);

        let mut ctx = RunContext::new(input, services);
        let result = self.execute(workflow, &mut ctx).await;

        let elapsed = started.elapsed();
        match result {
            Ok(()) => {
                tracing::info!("✅ workflow {} completed in {:?}", workflow.id, elapsed);
                RunOutcome {
                    success: true,
                    results: ctx.results,
                    logs: ctx.logs,
                    error: None,
                }
            }
            Err(err) => {
                tracing::warn!("❌ workflow {} failed in {:?}: {}", workflow.id, elapsed, err);
                RunOutcome {
                    success: false,
                    results: ctx.results,
                    logs: ctx.logs,
                    error: Some(err.to_string()),
                }
            }
        }
    }

    async fn execute(&self, workflow: &Workflow, ctx: &mut RunContext) -> EngineResult<()> {
        validate_unique_ids(workflow)?;
        let ordered = resolver::resolve_order(workflow)?;

        for node in ordered {
            self.execute_node(node, ctx).await?;
        }

        Ok(())
    }

    async fn execute_node(&self, node: &NodeSpec, ctx: &mut RunContext) -> EngineResult<()> {
        // Input: the named predecessor's recorded output, or the run's
        // triggering payload for root nodes. Ordering guarantees the
        // predecessor has completed if we got here.
        let input = match node.input_from() {
            Some(predecessor) => ctx
                .results
                .get(predecessor)
                .cloned()
                .ok_or_else(|| EngineError::ConnectorExecution {
                    node_id: node.id.clone(),
                    message: format!("expected input from {predecessor} but none was recorded"),
                })?,
            None => ctx.input.clone(),
        };

        // Resolve templates against the accumulated context; warnings go
        // into the run log and never fail the node.
        let mut warnings = Vec::new();
        let view = View::new(&input, &ctx.results);
        let resolved_config = render_config(&node.config, &view, &mut warnings);
        for warning in warnings {
            tracing::warn!("⚠️ node {}: {}", node.id, warning);
            ctx.log(&node.id, format!("Expression warning: {warning}"), None);
        }

        let connector = self.connectors.resolve(&node.node_type).ok_or_else(|| {
            EngineError::ConnectorNotFound {
                node_id: node.id.clone(),
                node_type: node.node_type.clone(),
            }
        })?;

        ctx.log(&node.id, "Execution started", Some(input.clone()));
        tracing::debug!("📍 executing node {} (type: {})", node.id, node.node_type);

        let invocation = {
            let mut connector_ctx = ConnectorContext {
                input: &input,
                results: &ctx.results,
                logs: &mut ctx.logs,
                services: ctx.services.as_ref(),
                node_id: &node.id,
            };
            connector.execute(&mut connector_ctx, &resolved_config).await
        };

        // A thrown error and a returned failure are handled identically:
        // log, record nothing, abort the rest of the sequence.
        let failure_message = match invocation {
            Err(err) => Some(err.to_string()),
            Ok(result) if !result.success => {
                Some(result.error.unwrap_or_else(|| "node execution failed".to_string()))
            }
            Ok(result) => {
                let output = result.output.unwrap_or(Value::Null);
                ctx.log(&node.id, "Execution completed", Some(output.clone()));
                ctx.results.insert(node.id.clone(), output);
                None
            }
        };

        if let Some(message) = failure_message {
            ctx.log(
                &node.id,
                "Execution failed",
                Some(Value::String(message.clone())),
            );
            return Err(EngineError::ConnectorExecution {
                node_id: node.id.clone(),
                message,
            });
        }

        Ok(())
    }
}

fn validate_unique_ids(workflow: &Workflow) -> EngineResult<()> {
    let mut seen = std::collections::HashSet::new();
    for node in &workflow.nodes {
        if !seen.insert(node.id.as_str()) {
            return Err(EngineError::Validation(format!(
                "duplicate node id: {}",
                node.id
            )));
        }
    }
    Ok(())
}
