//! Trigger subsystem: cron registrations that fire workflow runs.
//!
//! Built on tokio-cron-scheduler with a tracked job-UUID map so
//! re-registering a workflow fully cancels the previous job before the new
//! one is installed (last write wins, never two live jobs for one
//! workflow). A failed firing is caught and logged at the firing boundary;
//! it never unschedules the job or touches the hosting process.

use anyhow::Result;
use serde_json::json;
use std::{collections::HashMap, sync::Arc};
use tokio::sync::{Mutex, RwLock};
use tokio_cron_scheduler::{Job, JobScheduler};
use uuid::Uuid;

use crate::runtime::dispatcher::Dispatcher;
use crate::services::Services;
use crate::workflow::registry::WorkflowRegistry;
use crate::workflow::storage::WorkflowStorage;
use crate::workflow::types::Workflow;

/// Node types that declare a schedule-style trigger.
const CRON_NODE_TYPES: [&str; 2] = ["cron", "schedule"];

/// Process-wide trigger registry: workflow id -> live scheduled job.
pub struct TriggerService {
    scheduler: Arc<RwLock<JobScheduler>>,
    /// Mutation of this map is the synchronization point for idempotent
    /// re-registration; held across cancel + install.
    jobs: Mutex<HashMap<String, Uuid>>,
    registry: Arc<WorkflowRegistry>,
    dispatcher: Arc<Dispatcher>,
    storage: Option<WorkflowStorage>,
    services: Arc<Services>,
}

impl TriggerService {
    pub async fn new(
        registry: Arc<WorkflowRegistry>,
        dispatcher: Arc<Dispatcher>,
        storage: Option<WorkflowStorage>,
        services: Arc<Services>,
    ) -> Result<Self> {
        let scheduler = JobScheduler::new().await?;
        Ok(Self {
            scheduler: Arc::new(RwLock::new(scheduler)),
            jobs: Mutex::new(HashMap::new()),
            registry,
            dispatcher,
            storage,
            services,
        })
    }

    /// Scan all active definitions for schedule triggers and start firing.
    pub async fn start(&self) -> Result<()> {
        tracing::info!("⏰ starting trigger service");

        for workflow in self.registry.all() {
            self.sync_workflow(&workflow).await;
        }

        {
            let scheduler = self.scheduler.read().await;
            scheduler.start().await?;
        }

        let count = self.jobs.lock().await.len();
        tracing::info!("✅ trigger service started with {} cron registrations", count);
        Ok(())
    }

    /// Stop the scheduler and drop every registration.
    pub async fn shutdown(&self) -> Result<()> {
        tracing::info!("⏹️ stopping trigger service");
        self.jobs.lock().await.clear();
        {
            let mut scheduler = self.scheduler.write().await;
            scheduler.shutdown().await?;
        }
        Ok(())
    }

    /// Bring the registration for one workflow in line with its definition:
    /// register (or re-register) when it carries a schedule trigger node,
    /// stop any existing job when it does not. Called on save and update.
    pub async fn sync_workflow(&self, workflow: &Workflow) {
        match find_cron_expression(workflow) {
            Some(expression) => self.register(&workflow.id, &expression).await,
            None => self.stop(&workflow.id).await,
        }
    }

    /// Register a cron firing for a workflow; last write wins.
    ///
    /// An invalid cron expression is logged and leaves the workflow
    /// unregistered; it is never fatal to the caller.
    pub async fn register(&self, workflow_id: &str, expression: &str) {
        let mut jobs = self.jobs.lock().await;

        // Cancel the previous job first so two live jobs can never fire
        // the same workflow.
        if let Some(old_job) = jobs.remove(workflow_id) {
            let scheduler = self.scheduler.read().await;
            if let Err(err) = scheduler.remove(&old_job).await {
                tracing::warn!("⚠️ failed to remove old cron job for {}: {}", workflow_id, err);
            }
        }

        let schedule = normalize_cron(expression);
        let job = match self.build_job(workflow_id, &schedule) {
            Ok(job) => job,
            Err(err) => {
                tracing::warn!(
                    "⚠️ invalid cron expression for workflow {}: {:?} ({})",
                    workflow_id,
                    expression,
                    err
                );
                return;
            }
        };

        let job_id = {
            let scheduler = self.scheduler.write().await;
            match scheduler.add(job).await {
                Ok(uuid) => uuid,
                Err(err) => {
                    tracing::warn!("⚠️ failed to schedule workflow {}: {}", workflow_id, err);
                    return;
                }
            }
        };

        jobs.insert(workflow_id.to_string(), job_id);
        tracing::info!("⏰ scheduled workflow {} with cron {:?}", workflow_id, expression);
    }

    /// Cancel the scheduled job for a workflow; idempotent if absent.
    /// An in-flight firing that already dispatched runs to completion.
    pub async fn stop(&self, workflow_id: &str) {
        let mut jobs = self.jobs.lock().await;
        let Some(job_id) = jobs.remove(workflow_id) else {
            return;
        };
        let scheduler = self.scheduler.read().await;
        if let Err(err) = scheduler.remove(&job_id).await {
            tracing::warn!("⚠️ failed to remove cron job for {}: {}", workflow_id, err);
        } else {
            tracing::info!("🛑 stopped trigger for workflow {}", workflow_id);
        }
    }

    /// Number of live cron registrations.
    pub async fn active_jobs(&self) -> usize {
        self.jobs.lock().await.len()
    }

    /// Live job id for a workflow, if registered.
    pub async fn job_for(&self, workflow_id: &str) -> Option<Uuid> {
        self.jobs.lock().await.get(workflow_id).copied()
    }

    fn build_job(&self, workflow_id: &str, schedule: &str) -> Result<Job> {
        let workflow_id = workflow_id.to_string();
        let registry = Arc::clone(&self.registry);
        let dispatcher = Arc::clone(&self.dispatcher);
        let storage = self.storage.clone();
        let services = Arc::clone(&self.services);

        let job = Job::new_async(schedule, move |_uuid, _lock| {
            let workflow_id = workflow_id.clone();
            let registry = Arc::clone(&registry);
            let dispatcher = Arc::clone(&dispatcher);
            let storage = storage.clone();
            let services = Arc::clone(&services);

            Box::pin(async move {
                tracing::debug!("🔔 cron trigger fired for workflow {}", workflow_id);

                // Definition may have been deleted since scheduling; the
                // job then skips gracefully until it is cancelled.
                let Some(workflow) = registry.get(&workflow_id) else {
                    tracing::debug!("⏭️ skipping cron firing for deleted workflow {}", workflow_id);
                    return;
                };

                let outcome = dispatcher.run(&workflow, json!({}), services).await;
                if outcome.success {
                    tracing::info!("✅ cron-triggered workflow {} completed", workflow_id);
                } else {
                    // Caught at the firing boundary; the next tick fires
                    // regardless.
                    tracing::error!(
                        "❌ cron-triggered workflow {} failed: {}",
                        workflow_id,
                        outcome.error.as_deref().unwrap_or("unknown error")
                    );
                }

                if let Some(storage) = &storage {
                    if let Err(err) = storage.record_execution(&workflow_id, &outcome).await {
                        tracing::error!(
                            "failed to record execution for workflow {}: {}",
                            workflow_id,
                            err
                        );
                    }
                }
            })
        })?;

        Ok(job)
    }
}

/// Extract the cron expression from a workflow's schedule trigger node.
fn find_cron_expression(workflow: &Workflow) -> Option<String> {
    workflow.nodes.iter().find_map(|node| {
        let node_type = node.node_type.trim().to_lowercase();
        if !CRON_NODE_TYPES.contains(&node_type.as_str()) {
            return None;
        }
        node.config
            .get("expression")
            .or_else(|| node.config.get("schedule"))
            .and_then(serde_json::Value::as_str)
            .map(str::to_string)
    })
}

/// Accept standard five-field expressions by prepending a seconds field;
/// six/seven-field expressions pass through unchanged.
fn normalize_cron(expression: &str) -> String {
    let fields = expression.split_whitespace().count();
    if fields == 5 {
        format!("0 {}", expression.trim())
    } else {
        expression.trim().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connector::ConnectorRegistry;
    use crate::workflow::types::NodeSpec;
    use serde_json::json;

    async fn service() -> TriggerService {
        let registry = Arc::new(WorkflowRegistry::new());
        let dispatcher = Arc::new(Dispatcher::new(Arc::new(ConnectorRegistry::with_builtins())));
        TriggerService::new(registry, dispatcher, None, Arc::default())
            .await
            .unwrap()
    }

    fn cron_workflow(id: &str, expression: &str) -> Workflow {
        Workflow {
            id: id.to_string(),
            name: id.to_string(),
            nodes: vec![
                NodeSpec {
                    id: "trigger".to_string(),
                    node_type: "cron".to_string(),
                    config: json!({ "expression": expression }),
                },
                NodeSpec {
                    id: "n1".to_string(),
                    node_type: "print".to_string(),
                    config: json!({ "message": "tick" }),
                },
            ],
            edges: vec![],
        }
    }

    #[tokio::test]
    async fn re_registration_leaves_exactly_one_live_job() {
        // Register w1, then register again with a different expression;
        // the first job must be fully cancelled.
        let service = service().await;

        service.register("w1", "*/1 * * * *").await;
        let first = service.job_for("w1").await.unwrap();
        assert_eq!(service.active_jobs().await, 1);

        service.register("w1", "*/5 * * * *").await;
        let second = service.job_for("w1").await.unwrap();
        assert_eq!(service.active_jobs().await, 1);
        assert_ne!(first, second);
    }

    #[tokio::test]
    async fn invalid_expression_leaves_workflow_unregistered() {
        let service = service().await;
        service.register("w1", "not a cron line").await;
        assert_eq!(service.active_jobs().await, 0);
        assert!(service.job_for("w1").await.is_none());
    }

    #[tokio::test]
    async fn stop_is_idempotent() {
        let service = service().await;
        service.register("w1", "*/1 * * * *").await;
        service.stop("w1").await;
        service.stop("w1").await;
        assert_eq!(service.active_jobs().await, 0);
    }

    #[tokio::test]
    async fn sync_registers_and_unregisters_from_definition() {
        let service = service().await;

        let with_cron = cron_workflow("w1", "*/2 * * * *");
        service.sync_workflow(&with_cron).await;
        assert_eq!(service.active_jobs().await, 1);

        let mut without_cron = with_cron.clone();
        without_cron.nodes.remove(0);
        service.sync_workflow(&without_cron).await;
        assert_eq!(service.active_jobs().await, 0);
    }

    #[test]
    fn five_field_expressions_gain_a_seconds_field() {
        assert_eq!(normalize_cron("*/1 * * * *"), "0 */1 * * * *");
        assert_eq!(normalize_cron("0 */1 * * * *"), "0 */1 * * * *");
    }

    #[test]
    fn cron_expression_found_on_schedule_nodes() {
        let wf = cron_workflow("w1", "*/9 * * * *");
        assert_eq!(find_cron_expression(&wf).as_deref(), Some("*/9 * * * *"));

        let plain = Workflow {
            id: "w2".to_string(),
            name: "plain".to_string(),
            nodes: vec![NodeSpec {
                id: "n1".to_string(),
                node_type: "print".to_string(),
                config: json!({}),
            }],
            edges: vec![],
        };
        assert_eq!(find_cron_expression(&plain), None);
    }
}
