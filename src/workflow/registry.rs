//! Hot-reload workflow registry using ArcSwap.
//!
//! Lock-free, atomic updates to the in-memory definition map. Each save or
//! delete swaps the entire registry pointer, so concurrent runs and cron
//! firings keep reading a consistent snapshot while updates land.

use arc_swap::ArcSwap;
use std::{collections::HashMap, sync::Arc};

use crate::workflow::types::Workflow;

/// In-memory map of active workflow definitions, keyed by workflow id.
#[derive(Debug)]
pub struct WorkflowRegistry {
    workflows: ArcSwap<HashMap<String, Arc<Workflow>>>,
}

impl WorkflowRegistry {
    pub fn new() -> Self {
        Self {
            workflows: ArcSwap::new(Arc::new(HashMap::new())),
        }
    }

    /// Replace the whole registry; used at startup from storage.
    pub fn replace_all(&self, workflows: impl IntoIterator<Item = Workflow>) {
        let map: HashMap<String, Arc<Workflow>> = workflows
            .into_iter()
            .map(|wf| (wf.id.clone(), Arc::new(wf)))
            .collect();
        tracing::info!("initialized workflow registry with {} workflows", map.len());
        self.workflows.store(Arc::new(map));
    }

    /// Insert or update a single definition (clone-and-swap).
    pub fn upsert(&self, workflow: Workflow) {
        let current = self.workflows.load();
        let mut next = (**current).clone();
        next.insert(workflow.id.clone(), Arc::new(workflow));
        self.workflows.store(Arc::new(next));
    }

    /// Remove a definition; a no-op when absent.
    pub fn remove(&self, workflow_id: &str) {
        let current = self.workflows.load();
        if !current.contains_key(workflow_id) {
            return;
        }
        let mut next = (**current).clone();
        next.remove(workflow_id);
        self.workflows.store(Arc::new(next));
    }

    /// Lock-free read of one definition.
    pub fn get(&self, workflow_id: &str) -> Option<Arc<Workflow>> {
        self.workflows.load().get(workflow_id).cloned()
    }

    /// Snapshot of all definitions, for the startup trigger scan.
    pub fn all(&self) -> Vec<Arc<Workflow>> {
        self.workflows.load().values().cloned().collect()
    }
}

impl Default for WorkflowRegistry {
    fn default() -> Self {
        Self::new()
    }
}
