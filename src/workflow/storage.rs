//! SQLite persistence for workflow documents and execution records.
//!
//! Workflows are stored as a JSON column for flexibility while keeping
//! indexed lookup fields. Execution records are append-only: one row per
//! run, keyed by workflow id and timestamp, never updated.

use anyhow::Result;
use sqlx::{sqlite::SqlitePool, Row};
use std::collections::HashMap;
use uuid::Uuid;

use crate::workflow::types::{RunOutcome, Workflow};

/// SQLite-backed storage for workflows and their execution history.
#[derive(Debug, Clone)]
pub struct WorkflowStorage {
    pool: SqlitePool,
}

impl WorkflowStorage {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create tables and indexes. Safe to call repeatedly.
    pub async fn init_schema(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS workflows (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                definition JSON NOT NULL,
                created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS executions (
                id TEXT PRIMARY KEY,
                workflow_id TEXT NOT NULL,
                success INTEGER NOT NULL,
                outcome JSON NOT NULL,
                started_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_executions_workflow
            ON executions(workflow_id, started_at)
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Store a new workflow or update an existing one (UPSERT).
    pub async fn save_workflow(&self, workflow: &Workflow) -> Result<()> {
        let definition_json = serde_json::to_string(workflow)?;

        sqlx::query(
            r#"
            INSERT INTO workflows (id, name, definition, updated_at)
            VALUES (?, ?, ?, CURRENT_TIMESTAMP)
            ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                definition = excluded.definition,
                updated_at = CURRENT_TIMESTAMP
            "#,
        )
        .bind(&workflow.id)
        .bind(&workflow.name)
        .bind(&definition_json)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Retrieve a workflow by id.
    pub async fn get_workflow(&self, id: &str) -> Result<Option<Workflow>> {
        let row = sqlx::query("SELECT definition FROM workflows WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => {
                let definition_json: String = row.get("definition");
                let workflow: Workflow = serde_json::from_str(&definition_json)?;
                Ok(Some(workflow))
            }
            None => Ok(None),
        }
    }

    /// List workflow metadata, newest first.
    pub async fn list_workflows(&self) -> Result<Vec<WorkflowMetadata>> {
        let rows = sqlx::query(
            "SELECT id, name, created_at, updated_at FROM workflows ORDER BY updated_at DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut workflows = Vec::new();
        for row in rows {
            workflows.push(WorkflowMetadata {
                id: row.get("id"),
                name: row.get("name"),
                created_at: row.get("created_at"),
                updated_at: row.get("updated_at"),
            });
        }

        Ok(workflows)
    }

    /// Load every stored workflow, keyed by id. Used during startup for the
    /// registry and the trigger scan.
    pub async fn load_all_workflows(&self) -> Result<HashMap<String, Workflow>> {
        let rows = sqlx::query("SELECT id, definition FROM workflows")
            .fetch_all(&self.pool)
            .await?;

        let mut workflows = HashMap::new();
        for row in rows {
            let id: String = row.get("id");
            let definition_json: String = row.get("definition");
            let workflow: Workflow = serde_json::from_str(&definition_json)?;
            workflows.insert(id, workflow);
        }

        Ok(workflows)
    }

    /// Delete a workflow; returns whether anything was removed.
    pub async fn delete_workflow(&self, id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM workflows WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Append an immutable execution record for a finished run.
    pub async fn record_execution(&self, workflow_id: &str, outcome: &RunOutcome) -> Result<()> {
        let outcome_json = serde_json::to_string(outcome)?;

        sqlx::query(
            r#"
            INSERT INTO executions (id, workflow_id, success, outcome)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(workflow_id)
        .bind(outcome.success)
        .bind(&outcome_json)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Recent execution records for a workflow, newest first.
    pub async fn list_executions(&self, workflow_id: &str, limit: i64) -> Result<Vec<ExecutionRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT id, success, outcome, started_at FROM executions
            WHERE workflow_id = ?
            ORDER BY started_at DESC
            LIMIT ?
            "#,
        )
        .bind(workflow_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        let mut records = Vec::new();
        for row in rows {
            let outcome_json: String = row.get("outcome");
            records.push(ExecutionRecord {
                id: row.get("id"),
                workflow_id: workflow_id.to_string(),
                success: row.get("success"),
                outcome: serde_json::from_str(&outcome_json)?,
                started_at: row.get("started_at"),
            });
        }

        Ok(records)
    }
}

/// Basic workflow metadata for listing operations.
#[derive(Debug, serde::Serialize)]
pub struct WorkflowMetadata {
    pub id: String,
    pub name: String,
    pub created_at: String,
    pub updated_at: String,
}

/// One stored execution record.
#[derive(Debug, serde::Serialize)]
pub struct ExecutionRecord {
    pub id: String,
    pub workflow_id: String,
    pub success: bool,
    pub outcome: RunOutcome,
    pub started_at: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::types::NodeSpec;
    use indexmap::IndexMap;
    use serde_json::json;

    async fn storage() -> WorkflowStorage {
        // One connection so every query sees the same in-memory database
        let pool = sqlx::sqlite::SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        let storage = WorkflowStorage::new(pool);
        storage.init_schema().await.unwrap();
        storage
    }

    fn workflow(id: &str) -> Workflow {
        Workflow {
            id: id.to_string(),
            name: format!("workflow {id}"),
            nodes: vec![NodeSpec {
                id: "n1".to_string(),
                node_type: "print".to_string(),
                config: json!({ "message": "hi" }),
            }],
            edges: vec![],
        }
    }

    #[tokio::test]
    async fn save_and_load_round_trip() {
        let storage = storage().await;
        let wf = workflow("w1");
        storage.save_workflow(&wf).await.unwrap();

        let loaded = storage.get_workflow("w1").await.unwrap().unwrap();
        assert_eq!(loaded, wf);
        assert!(storage.get_workflow("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn save_is_an_upsert() {
        let storage = storage().await;
        storage.save_workflow(&workflow("w1")).await.unwrap();

        let mut updated = workflow("w1");
        updated.name = "renamed".to_string();
        storage.save_workflow(&updated).await.unwrap();

        let loaded = storage.get_workflow("w1").await.unwrap().unwrap();
        assert_eq!(loaded.name, "renamed");
        assert_eq!(storage.list_workflows().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn delete_reports_whether_anything_was_removed() {
        let storage = storage().await;
        storage.save_workflow(&workflow("w1")).await.unwrap();
        assert!(storage.delete_workflow("w1").await.unwrap());
        assert!(!storage.delete_workflow("w1").await.unwrap());
    }

    #[tokio::test]
    async fn execution_records_append_and_list() {
        let storage = storage().await;
        storage.save_workflow(&workflow("w1")).await.unwrap();

        let mut results = IndexMap::new();
        results.insert("n1".to_string(), json!("hi"));
        let outcome = RunOutcome {
            success: true,
            results,
            logs: vec![],
            error: None,
        };
        storage.record_execution("w1", &outcome).await.unwrap();
        storage.record_execution("w1", &outcome).await.unwrap();

        let records = storage.list_executions("w1", 10).await.unwrap();
        assert_eq!(records.len(), 2);
        assert!(records[0].success);
        assert_eq!(records[0].outcome.results.get("n1"), Some(&json!("hi")));
    }

    #[tokio::test]
    async fn execution_listing_honors_the_limit() {
        let storage = storage().await;
        storage.save_workflow(&workflow("w1")).await.unwrap();

        let outcome = RunOutcome {
            success: true,
            results: IndexMap::new(),
            logs: vec![],
            error: None,
        };
        for _ in 0..3 {
            storage.record_execution("w1", &outcome).await.unwrap();
        }

        let records = storage.list_executions("w1", 1).await.unwrap();
        assert_eq!(records.len(), 1);
    }
}
