/// HTTP API Layer
///
/// REST endpoints for workflow management plus the webhook trigger surface:
/// - Workflow CRUD with hot-reload into the registry
/// - Synchronous runs and execution history
/// - Fire-and-forget webhook triggering

// Workflow management endpoints (POST/GET/PUT/DELETE/run/executions)
pub mod workflows;

// Webhook trigger endpoints
pub mod hooks;

// Re-export router builders
pub use hooks::create_hook_routes;
pub use workflows::create_workflow_routes;
