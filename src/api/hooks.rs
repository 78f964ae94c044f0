/// Webhook trigger endpoints
///
/// One catch-all route fires workflows from inbound HTTP requests. The
/// request is acknowledged immediately and the run happens in a spawned
/// task; a failed run is logged and recorded, never reported to the caller.

use crate::api::workflows::AppState;
use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::Json,
    routing::any,
    Router,
};
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::sync::Arc;

/// Create webhook trigger routes
pub fn create_hook_routes() -> Router<AppState> {
    Router::new().route("/hooks/{workflow_id}", any(trigger_workflow))
}

/// Fire a workflow from an inbound HTTP request
///
/// ANY /hooks/{workflow_id}
/// The triggering payload handed to the workflow is
/// { "body": ..., "query": {...}, "headers": {...} }.
async fn trigger_workflow(
    State(state): State<AppState>,
    Path(workflow_id): Path<String>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
    body: String,
) -> Result<Json<Value>, StatusCode> {
    tracing::info!("📥 Webhook request received for workflow: {}", workflow_id);

    let Some(workflow) = state.registry.get(&workflow_id) else {
        tracing::warn!("❌ Webhook called for unknown workflow: {}", workflow_id);
        return Err(StatusCode::NOT_FOUND);
    };

    let input = json!({
        "body": parse_body(&body),
        "query": query,
        "headers": header_map_json(&headers),
    });

    // Fire and forget: ack now, run in the background
    let dispatcher = Arc::clone(&state.dispatcher);
    let services = Arc::clone(&state.services);
    let storage = state.storage.clone();
    tokio::spawn(async move {
        let outcome = dispatcher.run(&workflow, input, services).await;
        if outcome.success {
            tracing::info!("✅ Webhook-triggered workflow {} completed", workflow.id);
        } else {
            tracing::error!(
                "❌ Webhook-triggered workflow {} failed: {}",
                workflow.id,
                outcome.error.as_deref().unwrap_or("unknown error")
            );
        }
        if let Err(e) = storage.record_execution(&workflow.id, &outcome).await {
            tracing::error!("Failed to record execution for workflow {}: {}", workflow.id, e);
        }
    });

    Ok(Json(json!({ "success": true, "message": "Workflow triggered" })))
}

/// Parse the raw body leniently: JSON when it is JSON, a plain string
/// otherwise, null when empty.
fn parse_body(body: &str) -> Value {
    if body.is_empty() {
        return Value::Null;
    }
    serde_json::from_str(body).unwrap_or_else(|_| Value::String(body.to_string()))
}

fn header_map_json(headers: &HeaderMap) -> Value {
    let mut map = Map::new();
    for (name, value) in headers {
        if let Ok(value) = value.to_str() {
            map.insert(name.as_str().to_string(), Value::String(value.to_string()));
        }
    }
    Value::Object(map)
}
