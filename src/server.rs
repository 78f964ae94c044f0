/// Server setup and initialization
///
/// Wires together all components: storage, registry, connectors, dispatcher,
/// trigger service, and HTTP routes. Provides the main application factory
/// function for creating the Axum app.

use crate::{
    api::{create_hook_routes, create_workflow_routes, workflows::AppState},
    config::Config,
    connector::ConnectorRegistry,
    runtime::{Dispatcher, TriggerService},
    services::Services,
    workflow::{registry::WorkflowRegistry, storage::WorkflowStorage},
};
use anyhow::Result;
use axum::{routing::get, Router};
use sqlx::SqlitePool;
use std::sync::Arc;
use tokio::net::TcpListener;

/// Create the main Axum application with all routes wired together
pub async fn create_app(config: Config) -> Result<Router> {
    tracing::info!("📋 Connecting workflow storage: {}", config.database.url);
    let pool = SqlitePool::connect(&config.database.url).await?;
    let storage = WorkflowStorage::new(pool);
    storage.init_schema().await?;

    tracing::info!("📥 Loading existing workflows from storage");
    let registry = Arc::new(WorkflowRegistry::new());
    registry.replace_all(storage.load_all_workflows().await?.into_values());

    tracing::info!("🔌 Registering built-in connectors");
    let connectors = Arc::new(ConnectorRegistry::with_builtins());
    let connector_ids: Vec<&str> = connectors.list().iter().map(|c| c.id()).collect();
    tracing::debug!("Available connectors: {:?}", connector_ids);

    let services = Arc::new(Services::default());
    let dispatcher = Arc::new(Dispatcher::new(Arc::clone(&connectors)));

    tracing::info!("⏰ Initializing trigger service");
    let triggers = Arc::new(
        TriggerService::new(
            Arc::clone(&registry),
            Arc::clone(&dispatcher),
            Some(storage.clone()),
            Arc::clone(&services),
        )
        .await?,
    );

    // Start cron firings in the background
    let trigger_handle = Arc::clone(&triggers);
    tokio::spawn(async move {
        if let Err(e) = trigger_handle.start().await {
            tracing::error!("❌ Failed to start trigger service: {}", e);
        }
    });

    let app_state = AppState {
        storage,
        registry,
        triggers,
        dispatcher,
        services,
    };

    tracing::info!("📡 Creating HTTP router with all endpoints");
    let app = Router::new()
        .route("/healthz", get(health_check))
        .merge(create_workflow_routes().with_state(app_state.clone()))
        .merge(create_hook_routes().with_state(app_state));

    tracing::info!("✅ Application initialized successfully");

    Ok(app)
}

/// Start the HTTP server with the given configuration
pub async fn start_server(config: Config) -> Result<()> {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_thread_ids(true)
        .with_level(true)
        .init();

    tracing::info!("Starting Wireflow server...");

    let app = create_app(config.clone()).await?;

    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&bind_addr).await?;

    tracing::info!("Server listening on http://{}", bind_addr);

    axum::serve(listener, app.into_make_service()).await?;

    Ok(())
}

/// Health check endpoint handler
async fn health_check() -> &'static str {
    "ok"
}
