/// Wireflow: workflow execution engine
///
/// Main entry point for the Wireflow server. Initializes configuration and
/// starts the HTTP server with workflow management and trigger capabilities.

use wireflow::{config::Config, server::start_server};

/// Application entry point
///
/// The server provides:
/// - Workflow management API at /api/workflows/*
/// - Webhook triggering at /hooks/{workflow_id}
/// - Health check at /healthz
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration (defaults to 0.0.0.0:3000 and a local SQLite file)
    let config = Config::default();

    start_server(config).await?;

    Ok(())
}
