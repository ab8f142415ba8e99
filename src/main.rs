//! # Workspace Chat
//!
//! Console client for a workspace chat channel over STOMP/WebSocket.
//!
//! This is the application entry point that initializes:
//! - Configuration loading
//! - Tracing/logging subsystem
//! - Chat session and broker link
//! - Console front-end

use anyhow::Result;
use tracing::info;

use workspace_chat::config::Settings;
use workspace_chat::startup::Application;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration from environment and config files
    let settings = Settings::load()?;

    // Initialize tracing subscriber for structured logging
    workspace_chat::telemetry::init_tracing(&settings.log);

    info!(
        broker = %settings.broker.url,
        workspace_id = %settings.identity.workspace_id,
        environment = %settings.environment,
        "Configuration loaded"
    );

    // Build and run the application
    let application = Application::build(settings).await?;

    info!("Chat session started");
    application.run_until_stopped().await?;

    Ok(())
}
