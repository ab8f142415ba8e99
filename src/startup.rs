//! Application Startup
//!
//! Resolves the chat identity, opens the broker link and hands the session
//! to the console front-end.

use anyhow::Result;
use tokio::sync::mpsc;

use crate::application::services::{ChatSession, LinkOptions};
use crate::config::Settings;
use crate::domain::entities::LinkEvent;
use crate::infrastructure::directory::ConfiguredDirectory;
use crate::infrastructure::stomp::StompConnector;
use crate::presentation::console;

/// Application instance
pub struct Application {
    session: ChatSession<StompConnector>,
    events: mpsc::UnboundedReceiver<LinkEvent>,
}

impl Application {
    /// Build the application from settings
    pub async fn build(settings: Settings) -> Result<Self> {
        let directory = ConfiguredDirectory::new(settings.identity.clone());

        let (session, events) = ChatSession::start(
            StompConnector::new(),
            LinkOptions::from(&settings.broker),
            &settings.broker.url,
            &directory,
            &directory,
        )
        .await?;
        tracing::info!(endpoint = %settings.broker.url, "Connecting to broker");

        Ok(Self { session, events })
    }

    /// Run the chat console until the user leaves
    pub async fn run_until_stopped(self) -> Result<()> {
        console::run(self.session, self.events).await?;
        Ok(())
    }
}
