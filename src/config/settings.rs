//! Application settings and configuration structures.

use std::time::Duration;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

/// Root configuration structure containing all application settings.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Broker connection configuration
    pub broker: BrokerSettings,

    /// Identity supplied to the chat engine (token, workspace, user)
    pub identity: IdentitySettings,

    /// Logging configuration
    pub log: LogSettings,

    /// Current environment (development, staging, production)
    pub environment: String,
}

/// STOMP broker configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct BrokerSettings {
    /// WebSocket endpoint (e.g., "ws://localhost:8080/ws-chat")
    pub url: String,

    /// Virtual host for the CONNECT frame (defaults to the URL host)
    pub host: Option<String>,

    /// Fixed delay between reconnect attempts in milliseconds; 0 disables
    pub reconnect_delay_ms: u64,

    /// Outgoing heart-beat offer in milliseconds; 0 disables
    pub heartbeat_outgoing_ms: u64,

    /// Incoming heart-beat request in milliseconds; 0 disables
    pub heartbeat_incoming_ms: u64,
}

/// Static identity for the external collaborators.
#[derive(Debug, Clone, Deserialize)]
pub struct IdentitySettings {
    /// Opaque access token sent as `Authorization`
    pub access_token: String,

    /// Workspace whose channel to join
    pub workspace_id: String,

    /// Current user's member ID
    pub user_id: i64,

    /// Current user's display name
    pub user_name: String,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LogSettings {
    /// Output format: "pretty" or "json"
    pub format: String,
}

impl Settings {
    /// Load settings from environment variables and configuration files.
    ///
    /// The loading order is:
    /// 1. config/default.toml (base configuration)
    /// 2. config/{RUN_ENV}.toml (environment-specific overrides)
    /// 3. Environment variables (highest priority)
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if configuration cannot be loaded or parsed,
    /// or if the broker URL is not a WebSocket URL.
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        // Determine the running environment
        let environment = std::env::var("RUN_ENV").unwrap_or_else(|_| "development".into());

        Config::builder()
            // Start with default values
            .set_default("environment", environment.clone())?
            .set_default("broker.url", "ws://localhost:8080/ws-chat")?
            .set_default("broker.reconnect_delay_ms", 5000_i64)?
            .set_default("broker.heartbeat_outgoing_ms", 10000_i64)?
            .set_default("broker.heartbeat_incoming_ms", 10000_i64)?
            .set_default("identity.access_token", "")?
            .set_default("identity.workspace_id", "")?
            .set_default("identity.user_id", 0_i64)?
            .set_default("identity.user_name", "me")?
            .set_default("log.format", "pretty")?
            // Load from config files
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // Load from environment variables
            // APP__BROKER__URL=ws://... -> broker.url
            .add_source(
                Environment::default()
                    .prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            // Map simple environment variables
            .set_override_option("broker.url", std::env::var("BROKER_URL").ok())?
            .set_override_option("identity.access_token", std::env::var("ACCESS_TOKEN").ok())?
            .set_override_option("identity.workspace_id", std::env::var("WORKSPACE_ID").ok())?
            .set_override_option("identity.user_id", std::env::var("USER_ID").ok())?
            .build()?
            .try_deserialize()
            .and_then(|settings: Self| {
                settings.broker.validate()?;
                Ok(settings)
            })
    }
}

impl BrokerSettings {
    /// Reject URLs the WebSocket transport cannot dial.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.url.starts_with("ws://") && !self.url.starts_with("wss://") {
            return Err(ConfigError::Message(format!(
                "broker.url must start with ws:// or wss://, got {}",
                self.url
            )));
        }
        Ok(())
    }

    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_ms)
    }

    /// Heart-beat offer as (outgoing, incoming).
    pub fn heartbeat(&self) -> (Duration, Duration) {
        (
            Duration::from_millis(self.heartbeat_outgoing_ms),
            Duration::from_millis(self.heartbeat_incoming_ms),
        )
    }
}

impl Default for BrokerSettings {
    fn default() -> Self {
        Self {
            url: "ws://localhost:8080/ws-chat".to_string(),
            host: None,
            reconnect_delay_ms: 5000,
            heartbeat_outgoing_ms: 10000,
            heartbeat_incoming_ms: 10000,
        }
    }
}

impl LogSettings {
    pub fn is_json(&self) -> bool {
        self.format.eq_ignore_ascii_case("json")
    }
}
