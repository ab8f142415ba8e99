//! Connection Manager
//!
//! Owns the single broker link of a chat session and tracks its lifecycle:
//!
//! ```text
//! Idle -> Connecting -> Connected -> (Reconnecting <-> Connected) -> Disconnected
//! ```

use std::time::Duration;

use tokio::sync::mpsc;

use crate::config::BrokerSettings;
use crate::domain::entities::{
    BrokerLink, ConnectTarget, Connector, CredentialHeader, LinkEvent,
};
use crate::infrastructure::metrics;
use crate::shared::error::ChatError;

/// Connection lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Idle,
    Connecting,
    Connected,
    Reconnecting,
    Disconnected,
}

impl ConnectionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Reconnecting => "reconnecting",
            Self::Disconnected => "disconnected",
        }
    }
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a link event means for the rest of the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    /// Broker session `session` is ready; subscriptions must be (re)created
    Ready { session: u64 },
    /// The connection went away; its subscriptions are gone
    Lost,
    Unchanged,
}

/// Link tuning that does not depend on the resolved identity.
#[derive(Debug, Clone)]
pub struct LinkOptions {
    pub host: Option<String>,
    pub reconnect_delay: Duration,
    pub heartbeat: (Duration, Duration),
}

impl Default for LinkOptions {
    fn default() -> Self {
        Self {
            host: None,
            reconnect_delay: Duration::from_millis(5000),
            heartbeat: (Duration::from_millis(10000), Duration::from_millis(10000)),
        }
    }
}

impl From<&BrokerSettings> for LinkOptions {
    fn from(broker: &BrokerSettings) -> Self {
        Self {
            host: broker.host.clone(),
            reconnect_delay: broker.reconnect_delay(),
            heartbeat: broker.heartbeat(),
        }
    }
}

/// Owner of the broker link.
pub struct ConnectionManager<C: Connector> {
    connector: C,
    options: LinkOptions,
    link: Option<C::Link>,
    state: ConnectionState,
    session: Option<u64>,
}

impl<C: Connector> ConnectionManager<C> {
    pub fn new(connector: C, options: LinkOptions) -> Self {
        Self {
            connector,
            options,
            link: None,
            state: ConnectionState::Idle,
            session: None,
        }
    }

    /// Start connecting to `endpoint` with `credential`.
    ///
    /// The credential must already be resolved; an empty one is rejected
    /// without dialing. Only one connection may be active at a time.
    pub fn connect(
        &mut self,
        endpoint: &str,
        credential: CredentialHeader,
    ) -> Result<mpsc::UnboundedReceiver<LinkEvent>, ChatError> {
        if credential.is_empty() {
            return Err(ChatError::Precondition(
                "credential must be resolved before connecting".into(),
            ));
        }
        if endpoint.trim().is_empty() {
            return Err(ChatError::Precondition("broker endpoint is empty".into()));
        }
        if self.link.is_some() {
            return Err(ChatError::Precondition(format!(
                "connection already {}",
                self.state
            )));
        }

        let target = ConnectTarget {
            endpoint: endpoint.to_string(),
            host: self.options.host.clone(),
            credential,
            reconnect_delay: self.options.reconnect_delay,
            heartbeat: self.options.heartbeat,
        };
        let (link, events) = self.connector.activate(target)?;

        self.link = Some(link);
        self.session = None;
        self.transition(ConnectionState::Connecting);
        Ok(events)
    }

    /// Apply a link event to the lifecycle.
    ///
    /// `Ready` is returned exactly once per broker session.
    pub fn on_event(&mut self, event: &LinkEvent) -> Lifecycle {
        if self.link.is_none() {
            return Lifecycle::Unchanged;
        }

        match event {
            LinkEvent::Connected { session } => {
                if self.session == Some(*session) {
                    tracing::debug!(session, "Duplicate CONNECTED ignored");
                    return Lifecycle::Unchanged;
                }
                self.session = Some(*session);
                self.transition(ConnectionState::Connected);
                Lifecycle::Ready { session: *session }
            }
            LinkEvent::Closed { reason } => {
                tracing::warn!(reason = %reason, "Connection closed, waiting for reconnect");
                let was_connected = self.state == ConnectionState::Connected;
                self.transition(ConnectionState::Reconnecting);
                if was_connected {
                    Lifecycle::Lost
                } else {
                    Lifecycle::Unchanged
                }
            }
            LinkEvent::BrokerError { message, body } => {
                metrics::record_broker_error();
                tracing::error!(message = %message, body = %body, "Broker reported an error");
                Lifecycle::Unchanged
            }
            LinkEvent::Deactivated => {
                let was_connected = self.state == ConnectionState::Connected;
                self.link = None;
                self.session = None;
                self.transition(ConnectionState::Disconnected);
                if was_connected {
                    Lifecycle::Lost
                } else {
                    Lifecycle::Unchanged
                }
            }
            LinkEvent::Message { .. } => Lifecycle::Unchanged,
        }
    }

    /// Tear the link down. Safe from any state.
    pub fn disconnect(&mut self) {
        match self.link.take() {
            Some(mut link) => {
                link.deactivate();
                self.session = None;
                self.transition(ConnectionState::Disconnected);
            }
            None => {
                tracing::trace!(state = %self.state, "Disconnect with no active connection");
            }
        }
    }

    /// The link, only while the broker session is ready.
    pub fn link(&self) -> Option<&C::Link> {
        match self.state {
            ConnectionState::Connected => self.link.as_ref(),
            _ => None,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn is_connected(&self) -> bool {
        self.link().is_some()
    }

    /// Current broker session number, if connected.
    pub fn session(&self) -> Option<u64> {
        self.link().and(self.session)
    }

    fn transition(&mut self, next: ConnectionState) {
        if self.state != next {
            tracing::debug!(from = %self.state, to = %next, "Connection state changed");
            self.state = next;
        }
    }
}
