//! Broker addressing and the link contract.
//!
//! Topics and destinations are the broker paths the chat engine talks to.
//! `BrokerLink` and `Connector` are implemented by the transport in the
//! infrastructure layer and by recording fakes in tests.

use std::time::Duration;

use tokio::sync::mpsc;

use crate::shared::error::ChatError;

/// Inbound topic the client subscribes to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Topic {
    /// Broadcast feed of new messages for a workspace
    Live { workspace_id: String },
    /// Private per-connection reply channel for history pages
    History,
}

impl Topic {
    pub fn path(&self) -> String {
        match self {
            Topic::Live { workspace_id } => format!("/topic/message/{}", workspace_id),
            Topic::History => "/user/topic/history".to_string(),
        }
    }
}

/// Outbound application destination the client publishes to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
    /// Post a chat message to a workspace
    Message { workspace_id: String },
    /// Ask for a page of older messages
    History,
}

impl Destination {
    pub fn path(&self) -> String {
        match self {
            Destination::Message { workspace_id } => format!("/app/message/{}", workspace_id),
            Destination::History => "/app/history".to_string(),
        }
    }
}

/// Opaque `Authorization` credential supplied by the auth collaborator.
#[derive(Clone, PartialEq, Eq)]
pub struct CredentialHeader {
    token: String,
}

impl CredentialHeader {
    pub const NAME: &'static str = "Authorization";

    pub fn new(token: impl Into<String>) -> Self {
        Self { token: token.into() }
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn is_empty(&self) -> bool {
        self.token.trim().is_empty()
    }

    /// Header pair as attached to CONNECT and SUBSCRIBE frames.
    pub fn to_header(&self) -> (String, String) {
        (Self::NAME.to_string(), self.token.clone())
    }
}

impl std::fmt::Debug for CredentialHeader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialHeader")
            .field("token", &"<redacted>")
            .finish()
    }
}

/// Subscription identifier, unique per connection.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SubscriptionId(String);

impl SubscriptionId {
    /// Build an id scoped to one broker session.
    pub fn scoped(session: u64, sequence: u64) -> Self {
        Self(format!("sub-{}-{}", session, sequence))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SubscriptionId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for SubscriptionId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl std::fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Events delivered by a link, in arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkEvent {
    /// Broker accepted the connection; `session` increases on every reconnect
    Connected { session: u64 },
    /// A frame arrived on a subscription
    Message {
        subscription: SubscriptionId,
        destination: String,
        body: String,
    },
    /// Broker sent an ERROR frame
    BrokerError { message: String, body: String },
    /// Socket lost; the link retries after its reconnect delay
    Closed { reason: String },
    /// Link stopped for good and will not reconnect
    Deactivated,
}

/// Everything a link needs to reach the broker.
#[derive(Debug, Clone)]
pub struct ConnectTarget {
    /// WebSocket endpoint (`ws://` or `wss://`)
    pub endpoint: String,
    /// Virtual host sent in the CONNECT frame
    pub host: Option<String>,
    pub credential: CredentialHeader,
    /// Fixed delay between reconnect attempts; zero disables reconnecting
    pub reconnect_delay: Duration,
    /// Client heart-beat offer (outgoing, incoming)
    pub heartbeat: (Duration, Duration),
}

/// Handle to an active broker connection.
///
/// Calls never block: frames are queued for the transport task. A link
/// only accepts work while its connection is up; frames queued while the
/// socket is down are dropped by the transport.
pub trait BrokerLink {
    /// Subscribe `id` to `topic`, attaching `headers` to the SUBSCRIBE frame.
    fn subscribe(
        &self,
        id: &SubscriptionId,
        topic: &str,
        headers: &[(String, String)],
    ) -> Result<(), ChatError>;

    /// Publish a JSON `body` to `destination`.
    fn publish(&self, destination: &str, body: String) -> Result<(), ChatError>;

    /// Stop the connection. Safe to call more than once.
    fn deactivate(&mut self);
}

/// Factory for links.
pub trait Connector {
    type Link: BrokerLink;

    /// Start connecting to `target`. Events arrive on the returned receiver.
    fn activate(
        &self,
        target: ConnectTarget,
    ) -> Result<(Self::Link, mpsc::UnboundedReceiver<LinkEvent>), ChatError>;
}
