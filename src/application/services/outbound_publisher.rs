//! Outbound Publisher
//!
//! Holds the composer input and publishes user-authored messages. Nothing is
//! appended locally; the sender sees its own message when the live feed
//! echoes it back.

use validator::Validate;

use crate::application::dto::SendMessageRequest;
use crate::domain::entities::{BrokerLink, Destination};
use crate::shared::validation::validation_error;

/// Key of a composer key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Enter,
    Char(char),
    Other,
}

/// A key press in the composer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyPress {
    pub key: Key,
    pub shift: bool,
    /// An input-method composition is in progress
    pub composing: bool,
}

impl KeyPress {
    pub fn new(key: Key) -> Self {
        Self {
            key,
            shift: false,
            composing: false,
        }
    }

    pub fn with_shift(mut self) -> Self {
        self.shift = true;
        self
    }

    pub fn composing(mut self) -> Self {
        self.composing = true;
        self
    }

    fn submits(&self) -> bool {
        self.key == Key::Enter && !self.shift && !self.composing
    }
}

/// Result of handling a key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOutcome {
    /// Enter triggered a send attempt; `sent` tells whether it was published
    Submitted { sent: bool },
    /// Ordinary editing, left to the input widget
    PassThrough,
}

/// Composer state and message publishing.
#[derive(Debug, Default)]
pub struct OutboundPublisher {
    input: String,
}

impl OutboundPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn set_input(&mut self, input: impl Into<String>) {
        self.input = input.into();
    }

    /// Publish the current input to the workspace.
    ///
    /// Blank input or a missing link is rejected without a network call and
    /// leaves the input untouched. The input clears only after a publish.
    pub fn send<L: BrokerLink>(&mut self, link: Option<&L>, workspace_id: &str) -> bool {
        let request = SendMessageRequest {
            content: self.input.clone(),
        };
        if let Err(e) = request.validate() {
            tracing::debug!(error = %validation_error(e), "Outbound message rejected");
            return false;
        }
        let Some(link) = link else {
            tracing::debug!("No active connection, outbound message rejected");
            return false;
        };

        let body = match serde_json::to_string(&request) {
            Ok(body) => body,
            Err(e) => {
                tracing::error!(error = %e, "Failed to encode outbound message");
                return false;
            }
        };
        let destination = Destination::Message {
            workspace_id: workspace_id.to_string(),
        };

        match link.publish(&destination.path(), body) {
            Ok(()) => {
                self.input.clear();
                true
            }
            Err(e) => {
                tracing::warn!(error = %e, "Outbound message not sent");
                false
            }
        }
    }

    /// Enter without Shift and outside composition sends; anything else is
    /// passed through.
    pub fn handle_key<L: BrokerLink>(
        &mut self,
        press: KeyPress,
        link: Option<&L>,
        workspace_id: &str,
    ) -> KeyOutcome {
        if press.submits() {
            KeyOutcome::Submitted {
                sent: self.send(link, workspace_id),
            }
        } else {
            KeyOutcome::PassThrough
        }
    }
}
