//! Message entity.
//!
//! One chat utterance as delivered by the broker on the live or history feed.

use chrono::{DateTime, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Identity of the member who authored a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sender {
    /// Member/user ID
    pub id: i64,

    /// Display name
    pub name: String,

    /// Avatar reference (URL or asset key)
    pub image: Option<String>,
}

/// Represents a message in the workspace channel.
///
/// `id` is assigned by the broker and increases monotonically within a
/// workspace, so it doubles as the pagination cursor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Server-assigned message ID
    pub id: i64,

    /// Message text
    pub content: String,

    /// Author identity
    pub sender: Sender,

    /// Wall-clock time as sent by the broker
    pub time: String,
}

impl Message {
    /// Render the timestamp as `HH:MM`.
    ///
    /// Accepts RFC 3339 and naive ISO-8601 timestamps. Anything else falls
    /// back to the `HH:MM` slice of an ISO-shaped string, or the raw value.
    pub fn display_time(&self) -> String {
        if let Ok(parsed) = DateTime::parse_from_rfc3339(&self.time) {
            return parsed.format("%H:%M").to_string();
        }
        if let Ok(parsed) = NaiveDateTime::parse_from_str(&self.time, "%Y-%m-%dT%H:%M:%S%.f") {
            return parsed.format("%H:%M").to_string();
        }
        self.time
            .get(11..16)
            .map(str::to_string)
            .unwrap_or_else(|| self.time.clone())
    }

    /// Classify the message from the point of view of `current_user_id`.
    pub fn kind_for(&self, current_user_id: i64) -> MessageKind {
        if self.sender.id == current_user_id {
            MessageKind::Send
        } else {
            MessageKind::Receive
        }
    }
}

/// Direction of a message relative to the current user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    /// Authored by the current user
    Send,
    /// Authored by another member
    Receive,
}

impl MessageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Send => "send",
            Self::Receive => "receive",
        }
    }
}

impl std::fmt::Display for MessageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Read-only projection of a stored message for presentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageView<'a> {
    pub message: &'a Message,
    pub kind: MessageKind,
}
