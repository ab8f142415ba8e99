//! Response DTOs
//!
//! Envelopes of frames received on the live and history topics. Decoding is
//! strict: a missing or mistyped field rejects the whole frame.

use serde::Deserialize;

use crate::domain::entities::{Message, PaginationCursor, Sender};
use crate::shared::error::ChatError;

/// Outer wrapper around every inbound payload
#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    pub body: T,
}

/// Sender identity as sent by the broker
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SenderPayload {
    pub sender_id: i64,
    pub sender_name: String,
    #[serde(default)]
    pub sender_image: Option<String>,
}

/// One chat message on the live topic or inside a history page
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessagePayload {
    pub sender: SenderPayload,
    pub content: String,
    pub time: String,
    pub message_id: i64,
}

impl From<MessagePayload> for Message {
    fn from(payload: MessagePayload) -> Self {
        Self {
            id: payload.message_id,
            content: payload.content,
            sender: Sender {
                id: payload.sender.sender_id,
                name: payload.sender.sender_name,
                image: payload.sender.sender_image,
            },
            time: payload.time,
        }
    }
}

/// History page reply on `/user/topic/history`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryPayload {
    pub messages: Vec<MessagePayload>,
    pub end: bool,
    pub last_msg_id: i64,
}

/// Decoded history page: older messages, oldest first, plus the new cursor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryPage {
    pub messages: Vec<Message>,
    pub cursor: PaginationCursor,
}

impl From<HistoryPayload> for HistoryPage {
    fn from(payload: HistoryPayload) -> Self {
        Self {
            messages: payload.messages.into_iter().map(Message::from).collect(),
            cursor: PaginationCursor::new(payload.last_msg_id, payload.end),
        }
    }
}

/// Decode a live-topic frame body.
pub fn decode_live(body: &str) -> Result<Message, ChatError> {
    let envelope: Envelope<MessagePayload> = serde_json::from_str(body)?;
    Ok(envelope.body.into())
}

/// Decode a history-topic frame body.
pub fn decode_history(body: &str) -> Result<HistoryPage, ChatError> {
    let envelope: Envelope<HistoryPayload> = serde_json::from_str(body)?;
    Ok(envelope.body.into())
}
