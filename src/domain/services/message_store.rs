//! Ordered message store.

use std::collections::VecDeque;

use crate::domain::entities::{Message, MessageView};

/// Ordered sequence of messages, oldest first.
///
/// Live messages are appended in arrival order and history pages are
/// prepended as one contiguous older block. Ordering is never recomputed
/// from message ids: the transport delivers each subscription in order.
#[derive(Debug, Default, Clone)]
pub struct MessageStore {
    messages: VecDeque<Message>,
}

impl MessageStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a live message at the tail.
    pub fn append(&mut self, message: Message) {
        if let Some(newest) = self.messages.back() {
            if message.id <= newest.id {
                tracing::debug!(
                    message_id = message.id,
                    newest_id = newest.id,
                    "Live message id not above newest stored id"
                );
            }
        }
        self.messages.push_back(message);
    }

    /// Add an ordered block of older messages at the head, keeping the
    /// block's relative order.
    pub fn prepend_batch(&mut self, batch: Vec<Message>) {
        if let (Some(block_newest), Some(oldest)) = (batch.last(), self.messages.front()) {
            if block_newest.id >= oldest.id {
                tracing::debug!(
                    block_newest_id = block_newest.id,
                    oldest_id = oldest.id,
                    "History block overlaps loaded messages"
                );
            }
        }
        for message in batch.into_iter().rev() {
            self.messages.push_front(message);
        }
    }

    /// Drop every message.
    pub fn clear(&mut self) {
        self.messages.clear();
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Messages, oldest first.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Message> + ExactSizeIterator {
        self.messages.iter()
    }

    /// Oldest loaded message.
    pub fn oldest(&self) -> Option<&Message> {
        self.messages.front()
    }

    /// Newest loaded message.
    pub fn newest(&self) -> Option<&Message> {
        self.messages.back()
    }

    /// Messages with their send/receive classification for `current_user_id`.
    pub fn views(&self, current_user_id: i64) -> Vec<MessageView<'_>> {
        self.messages
            .iter()
            .map(|message| MessageView {
                message,
                kind: message.kind_for(current_user_id),
            })
            .collect()
    }

    /// Owned copy of the sequence.
    pub fn to_vec(&self) -> Vec<Message> {
        self.messages.iter().cloned().collect()
    }
}
