//! History Pager
//!
//! Requests older pages of messages, driven only by the pagination cursor.

use crate::application::dto::HistoryRequest;
use crate::domain::entities::{BrokerLink, Destination, PaginationCursor};

/// Cursor-driven history requests.
#[derive(Debug, Default)]
pub struct HistoryPager {
    cursor: PaginationCursor,
}

impl HistoryPager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask the broker for the page before `cursor_id`.
    ///
    /// Suppressed once the server has signaled the end of history, or when
    /// there is no ready link. Returns whether a request was published.
    pub fn request_history<L: BrokerLink>(&self, link: Option<&L>, cursor_id: i64) -> bool {
        if self.cursor.end {
            tracing::debug!(cursor_id, "History exhausted, request suppressed");
            return false;
        }
        let Some(link) = link else {
            tracing::debug!(cursor_id, "No active connection, history request dropped");
            return false;
        };

        let destination = Destination::History;
        let body = match serde_json::to_string(&HistoryRequest {
            last_msg_id: cursor_id,
        }) {
            Ok(body) => body,
            Err(e) => {
                tracing::error!(error = %e, "Failed to encode history request");
                return false;
            }
        };

        match link.publish(&destination.path(), body) {
            Ok(()) => {
                tracing::debug!(cursor_id, "History page requested");
                true
            }
            Err(e) => {
                tracing::warn!(error = %e, cursor_id, "History request not sent");
                false
            }
        }
    }

    /// Request the page before the current cursor.
    pub fn request_older<L: BrokerLink>(&self, link: Option<&L>) -> bool {
        self.request_history(link, self.cursor.last_msg_id)
    }

    /// Overwrite the cursor with the one carried by a history page.
    pub fn update_cursor(&mut self, last_msg_id: i64, end: bool) {
        self.cursor = PaginationCursor::new(last_msg_id, end);
    }

    pub fn cursor(&self) -> PaginationCursor {
        self.cursor
    }

    /// Back to the initial cursor, before a resync.
    pub fn reset(&mut self) {
        self.cursor = PaginationCursor::default();
    }
}
