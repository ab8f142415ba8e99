//! Pagination cursor for backward history loading.

use serde::{Deserialize, Serialize};

/// How far back history has been loaded.
///
/// `last_msg_id == 0` means no history page has arrived yet; the broker
/// treats a request for id 0 as "start from the latest message".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationCursor {
    /// Oldest message ID currently loaded
    pub last_msg_id: i64,

    /// Broker reported there is nothing older
    pub end: bool,
}

impl PaginationCursor {
    pub fn new(last_msg_id: i64, end: bool) -> Self {
        Self { last_msg_id, end }
    }

    /// Whether another page may still be requested.
    pub fn has_more(&self) -> bool {
        !self.end
    }
}
