//! Request DTOs
//!
//! Bodies of frames the client publishes.

use serde::Serialize;
use validator::Validate;

use crate::shared::validation::validate_not_blank;

/// Chat message for `/app/message/{workspaceId}`
#[derive(Debug, Clone, Serialize, Validate)]
pub struct SendMessageRequest {
    #[validate(
        length(min = 1, message = "Message must not be empty"),
        custom(function = "validate_not_blank")
    )]
    pub content: String,
}

/// History page request for `/app/history`
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryRequest {
    pub last_msg_id: i64,
}
