//! Client Error Types
//!
//! Centralized error handling for the chat engine.

use crate::infrastructure::stomp::FrameError;

/// Chat client error type
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Precondition failed: {0}")]
    Precondition(String),

    #[error("Not connected")]
    NotConnected,

    #[error("Transport error: {0}")]
    Transport(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("Frame error: {0}")]
    Frame(#[from] FrameError),

    #[error("Decode error: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Collaborator error: {0}")]
    Collaborator(String),
}

impl ChatError {
    /// Errors that a single frame or request can cause without
    /// affecting the rest of the session.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            ChatError::Frame(_)
                | ChatError::Decode(_)
                | ChatError::Validation(_)
                | ChatError::NotConnected
        )
    }
}

pub type Result<T, E = ChatError> = std::result::Result<T, E>;
