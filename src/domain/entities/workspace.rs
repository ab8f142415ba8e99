//! Workspace collaborators.
//!
//! The chat engine never computes workspace or membership data; it reads it
//! through these traits before connecting.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::shared::error::ChatError;

/// Workspace the chat channel belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceInfo {
    pub workspace_id: String,
}

/// A workspace member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    pub user_id: i64,
    #[serde(default)]
    pub name: Option<String>,
}

/// Workspace and membership lookup.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait WorkspaceDirectory: Send + Sync {
    /// Workspace of the current page.
    async fn workspace_info(&self) -> Result<WorkspaceInfo, ChatError>;

    /// Members of the workspace. The first entry is the current user.
    async fn members(&self) -> Result<Vec<Member>, ChatError>;
}

/// Access token accessor.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AccessTokenProvider: Send + Sync {
    async fn access_token(&self) -> Result<String, ChatError>;
}
