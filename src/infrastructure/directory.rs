//! Configuration-backed workspace collaborators.
//!
//! Supplies workspace id, membership and access token from settings so the
//! console client can run without the web application's HTTP APIs.

use async_trait::async_trait;

use crate::config::IdentitySettings;
use crate::domain::entities::{AccessTokenProvider, Member, WorkspaceDirectory, WorkspaceInfo};
use crate::shared::error::ChatError;

/// Reads collaborator data from `IdentitySettings`.
#[derive(Debug, Clone)]
pub struct ConfiguredDirectory {
    identity: IdentitySettings,
}

impl ConfiguredDirectory {
    pub fn new(identity: IdentitySettings) -> Self {
        Self { identity }
    }
}

#[async_trait]
impl WorkspaceDirectory for ConfiguredDirectory {
    async fn workspace_info(&self) -> Result<WorkspaceInfo, ChatError> {
        if self.identity.workspace_id.trim().is_empty() {
            return Err(ChatError::Collaborator(
                "identity.workspace_id is not configured".into(),
            ));
        }
        Ok(WorkspaceInfo {
            workspace_id: self.identity.workspace_id.clone(),
        })
    }

    async fn members(&self) -> Result<Vec<Member>, ChatError> {
        Ok(vec![Member {
            user_id: self.identity.user_id,
            name: Some(self.identity.user_name.clone()),
        }])
    }
}

#[async_trait]
impl AccessTokenProvider for ConfiguredDirectory {
    async fn access_token(&self) -> Result<String, ChatError> {
        if self.identity.access_token.trim().is_empty() {
            return Err(ChatError::Collaborator(
                "identity.access_token is not configured".into(),
            ));
        }
        Ok(self.identity.access_token.clone())
    }
}
