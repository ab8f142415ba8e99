//! # Domain Entities
//!
//! Core domain types of the chat engine.
//!
//! ## Core Entities
//!
//! - **Message**: A chat utterance with its sender identity
//! - **PaginationCursor**: How far back history has been loaded
//!
//! ## Broker Contract
//!
//! - **Topic / Destination**: Broker paths for subscribing and publishing
//! - **BrokerLink / Connector**: Transport contract, implemented in the
//!   infrastructure layer
//!
//! ## Collaborators
//!
//! - **WorkspaceDirectory / AccessTokenProvider**: External lookups consumed
//!   before connecting

mod broker;
mod cursor;
mod message;
mod workspace;

// Re-export Message entity and related types
pub use message::{Message, MessageKind, MessageView, Sender};

// Re-export pagination cursor
pub use cursor::PaginationCursor;

// Re-export broker contract types
pub use broker::{
    BrokerLink, ConnectTarget, Connector, CredentialHeader, Destination, LinkEvent,
    SubscriptionId, Topic,
};

// Re-export workspace collaborators
pub use workspace::{AccessTokenProvider, Member, WorkspaceDirectory, WorkspaceInfo};

#[cfg(test)]
pub use workspace::{MockAccessTokenProvider, MockWorkspaceDirectory};
