//! # Domain Layer
//!
//! The domain layer contains the core types of the chat engine.
//! It is independent of the STOMP transport and of presentation.
//!
//! ## Structure
//!
//! - **entities**: Messages, pagination cursor, broker contract, collaborators
//! - **services**: The ordered message store
//!
//! ## Design Principles
//!
//! - No dependencies on infrastructure or presentation layers
//! - Transport access goes through the `BrokerLink` trait

pub mod entities;
pub mod services;

// Re-export commonly used types
pub use entities::*;
pub use services::*;
