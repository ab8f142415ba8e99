//! # Workspace Chat Library
//!
//! This crate provides a real-time workspace chat client engine with:
//! - STOMP 1.2 over WebSocket transport with fixed-delay reconnect
//! - Live and history feed subscriptions routed per broker session
//! - Cursor-driven backward history paging
//! - An ordered in-memory message store
//!
//! ## Architecture
//!
//! The crate follows Clean Architecture principles:
//!
//! - **Domain Layer**: Entities, the message store and collaborator traits
//! - **Application Layer**: Chat engine services and wire DTOs
//! - **Infrastructure Layer**: STOMP transport, metrics and collaborators
//! - **Presentation Layer**: Console front-end
//!
//! ## Module Structure
//!
//! ```text
//! workspace_chat/
//! +-- config/         Configuration management
//! +-- domain/         Domain entities, store and traits
//! +-- application/    Chat engine services and DTOs
//! +-- infrastructure/ STOMP client, metrics, configured collaborators
//! +-- presentation/   Console front-end
//! +-- shared/         Common utilities (errors, validation)
//! ```

// Configuration module
pub mod config;

// Domain layer - Core chat state
pub mod domain;

// Application layer - Chat engine services
pub mod application;

// Infrastructure layer - External implementations
pub mod infrastructure;

// Presentation layer - Console front-end
pub mod presentation;

// Shared utilities
pub mod shared;

// Application startup
pub mod startup;

// Telemetry and observability
pub mod telemetry;
