//! Infrastructure Layer
//!
//! Contains implementations for external services including:
//! - STOMP over WebSocket transport
//! - Configuration-backed workspace collaborators
//! - Prometheus metrics

pub mod directory;
pub mod metrics;
pub mod stomp;
