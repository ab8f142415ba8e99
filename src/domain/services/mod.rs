//! # Domain Services
//!
//! Domain services hold state and rules that don't belong to a single entity.
//!
//! ## Services
//!
//! - **MessageStore**: Ordered message sequence with append/prepend and a
//!   read projection for presentation

mod message_store;

pub use message_store::*;
