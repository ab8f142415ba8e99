//! Application Services
//!
//! The chat engine components, driven by a single session controller.
//!
//! ## Components
//!
//! - **ConnectionManager**: Owns the broker link and its lifecycle
//! - **SubscriptionMultiplexer**: Subscribes both feeds and routes frames
//! - **HistoryPager**: Cursor-driven requests for older pages
//! - **OutboundPublisher**: Composer input and message publishing
//! - **ChatSession**: Applies link events to the components in order

pub mod chat_session;
pub mod connection_manager;
pub mod history_pager;
pub mod outbound_publisher;
pub mod subscription_multiplexer;

#[cfg(test)]
pub(crate) mod testing;

pub use chat_session::{ChatIdentity, ChatSession, ChatUpdate};
pub use connection_manager::{ConnectionManager, ConnectionState, Lifecycle, LinkOptions};
pub use history_pager::HistoryPager;
pub use outbound_publisher::{Key, KeyOutcome, KeyPress, OutboundPublisher};
pub use subscription_multiplexer::{Inbound, Route, SubscriptionMultiplexer};
