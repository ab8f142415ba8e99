//! STOMP Transport
//!
//! Frame codec and the WebSocket connection task behind `BrokerLink`.

pub mod client;
pub mod frame;

pub use client::{StompConnector, StompLink};
pub use frame::{Command, Frame, FrameError};
