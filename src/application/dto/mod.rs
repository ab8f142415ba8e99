//! Data Transfer Objects
//!
//! Wire shapes of the JSON bodies carried in STOMP frames.

pub mod request;
pub mod response;

pub use request::{HistoryRequest, SendMessageRequest};
pub use response::{
    decode_history, decode_live, Envelope, HistoryPage, HistoryPayload, MessagePayload,
    SenderPayload,
};
