//! Application Layer
//!
//! The chat engine services and the wire DTOs they encode and decode.
//! This layer sits between the console front-end and the domain.

pub mod services;
pub mod dto;
