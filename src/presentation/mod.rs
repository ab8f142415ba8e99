//! Presentation Layer
//!
//! Console front-end for the chat engine.

pub mod console;
