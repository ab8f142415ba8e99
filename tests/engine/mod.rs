//! Chat engine tests

mod session_tests;
mod transport_tests;
