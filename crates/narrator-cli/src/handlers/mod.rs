//! Command handlers.
//!
//! Each handler parses its CLI-specific input, drives the engine through a
//! [`TransportController`](narrator_engine::TransportController) and formats
//! output for the terminal.

pub mod speak;
pub mod voices;
