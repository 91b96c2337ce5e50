#![doc = include_str!("../README.md")]
#![deny(unused_crate_dependencies)]

mod actor;
pub mod buffer;
pub mod cache;
mod config;
mod controller;
mod error;
pub mod poller;
pub mod scheduler;
pub mod session;

pub use config::{DEFAULT_POLL_INTERVAL, EngineConfig};
pub use controller::{NarratorEngine, TransportController};
pub use error::EngineError;

// Dev-dependencies used only by the integration tests
#[cfg(test)]
use async_trait as _;
#[cfg(test)]
use mockall as _;
#[cfg(test)]
use tokio_test as _;
