#![doc = include_str!("../README.md")]
#![deny(unused_crate_dependencies)]

mod audio_thread;
mod backend;
mod config;
mod error;
mod fetch;

pub use backend::RodioMediaBackend;
pub use config::AudioConfig;
pub use error::AudioError;

