#![doc = include_str!("../README.md")]
#![deny(unsafe_code)]
#![deny(unused_crate_dependencies)]
// SynthesisClient<B> is generic over a private backend trait; callers use
// DefaultSynthesisClient through SynthesisClientPort
#![allow(private_bounds, private_interfaces)]

mod client;
mod config;
mod error;
mod http;
mod models;
mod port;

// ============================================================================
// Public API
// ============================================================================

// Client
pub use client::{DefaultSynthesisClient, SynthesisClient};

// Configuration
pub use config::SynthesisClientConfig;

// Errors
pub use error::{ClientError, ClientResult};

