//! Port definitions (trait abstractions) for external systems.
//!
//! Ports define the interfaces that the engine expects from infrastructure.
//! They contain no implementation details and use only domain types.
//!
//! # Design Rules
//!
//! - No `reqwest` or `rodio` types in any signature
//! - Adapters map their internal errors to the port errors defined here
//! - Media resources report lifecycle changes through a [`MediaEventSink`],
//!   never by blocking the caller

pub mod event_emitter;
pub mod media;
pub mod synthesis;

pub use event_emitter::{ChannelEmitter, NoopEmitter, PlaybackEventEmitter};
pub use media::{MediaBackend, MediaEvent, MediaEventSink, MediaResource};
pub use synthesis::{SynthesisClientPort, SynthesisPortError, SynthesisPortResult};
