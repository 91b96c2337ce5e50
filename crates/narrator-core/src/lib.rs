#![doc = include_str!("../README.md")]
#![deny(unused_crate_dependencies)]

pub mod domain;
pub mod events;
pub mod ports;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

// Re-export commonly used types for convenience
pub use domain::{
    AudioFormat, JobId, JobStatus, PlaybackFailure, PlaybackPhase, PlaybackRate, Progress,
    StreamRequest, StreamStart, SynthesisJob, TransportState, UnknownVoice, Voice,
};
pub use events::PlaybackEvent;
pub use ports::{
    ChannelEmitter, MediaBackend, MediaEvent, MediaEventSink, MediaResource, NoopEmitter,
    PlaybackEventEmitter, SynthesisClientPort, SynthesisPortError, SynthesisPortResult,
};
