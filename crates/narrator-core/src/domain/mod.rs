//! Domain types for the speech-synthesis playback pipeline.
//!
//! Everything here is plain data: no I/O, no runtime handles. The engine
//! mutates these types from its single actor task and publishes clones.

mod failure;
mod job;
mod rate;
mod transport;
mod voice;

pub use failure::PlaybackFailure;
pub use job::{AudioFormat, JobId, JobStatus, StreamRequest, StreamStart, SynthesisJob};
pub use rate::PlaybackRate;
pub use transport::{PlaybackPhase, Progress, TransportState};
pub use voice::{UnknownVoice, Voice};
