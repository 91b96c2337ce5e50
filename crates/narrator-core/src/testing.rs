//! In-memory fakes for every port.
//!
//! Available to this crate's tests and, through the `test-utils` feature, to
//! downstream crates. None of these fakes touch the network or an audio
//! device; tests drive them explicitly.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use tokio::sync::Notify;

use crate::domain::{JobId, JobStatus, StreamRequest, StreamStart, SynthesisJob};
use crate::events::PlaybackEvent;
use crate::ports::{
    MediaBackend, MediaEvent, MediaEventSink, MediaResource, PlaybackEventEmitter,
    SynthesisClientPort, SynthesisPortError, SynthesisPortResult,
};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
}

/// Build a job snapshot from a list of optional chunk URLs.
pub fn job_snapshot(
    job_id: &str,
    status: JobStatus,
    total_chunks: usize,
    urls: &[Option<&str>],
) -> SynthesisJob {
    SynthesisJob {
        id: JobId::new(job_id),
        status,
        total_chunks,
        completed_chunks: urls.iter().filter(|url| url.is_some()).count(),
        chunk_urls: urls.iter().map(|url| url.map(str::to_string)).collect(),
        error_message: None,
    }
}

// ============================================================================
// Synthesis client
// ============================================================================

#[derive(Default)]
struct ClientScript {
    starts: VecDeque<SynthesisPortResult<StreamStart>>,
    polls: VecDeque<SynthesisPortResult<SynthesisJob>>,
    start_requests: Vec<StreamRequest>,
    poll_requests: Vec<JobId>,
    hold_starts: bool,
    hold_polls: bool,
}

/// Scripted synthesis service.
///
/// Scripted results are consumed in order; the last one repeats forever so
/// a test only has to script the interesting prefix.
#[derive(Default)]
pub struct FakeSynthesisClient {
    script: Mutex<ClientScript>,
    start_gate: Notify,
    poll_gate: Notify,
}

impl FakeSynthesisClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every start returns a chunked job.
    #[must_use]
    pub fn with_job(self, job_id: &str, total_chunks: usize) -> Self {
        self.then_start(Ok(StreamStart::Job {
            job_id: JobId::new(job_id),
            total_chunks,
        }))
    }

    /// Every start reports a cache hit.
    #[must_use]
    pub fn with_cache_hit(self, url: &str) -> Self {
        self.then_start(Ok(StreamStart::Cached {
            url: url.to_string(),
        }))
    }

    /// Queue the result of the next `start_stream` call.
    #[must_use]
    pub fn then_start(self, result: SynthesisPortResult<StreamStart>) -> Self {
        lock(&self.script).starts.push_back(result);
        self
    }

    /// Queue the result of the next `poll_status` call.
    #[must_use]
    pub fn then_poll(self, job: SynthesisJob) -> Self {
        self.push_poll(Ok(job));
        self
    }

    /// Queue a failing `poll_status` call.
    #[must_use]
    pub fn then_poll_error(self, error: SynthesisPortError) -> Self {
        self.push_poll(Err(error));
        self
    }

    /// Queue a poll result on a shared client.
    pub fn push_poll(&self, result: SynthesisPortResult<SynthesisJob>) {
        lock(&self.script).polls.push_back(result);
    }

    /// Queue a start result on a shared client.
    pub fn push_start(&self, result: SynthesisPortResult<StreamStart>) {
        lock(&self.script).starts.push_back(result);
    }

    /// Make `start_stream` calls wait until [`release_starts`](Self::release_starts).
    pub fn hold_starts(&self) {
        lock(&self.script).hold_starts = true;
    }

    /// Let held `start_stream` calls return.
    pub fn release_starts(&self) {
        lock(&self.script).hold_starts = false;
        self.start_gate.notify_waiters();
    }

    /// Make `poll_status` calls wait until [`release_polls`](Self::release_polls).
    pub fn hold_polls(&self) {
        lock(&self.script).hold_polls = true;
    }

    /// Let held `poll_status` calls return.
    pub fn release_polls(&self) {
        lock(&self.script).hold_polls = false;
        self.poll_gate.notify_waiters();
    }

    /// Requests received by `start_stream`, in order.
    pub fn start_requests(&self) -> Vec<StreamRequest> {
        lock(&self.script).start_requests.clone()
    }

    /// Number of `poll_status` calls issued.
    pub fn poll_count(&self) -> usize {
        lock(&self.script).poll_requests.len()
    }

    /// Job ids passed to `poll_status`, in order.
    pub fn polled_jobs(&self) -> Vec<JobId> {
        lock(&self.script).poll_requests.clone()
    }

    fn next<T: Clone>(
        queue: &mut VecDeque<SynthesisPortResult<T>>,
        what: &str,
    ) -> SynthesisPortResult<T> {
        match queue.len() {
            0 => Err(SynthesisPortError::Configuration {
                message: format!("no scripted {what} result"),
            }),
            1 => queue[0].clone(),
            _ => queue.pop_front().expect("queue holds at least two results"),
        }
    }
}

#[async_trait]
impl SynthesisClientPort for FakeSynthesisClient {
    async fn start_stream(&self, request: &StreamRequest) -> SynthesisPortResult<StreamStart> {
        let (result, held) = {
            let mut script = lock(&self.script);
            script.start_requests.push(request.clone());
            let result = Self::next(&mut script.starts, "start");
            (result, script.hold_starts)
        };
        if held {
            self.start_gate.notified().await;
        }
        result
    }

    async fn poll_status(&self, job_id: &JobId) -> SynthesisPortResult<SynthesisJob> {
        let (result, held) = {
            let mut script = lock(&self.script);
            script.poll_requests.push(job_id.clone());
            let result = Self::next(&mut script.polls, "poll");
            (result, script.hold_polls)
        };
        if held {
            self.poll_gate.notified().await;
        }
        result
    }
}

// ============================================================================
// Media backend
// ============================================================================

/// A call made on a fake media resource.
#[derive(Debug, Clone, PartialEq)]
pub enum MediaCall {
    Load { url: String, rate: f32 },
    Play { url: String },
    Resume { url: String },
    Pause { url: String },
    Stop { url: String },
    SetRate { url: String, rate: f32 },
}

#[derive(Default)]
struct MediaState {
    calls: Vec<MediaCall>,
    sinks: HashMap<String, MediaEventSink>,
    rates: HashMap<String, f32>,
    playing: HashSet<String>,
    stopped: HashSet<String>,
    max_concurrent: usize,
}

/// Media backend that never produces sound.
///
/// Resources stay silent until a test calls [`emit`](Self::emit). Every call
/// is logged and the number of simultaneously playing resources is tracked.
#[derive(Clone, Default)]
pub struct FakeMediaBackend {
    state: Arc<Mutex<MediaState>>,
}

impl FakeMediaBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver an event to the most recent resource loaded from `url`.
    ///
    /// Returns `false` if no such resource was ever loaded. Delivery happens
    /// even after `stop`, mimicking an event already in flight.
    pub fn emit(&self, url: &str, event: MediaEvent) -> bool {
        let sink = {
            let mut state = lock(&self.state);
            if matches!(event, MediaEvent::Ended | MediaEvent::Error(_)) {
                state.playing.remove(url);
            }
            state.sinks.get(url).cloned()
        };
        sink.map(|sink| sink.emit(event)).is_some()
    }

    /// Every call made so far.
    pub fn calls(&self) -> Vec<MediaCall> {
        lock(&self.state).calls.clone()
    }

    /// URLs in the order their playback first started.
    pub fn started(&self) -> Vec<String> {
        lock(&self.state)
            .calls
            .iter()
            .filter_map(|call| match call {
                MediaCall::Play { url } => Some(url.clone()),
                _ => None,
            })
            .collect()
    }

    /// Number of times `url` was loaded.
    pub fn load_count(&self, url: &str) -> usize {
        lock(&self.state)
            .calls
            .iter()
            .filter(|call| matches!(call, MediaCall::Load { url: u, .. } if u == url))
            .count()
    }

    /// Total number of loads.
    pub fn total_loads(&self) -> usize {
        lock(&self.state)
            .calls
            .iter()
            .filter(|call| matches!(call, MediaCall::Load { .. }))
            .count()
    }

    /// Whether `url` is currently playing.
    pub fn is_playing(&self, url: &str) -> bool {
        lock(&self.state).playing.contains(url)
    }

    /// Whether `url` was stopped.
    pub fn is_stopped(&self, url: &str) -> bool {
        lock(&self.state).stopped.contains(url)
    }

    /// Current rate of `url`.
    pub fn rate_of(&self, url: &str) -> Option<f32> {
        lock(&self.state).rates.get(url).copied()
    }

    /// Highest number of resources that were ever playing at once.
    pub fn max_concurrent_playing(&self) -> usize {
        lock(&self.state).max_concurrent
    }
}

impl MediaBackend for FakeMediaBackend {
    fn load(&self, url: &str, rate: f32, events: MediaEventSink) -> Box<dyn MediaResource> {
        let mut state = lock(&self.state);
        state.calls.push(MediaCall::Load {
            url: url.to_string(),
            rate,
        });
        state.sinks.insert(url.to_string(), events);
        state.rates.insert(url.to_string(), rate);
        state.stopped.remove(url);
        Box::new(FakeResource {
            url: url.to_string(),
            started: false,
            state: Arc::clone(&self.state),
        })
    }
}

struct FakeResource {
    url: String,
    started: bool,
    state: Arc<Mutex<MediaState>>,
}

impl MediaResource for FakeResource {
    fn play(&mut self) {
        let mut state = lock(&self.state);
        let url = self.url.clone();
        state.calls.push(if self.started {
            MediaCall::Resume { url: url.clone() }
        } else {
            MediaCall::Play { url: url.clone() }
        });
        self.started = true;
        state.playing.insert(url);
        state.max_concurrent = state.max_concurrent.max(state.playing.len());
    }

    fn pause(&mut self) {
        let mut state = lock(&self.state);
        state.calls.push(MediaCall::Pause {
            url: self.url.clone(),
        });
        state.playing.remove(&self.url);
    }

    fn stop(&mut self) {
        let mut state = lock(&self.state);
        state.calls.push(MediaCall::Stop {
            url: self.url.clone(),
        });
        state.playing.remove(&self.url);
        state.stopped.insert(self.url.clone());
    }

    fn set_rate(&mut self, rate: f32) {
        let mut state = lock(&self.state);
        state.calls.push(MediaCall::SetRate {
            url: self.url.clone(),
            rate,
        });
        state.rates.insert(self.url.clone(), rate);
    }
}

// ============================================================================
// Event emitter
// ============================================================================

/// Emitter that keeps every event for later inspection.
#[derive(Clone, Default)]
pub struct RecordingEmitter {
    events: Arc<Mutex<Vec<PlaybackEvent>>>,
}

impl RecordingEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every event emitted so far.
    pub fn events(&self) -> Vec<PlaybackEvent> {
        lock(&self.events).clone()
    }

    /// Indices from `ChunkStarted` events, in order.
    pub fn chunk_starts(&self) -> Vec<usize> {
        lock(&self.events)
            .iter()
            .filter_map(|event| match event {
                PlaybackEvent::ChunkStarted { index } => Some(*index),
                _ => None,
            })
            .collect()
    }

    /// Whether an event equal to `event` was emitted.
    pub fn contains(&self, event: &PlaybackEvent) -> bool {
        lock(&self.events).contains(event)
    }
}

impl PlaybackEventEmitter for RecordingEmitter {
    fn emit(&self, event: PlaybackEvent) {
        lock(&self.events).push(event);
    }

    fn clone_box(&self) -> Box<dyn PlaybackEventEmitter> {
        Box::new(self.clone())
    }
}
