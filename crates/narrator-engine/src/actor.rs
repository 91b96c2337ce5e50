//! The engine actor: the single owner of all playback state.
//!
//! Two inboxes feed the actor. Commands come from [`TransportController`]s;
//! notices come from tasks and media callbacks the actor started itself.
//! Every notice carries the [`SessionId`] it was created for, so results
//! that arrive after a teardown are recognised and dropped.
//!
//! [`TransportController`]: crate::TransportController

use std::ops::ControlFlow;
use std::sync::Arc;
use std::time::Duration;

use narrator_core::{
    MediaBackend, MediaEvent, MediaEventSink, PlaybackEvent, PlaybackEventEmitter,
    PlaybackFailure, PlaybackPhase, PlaybackRate, Progress, StreamRequest, StreamStart,
    SynthesisClientPort, SynthesisJob, SynthesisPortResult, TransportState, Voice,
};
use tokio::sync::{mpsc, oneshot, watch};
use tokio_util::sync::CancellationToken;

use crate::cache::CachedPlayback;
use crate::config::EngineConfig;
use crate::poller::{JobPoller, PollVerdict};
use crate::scheduler::{PlaybackScheduler, ScheduleEvent, ToggleOutcome};
use crate::session::{MediaTarget, Session, SessionId, SessionMode};

// ── Messages ───────────────────────────────────────────────────────

/// Requests from transport controllers.
#[derive(Debug)]
pub(crate) enum Command {
    Speak(String),
    TogglePlayPause,
    SetRate(PlaybackRate),
    CycleRate,
    SetVoice(Voice),
    Close(oneshot::Sender<()>),
}

/// Results posted back by tasks and media callbacks.
#[derive(Debug)]
pub(crate) enum Notice {
    StreamStarted {
        session: SessionId,
        result: SynthesisPortResult<StreamStart>,
    },
    PollCompleted {
        session: SessionId,
        result: SynthesisPortResult<SynthesisJob>,
    },
    Media {
        session: SessionId,
        target: MediaTarget,
        event: MediaEvent,
    },
}

impl Notice {
    const fn session(&self) -> SessionId {
        match self {
            Self::StreamStarted { session, .. }
            | Self::PollCompleted { session, .. }
            | Self::Media { session, .. } => *session,
        }
    }
}

fn media_sink(
    notices: &mpsc::UnboundedSender<Notice>,
    session: SessionId,
    target: MediaTarget,
) -> MediaEventSink {
    let notices = notices.clone();
    MediaEventSink::new(move |event| {
        let _ = notices.send(Notice::Media {
            session,
            target,
            event,
        });
    })
}

fn poll_delivery(
    notices: &mpsc::UnboundedSender<Notice>,
    session: SessionId,
) -> impl FnOnce(SynthesisPortResult<SynthesisJob>) + Send + 'static {
    let notices = notices.clone();
    move |result| {
        let _ = notices.send(Notice::PollCompleted { session, result });
    }
}

// ── Actor ──────────────────────────────────────────────────────────

pub(crate) struct EngineActor {
    config: EngineConfig,
    client: Arc<dyn SynthesisClientPort>,
    media: Arc<dyn MediaBackend>,
    emitter: Box<dyn PlaybackEventEmitter>,
    state: TransportState,
    state_tx: watch::Sender<TransportState>,
    notices: mpsc::UnboundedSender<Notice>,
    session: Option<Session>,
    last_session: SessionId,
    published_phase: PlaybackPhase,
}

impl EngineActor {
    pub(crate) fn new(
        config: EngineConfig,
        client: Arc<dyn SynthesisClientPort>,
        media: Arc<dyn MediaBackend>,
        emitter: Box<dyn PlaybackEventEmitter>,
        state_tx: watch::Sender<TransportState>,
        notices: mpsc::UnboundedSender<Notice>,
    ) -> Self {
        let state = TransportState::new(config.voice, config.rate);
        Self {
            config,
            client,
            media,
            emitter,
            published_phase: state.phase,
            state,
            state_tx,
            notices,
            session: None,
            last_session: SessionId::new(0),
        }
    }

    /// Process messages until closed or every controller is dropped.
    pub(crate) async fn run(
        mut self,
        mut commands: mpsc::UnboundedReceiver<Command>,
        mut notices: mpsc::UnboundedReceiver<Notice>,
    ) {
        tracing::debug!("Playback engine started");
        loop {
            tokio::select! {
                biased;
                command = commands.recv() => {
                    let Some(command) = command else {
                        tracing::debug!("All transport controllers dropped");
                        self.close();
                        self.publish();
                        break;
                    };
                    if self.on_command(command).is_break() {
                        break;
                    }
                }
                Some(notice) = notices.recv() => self.on_notice(notice),
            }
            self.publish();
        }
        tracing::debug!("Playback engine stopped");
    }

    fn on_command(&mut self, command: Command) -> ControlFlow<()> {
        match command {
            Command::Speak(text) => self.speak(text),
            Command::TogglePlayPause => self.toggle_play_pause(),
            Command::SetRate(rate) => self.set_rate(rate),
            Command::CycleRate => self.set_rate(self.state.rate.next()),
            Command::SetVoice(voice) => self.set_voice(voice),
            Command::Close(done) => {
                self.close();
                self.publish();
                let _ = done.send(());
                return ControlFlow::Break(());
            }
        }
        ControlFlow::Continue(())
    }

    fn on_notice(&mut self, notice: Notice) {
        let id = notice.session();
        if !self.session.as_ref().is_some_and(|s| s.accepts(id)) {
            tracing::trace!(session = %id, "Dropping notice from a torn-down session");
            return;
        }
        match notice {
            Notice::StreamStarted { result, .. } => self.on_stream_started(result),
            Notice::PollCompleted { result, .. } => self.on_poll(result),
            Notice::Media { target, event, .. } => self.on_media(target, event),
        }
    }

    // ── Transport commands ─────────────────────────────────────────

    fn speak(&mut self, text: String) {
        let request = StreamRequest::new(text, self.state.voice)
            .with_format(self.config.response_format);
        self.start_session(request);
    }

    fn start_session(&mut self, request: StreamRequest) {
        if let Some(mut previous) = self.session.take() {
            tracing::debug!(session = %previous.id(), "Tearing down previous session");
            previous.teardown();
        }

        let id = self.last_session.next();
        self.last_session = id;
        let token = CancellationToken::new();
        let mut poller = JobPoller::new(self.config.poll_interval, token.clone());
        poller.mark_starting();
        self.state.reset_for_new_job();

        tracing::info!(
            session = %id,
            voice = %request.voice,
            chars = request.text.len(),
            "Starting playback session"
        );

        let client = Arc::clone(&self.client);
        let notices = self.notices.clone();
        let task_token = token.clone();
        let task_request = request.clone();
        tokio::spawn(async move {
            if task_token.is_cancelled() {
                return;
            }
            let result = client.start_stream(&task_request).await;
            if task_token.is_cancelled() {
                tracing::debug!(session = %id, "Discarding start response for cancelled session");
                return;
            }
            let _ = notices.send(Notice::StreamStarted {
                session: id,
                result,
            });
        });

        self.session = Some(Session::new(id, request, poller, token));
    }

    fn toggle_play_pause(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let (outcome, chunked) = match &mut session.mode {
            SessionMode::Chunked { scheduler, .. } => (scheduler.toggle_pause(), true),
            SessionMode::Cached(cached) => (cached.toggle_pause(), false),
            SessionMode::Starting(_) | SessionMode::Done => (ToggleOutcome::NoResource, false),
        };
        tracing::debug!(session = %session.id(), ?outcome, "Toggled play/pause");

        if let (ToggleOutcome::Started(index), true) = (outcome, chunked) {
            self.apply(vec![ScheduleEvent::Started(index)]);
        }
    }

    fn set_rate(&mut self, rate: PlaybackRate) {
        self.state.rate = rate;
        let multiplier = rate.multiplier();
        if let Some(session) = self.session.as_mut() {
            match &mut session.mode {
                SessionMode::Chunked { scheduler, .. } => scheduler.set_rate(multiplier),
                SessionMode::Cached(cached) => cached.set_rate(multiplier),
                SessionMode::Starting(_) | SessionMode::Done => {}
            }
        }
        tracing::debug!(%rate, "Playback rate changed");
    }

    fn set_voice(&mut self, voice: Voice) {
        if voice == self.state.voice {
            return;
        }
        self.state.voice = voice;
        tracing::info!(%voice, "Voice changed");

        let Some(text) = self.session.as_ref().map(|s| s.request().text.clone()) else {
            return;
        };
        self.speak(text);
    }

    fn close(&mut self) {
        if let Some(session) = self.session.as_mut() {
            session.teardown();
        }
        self.state.phase = PlaybackPhase::Closed;
        self.state.is_loading = false;
        self.state.is_playing = false;
        self.state.buffered = 0;
        self.emitter.emit(PlaybackEvent::Closed);
        tracing::info!("Playback engine closed");
    }

    // ── Notices ────────────────────────────────────────────────────

    fn on_stream_started(&mut self, result: SynthesisPortResult<StreamStart>) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let id = session.id();
        let SessionMode::Starting(poller) = &mut session.mode else {
            tracing::trace!(session = %id, "Ignoring duplicate start response");
            return;
        };

        match result {
            Err(e) => {
                poller.mark_start_failed();
                self.fail(PlaybackFailure::StartFailed {
                    detail: e.to_string(),
                });
            }
            Ok(StreamStart::Cached { url }) => {
                tracing::info!(session = %id, %url, "Cache hit, playing full utterance");
                let sink = media_sink(&self.notices, id, MediaTarget::Cached);
                let cached = CachedPlayback::load(
                    &url,
                    self.state.rate.multiplier(),
                    self.media.as_ref(),
                    sink,
                );
                session.mode = SessionMode::Cached(cached);
                self.state.progress = Progress::new(1, 1);
                self.emitter.emit(PlaybackEvent::CacheHit);
            }
            Ok(StreamStart::Job {
                job_id,
                total_chunks,
            }) => {
                tracing::info!(session = %id, %job_id, total_chunks, "Synthesis job started");
                poller.begin(job_id.clone());
                // First poll goes out right away; later ones wait the interval.
                poller.schedule(&self.client, Duration::ZERO, poll_delivery(&self.notices, id));

                let SessionMode::Starting(poller) =
                    std::mem::replace(&mut session.mode, SessionMode::Done)
                else {
                    return;
                };
                let scheduler = PlaybackScheduler::new(total_chunks, self.state.rate.multiplier());
                session.mode = SessionMode::Chunked { poller, scheduler };

                self.state.progress = Progress::new(0, total_chunks);
                self.emitter.emit(PlaybackEvent::JobStarted {
                    job_id,
                    total_chunks,
                });
            }
        }
    }

    fn on_poll(&mut self, result: SynthesisPortResult<SynthesisJob>) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let id = session.id();
        let SessionMode::Chunked { poller, scheduler } = &mut session.mode else {
            return;
        };

        let (job, completed) = match poller.on_response(result) {
            PollVerdict::Ignored => return,
            PollVerdict::Failed(failure) => {
                self.fail(failure);
                return;
            }
            PollVerdict::Continue(job) => (job, false),
            PollVerdict::Completed(job) => (job, true),
        };

        tracing::debug!(
            session = %id,
            status = job.status.as_str(),
            completed = job.completed_chunks,
            total = job.total_chunks,
            "Job status"
        );

        // The full URL list is re-ingested on every poll; known indices are no-ops.
        scheduler.set_total(job.expected_chunks());
        for (index, url) in job.available_chunks() {
            if scheduler.buffer().is_registered(index) {
                continue;
            }
            let sink = media_sink(&self.notices, id, MediaTarget::Chunk(index));
            if scheduler.register(index, url, self.media.as_ref(), sink) {
                tracing::debug!(session = %id, index, "Chunk registered");
            }
        }

        let events = if completed {
            scheduler.complete_job(job.expected_chunks())
        } else {
            poller.schedule_next(&self.client, poll_delivery(&self.notices, id));
            Vec::new()
        };

        let progress = Progress::new(job.completed_chunks, job.expected_chunks());
        if self.state.progress != progress {
            self.state.progress = progress;
            self.emitter.emit(PlaybackEvent::Progress {
                completed: progress.completed,
                total: progress.total,
            });
        }

        self.apply(events);
    }

    fn on_media(&mut self, target: MediaTarget, event: MediaEvent) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let id = session.id();

        match (&mut session.mode, target) {
            (SessionMode::Chunked { scheduler, .. }, MediaTarget::Chunk(index)) => {
                let events = match event {
                    MediaEvent::Ready => {
                        tracing::trace!(session = %id, index, "Chunk ready");
                        self.state.is_loading = false;
                        scheduler.on_ready(index)
                    }
                    MediaEvent::Ended => scheduler.on_ended(index),
                    MediaEvent::Error(reason) => {
                        tracing::warn!(session = %id, index, %reason, "Chunk failed");
                        scheduler.on_error(index, &reason)
                    }
                };
                self.apply(events);
            }
            (SessionMode::Cached(cached), MediaTarget::Cached) => match event {
                MediaEvent::Ready => {
                    self.state.is_loading = false;
                    cached.on_ready();
                }
                MediaEvent::Ended => {
                    if cached.on_ended() {
                        self.finish();
                    }
                }
                MediaEvent::Error(reason) => {
                    if let Some(failure) = cached.on_error(&reason) {
                        self.fail(failure);
                    }
                }
            },
            _ => {
                tracing::trace!(session = %id, ?target, "Dropping event for a released resource");
            }
        }
    }

    // ── Outcomes ───────────────────────────────────────────────────

    fn apply(&mut self, events: Vec<ScheduleEvent>) {
        let id = self.last_session;
        for event in events {
            match event {
                ScheduleEvent::Started(index) => {
                    tracing::debug!(session = %id, index, "Chunk started");
                    self.state.is_loading = false;
                    self.emitter.emit(PlaybackEvent::ChunkStarted { index });
                }
                ScheduleEvent::Skipped { index, reason } => {
                    tracing::warn!(session = %id, index, %reason, "Chunk skipped");
                    self.emitter
                        .emit(PlaybackEvent::ChunkSkipped { index, reason });
                }
                ScheduleEvent::Finished => {
                    let audible = match self.session.as_ref().map(|s| &s.mode) {
                        Some(SessionMode::Chunked { scheduler, .. }) => scheduler.audible_count(),
                        _ => 0,
                    };
                    if audible == 0 {
                        self.fail(PlaybackFailure::NoAudio);
                    } else {
                        self.finish();
                    }
                    return;
                }
            }
        }
    }

    fn finish(&mut self) {
        if let Some(session) = self.session.as_mut() {
            session.teardown();
        }
        self.state.phase = PlaybackPhase::Finished;
        self.state.is_loading = false;
        self.state.is_playing = false;
        self.state.buffered = 0;
        self.emitter.emit(PlaybackEvent::Finished);
        tracing::info!(session = %self.last_session, "Playback finished");
    }

    fn fail(&mut self, failure: PlaybackFailure) {
        tracing::warn!(session = %self.last_session, error = %failure, ?failure, "Playback failed");
        if let Some(session) = self.session.as_mut() {
            session.teardown();
        }
        self.state.phase = PlaybackPhase::Failed;
        self.state.is_loading = false;
        self.state.is_playing = false;
        self.state.buffered = 0;
        self.state.error = Some(failure.to_string());
        self.emitter.emit(PlaybackEvent::Failed { failure });
    }

    // ── Publishing ─────────────────────────────────────────────────

    /// Derive the live fields of the transport state from the session.
    fn sync_state(&mut self) {
        let Some(session) = self.session.as_ref() else {
            return;
        };
        match &session.mode {
            SessionMode::Starting(_) => {
                self.state.phase = PlaybackPhase::Loading;
            }
            SessionMode::Chunked { scheduler, .. } => {
                self.state.cursor = scheduler.cursor();
                self.state.buffered = scheduler.buffer().len();
                self.state.is_playing = scheduler.is_playing();
                self.state.phase = if scheduler.is_playing() {
                    PlaybackPhase::Playing
                } else if scheduler.is_paused() {
                    PlaybackPhase::Paused
                } else if scheduler.audible_count() == 0 {
                    PlaybackPhase::Loading
                } else {
                    PlaybackPhase::Buffering
                };
            }
            SessionMode::Cached(cached) => {
                self.state.buffered = 1;
                self.state.is_playing = cached.is_playing();
                self.state.phase = if cached.is_playing() {
                    PlaybackPhase::Playing
                } else if cached.is_paused() {
                    PlaybackPhase::Paused
                } else {
                    PlaybackPhase::Loading
                };
            }
            SessionMode::Done => {}
        }
    }

    fn publish(&mut self) {
        self.sync_state();

        if self.state.phase != self.published_phase {
            self.published_phase = self.state.phase;
            self.emitter.emit(PlaybackEvent::PhaseChanged {
                phase: self.state.phase,
            });
        }

        let snapshot = &self.state;
        self.state_tx.send_if_modified(|current| {
            if current == snapshot {
                false
            } else {
                current.clone_from(snapshot);
                true
            }
        });
    }
}
