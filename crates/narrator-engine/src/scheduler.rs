//! Playback scheduler: the cursor state machine.
//!
//! ```text
//!            ready(cursor)             ended / error
//!   waiting ───────────────▶ playing ─────────────────▶ advance ─┐
//!      ▲                                                          │
//!      └──────────────── entry at new cursor not ready ◀─────────┘
//! ```
//!
//! [`PlaybackScheduler::try_play_current`] is the only place playback starts.
//! It refuses while something is playing, while paused and once cancelled,
//! which is what keeps at most one chunk audible and chunks strictly ordered.

use narrator_core::{MediaBackend, MediaEventSink};

use crate::buffer::{ChunkBuffer, ChunkState};

/// Something observable the scheduler did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScheduleEvent {
    /// Chunk `index` began playing.
    Started(usize),
    /// Chunk `index` was passed over without playing.
    Skipped { index: usize, reason: String },
    /// The cursor moved past the last chunk of a completed job.
    Finished,
}

/// Result of a play/pause toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    /// The audible resource was paused (or the pending one will not start).
    Paused,
    /// The paused resource resumed.
    Resumed,
    /// Unpausing let the ready chunk at the cursor start.
    Started(usize),
    /// There is no resource at the cursor; nothing changed.
    NoResource,
}

/// Strictly ordered playback over a [`ChunkBuffer`].
#[derive(Debug)]
pub struct PlaybackScheduler {
    buffer: ChunkBuffer,
    cursor: usize,
    playing: Option<usize>,
    paused: bool,
    cancelled: bool,
    job_completed: bool,
    finished: bool,
    total: usize,
    /// One past the highest index that ever got a URL.
    registered_span: usize,
    rate: f32,
    audible: usize,
}

impl PlaybackScheduler {
    /// A scheduler for a job expected to produce `total` chunks.
    pub fn new(total: usize, rate: f32) -> Self {
        Self {
            buffer: ChunkBuffer::new(),
            cursor: 0,
            playing: None,
            paused: false,
            cancelled: false,
            job_completed: false,
            finished: false,
            total,
            registered_span: 0,
            rate,
            audible: 0,
        }
    }

    // ── Queries ────────────────────────────────────────────────────

    pub const fn cursor(&self) -> usize {
        self.cursor
    }

    /// Index of the chunk holding the audible slot, paused or not.
    pub const fn current(&self) -> Option<usize> {
        self.playing
    }

    /// Whether a chunk is audibly playing right now.
    pub const fn is_playing(&self) -> bool {
        self.playing.is_some() && !self.paused
    }

    pub const fn is_paused(&self) -> bool {
        self.paused
    }

    pub const fn is_finished(&self) -> bool {
        self.finished
    }

    pub const fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    /// Number of chunks that started playing during this job.
    pub const fn audible_count(&self) -> usize {
        self.audible
    }

    pub const fn total(&self) -> usize {
        self.total
    }

    pub const fn buffer(&self) -> &ChunkBuffer {
        &self.buffer
    }

    // ── Inputs from the poller ─────────────────────────────────────

    /// Raise the expected chunk count. While the job runs it only grows;
    /// [`complete_job`](Self::complete_job) fixes the final value.
    pub fn set_total(&mut self, total: usize) {
        self.total = self.total.max(total);
    }

    /// Register a chunk URL reported by a poll. No-op once cancelled or if
    /// the index is already known.
    pub fn register(
        &mut self,
        index: usize,
        url: &str,
        media: &dyn MediaBackend,
        events: MediaEventSink,
    ) -> bool {
        if self.cancelled {
            return false;
        }
        self.registered_span = self.registered_span.max(index + 1);
        self.set_total(index + 1);
        self.buffer.register(index, url, self.rate, media, events)
    }

    /// The job reached `completed`: no more URLs will arrive.
    ///
    /// `total` is the completed job's chunk count and replaces any larger
    /// estimate from earlier polls, but never drops below a chunk that was
    /// registered. Indices that never got a URL are skipped from now on, and
    /// the scheduler finishes once the cursor passes the last chunk.
    pub fn complete_job(&mut self, total: usize) -> Vec<ScheduleEvent> {
        self.total = total.max(self.registered_span);
        self.job_completed = true;
        let mut events = Vec::new();
        self.settle(&mut events);
        events
    }

    // ── Inputs from media resources ────────────────────────────────

    /// Chunk `index` can play through.
    pub fn on_ready(&mut self, index: usize) -> Vec<ScheduleEvent> {
        let mut events = Vec::new();
        if self.cancelled || !self.buffer.mark_ready(index) {
            return events;
        }
        if index == self.cursor {
            if let Some(started) = self.try_play_current() {
                events.push(ScheduleEvent::Started(started));
            }
        }
        events
    }

    /// Chunk `index` played to its end.
    pub fn on_ended(&mut self, index: usize) -> Vec<ScheduleEvent> {
        if self.cancelled || self.playing != Some(index) {
            tracing::trace!(index, cursor = self.cursor, "Ignoring end of non-current chunk");
            return Vec::new();
        }
        self.buffer.release(index, ChunkState::Played);
        self.advance()
    }

    /// Chunk `index` failed to load or play. Never fatal.
    pub fn on_error(&mut self, index: usize, reason: &str) -> Vec<ScheduleEvent> {
        let mut events = Vec::new();
        if self.cancelled || index < self.cursor {
            return events;
        }

        if index > self.cursor {
            // Skipped once the cursor reaches it.
            self.buffer.fail(index);
            return events;
        }

        self.buffer.release(index, ChunkState::Errored);
        events.push(ScheduleEvent::Skipped {
            index,
            reason: reason.to_string(),
        });
        events.extend(self.advance());
        events
    }

    // ── Core transitions ───────────────────────────────────────────

    /// Start the chunk at the cursor if it is its turn.
    ///
    /// Refuses when a chunk already holds the audible slot, when paused,
    /// when cancelled, or when the chunk at the cursor is not ready.
    pub fn try_play_current(&mut self) -> Option<usize> {
        if self.cancelled || self.paused || self.playing.is_some() {
            return None;
        }
        if !self.buffer.start(self.cursor) {
            return None;
        }
        self.playing = Some(self.cursor);
        self.audible += 1;
        Some(self.cursor)
    }

    /// Move the cursor to the next chunk and play it if it is ready.
    pub fn advance(&mut self) -> Vec<ScheduleEvent> {
        let mut events = Vec::new();
        if self.cancelled {
            return events;
        }
        if let Some(index) = self.playing.take() {
            self.buffer.release(index, ChunkState::Played);
        }
        self.cursor += 1;
        self.settle(&mut events);
        events
    }

    /// Skip whatever cannot play at the cursor, then try to play.
    fn settle(&mut self, events: &mut Vec<ScheduleEvent>) {
        while !self.cancelled && !self.finished && self.playing.is_none() {
            if self.buffer.state(self.cursor) == Some(ChunkState::Errored) {
                self.buffer.release(self.cursor, ChunkState::Errored);
                events.push(ScheduleEvent::Skipped {
                    index: self.cursor,
                    reason: "chunk failed to load".to_string(),
                });
                self.cursor += 1;
                continue;
            }

            if self.job_completed {
                if self.cursor >= self.total {
                    self.finished = true;
                    events.push(ScheduleEvent::Finished);
                    break;
                }
                if !self.buffer.is_registered(self.cursor) {
                    events.push(ScheduleEvent::Skipped {
                        index: self.cursor,
                        reason: "no audio was produced for this chunk".to_string(),
                    });
                    self.cursor += 1;
                    continue;
                }
            }

            if let Some(started) = self.try_play_current() {
                events.push(ScheduleEvent::Started(started));
            }
            break;
        }
    }

    // ── Transport ──────────────────────────────────────────────────

    /// Pause or resume the resource at the cursor.
    pub fn toggle_pause(&mut self) -> ToggleOutcome {
        if self.cancelled || self.buffer.state(self.cursor).is_none() {
            return ToggleOutcome::NoResource;
        }

        if let Some(index) = self.playing {
            let Some(entry) = self.buffer.entry_mut(index) else {
                return ToggleOutcome::NoResource;
            };
            self.paused = !self.paused;
            if self.paused {
                entry.resource_mut().pause();
                return ToggleOutcome::Paused;
            }
            entry.resource_mut().play();
            return ToggleOutcome::Resumed;
        }

        self.paused = !self.paused;
        if self.paused {
            return ToggleOutcome::Paused;
        }
        self.try_play_current()
            .map_or(ToggleOutcome::Resumed, ToggleOutcome::Started)
    }

    /// Apply `rate` to every held resource and every later one.
    pub fn set_rate(&mut self, rate: f32) {
        self.rate = rate;
        self.buffer.set_rate(rate);
    }

    /// Stop everything. Nothing starts again after this.
    pub fn cancel(&mut self) {
        self.cancelled = true;
        self.playing = None;
        self.buffer.clear();
    }
}
