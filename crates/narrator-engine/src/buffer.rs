//! Sparse, index-keyed storage of chunk media resources.
//!
//! Chunks arrive in any order. Each index is registered at most once per
//! job; the registered set outlives the entries so that re-ingesting the
//! full URL list on every poll never loads a chunk twice.

use std::collections::{BTreeMap, HashSet};
use std::fmt;

use narrator_core::{MediaBackend, MediaEventSink, MediaResource};

// ── Chunk lifecycle ────────────────────────────────────────────────

/// Lifecycle of a single chunk resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkState {
    /// Loading was requested; not playable yet.
    Fetched,
    /// Enough audio is buffered to play through.
    Ready,
    /// This is the audible chunk (or the paused one).
    Playing,
    /// Played to the end.
    Played,
    /// Loading or playback failed; the chunk is skipped.
    Errored,
}

/// A chunk held by the buffer.
pub struct ChunkEntry {
    index: usize,
    url: String,
    state: ChunkState,
    resource: Box<dyn MediaResource>,
}

impl ChunkEntry {
    pub const fn index(&self) -> usize {
        self.index
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub const fn state(&self) -> ChunkState {
        self.state
    }

    pub(crate) fn resource_mut(&mut self) -> &mut dyn MediaResource {
        self.resource.as_mut()
    }
}

impl fmt::Debug for ChunkEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChunkEntry")
            .field("index", &self.index)
            .field("url", &self.url)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

// ── Buffer ─────────────────────────────────────────────────────────

/// Ordered sparse collection of chunk resources for one job.
#[derive(Debug, Default)]
pub struct ChunkBuffer {
    entries: BTreeMap<usize, ChunkEntry>,
    registered: HashSet<usize>,
}

impl ChunkBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register chunk `index` and begin loading it.
    ///
    /// Returns `false` without touching the backend if `index` was already
    /// registered during this job, even if its entry has since been released.
    pub fn register(
        &mut self,
        index: usize,
        url: &str,
        rate: f32,
        media: &dyn MediaBackend,
        events: MediaEventSink,
    ) -> bool {
        if !self.registered.insert(index) {
            return false;
        }

        let resource = media.load(url, rate, events);
        self.entries.insert(
            index,
            ChunkEntry {
                index,
                url: url.to_string(),
                state: ChunkState::Fetched,
                resource,
            },
        );
        true
    }

    pub fn is_registered(&self, index: usize) -> bool {
        self.registered.contains(&index)
    }

    pub fn state(&self, index: usize) -> Option<ChunkState> {
        self.entries.get(&index).map(ChunkEntry::state)
    }

    pub fn is_ready(&self, index: usize) -> bool {
        self.state(index) == Some(ChunkState::Ready)
    }

    pub fn entry_mut(&mut self, index: usize) -> Option<&mut ChunkEntry> {
        self.entries.get_mut(&index)
    }

    /// `Fetched` → `Ready`. Returns whether the transition happened.
    pub fn mark_ready(&mut self, index: usize) -> bool {
        match self.entries.get_mut(&index) {
            Some(entry) if entry.state == ChunkState::Fetched => {
                entry.state = ChunkState::Ready;
                true
            }
            _ => false,
        }
    }

    /// `Ready` → `Playing`, starting the resource.
    pub fn start(&mut self, index: usize) -> bool {
        match self.entries.get_mut(&index) {
            Some(entry) if entry.state == ChunkState::Ready => {
                entry.state = ChunkState::Playing;
                entry.resource.play();
                true
            }
            _ => false,
        }
    }

    /// Mark a chunk as failed and silence it, keeping the entry so the
    /// scheduler can see it was skipped once the cursor gets there.
    pub fn fail(&mut self, index: usize) -> bool {
        match self.entries.get_mut(&index) {
            Some(entry) if entry.state != ChunkState::Errored => {
                entry.state = ChunkState::Errored;
                entry.resource.stop();
                true
            }
            _ => false,
        }
    }

    /// Stop and drop the entry at `index`, keeping its registration.
    pub fn release(&mut self, index: usize, final_state: ChunkState) -> Option<ChunkState> {
        let mut entry = self.entries.remove(&index)?;
        if entry.state != ChunkState::Errored {
            entry.resource.stop();
        }
        entry.state = final_state;
        Some(entry.state)
    }

    /// Apply a speed multiplier to every held resource.
    pub fn set_rate(&mut self, rate: f32) {
        for entry in self.entries.values_mut() {
            if entry.state != ChunkState::Errored {
                entry.resource.set_rate(rate);
            }
        }
    }

    /// Stop every resource and forget every registration.
    pub fn clear(&mut self) {
        for entry in self.entries.values_mut() {
            if entry.state != ChunkState::Errored {
                entry.resource.stop();
            }
        }
        self.entries.clear();
        self.registered.clear();
    }

    /// Number of entries currently held.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of indices registered during this job.
    pub fn registered_count(&self) -> usize {
        self.registered.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use narrator_core::testing::{FakeMediaBackend, MediaCall};

    fn register(buffer: &mut ChunkBuffer, media: &FakeMediaBackend, index: usize) -> bool {
        buffer.register(
            index,
            &format!("https://cdn/{index}.mp3"),
            1.0,
            media,
            MediaEventSink::noop(),
        )
    }

    #[test]
    fn register_is_idempotent() {
        let media = FakeMediaBackend::new();
        let mut buffer = ChunkBuffer::new();

        assert!(register(&mut buffer, &media, 2));
        assert!(!register(&mut buffer, &media, 2));
        assert_eq!(media.load_count("https://cdn/2.mp3"), 1);
        assert_eq!(buffer.state(2), Some(ChunkState::Fetched));
    }

    #[test]
    fn released_index_stays_registered() {
        let media = FakeMediaBackend::new();
        let mut buffer = ChunkBuffer::new();
        register(&mut buffer, &media, 0);

        assert_eq!(buffer.release(0, ChunkState::Played), Some(ChunkState::Played));
        assert!(buffer.is_empty());
        assert!(buffer.is_registered(0));
        assert!(!register(&mut buffer, &media, 0));
        assert_eq!(media.total_loads(), 1);
    }

    #[test]
    fn start_requires_ready() {
        let media = FakeMediaBackend::new();
        let mut buffer = ChunkBuffer::new();
        register(&mut buffer, &media, 0);

        assert!(!buffer.start(0));
        assert!(buffer.mark_ready(0));
        assert!(!buffer.mark_ready(0));
        assert!(buffer.is_ready(0));
        assert!(buffer.start(0));
        assert_eq!(buffer.state(0), Some(ChunkState::Playing));
        assert!(media.is_playing("https://cdn/0.mp3"));
    }

    #[test]
    fn failed_entry_is_silenced_once() {
        let media = FakeMediaBackend::new();
        let mut buffer = ChunkBuffer::new();
        register(&mut buffer, &media, 1);

        assert!(buffer.fail(1));
        assert!(!buffer.fail(1));
        assert!(!buffer.mark_ready(1));
        assert_eq!(buffer.state(1), Some(ChunkState::Errored));

        buffer.release(1, ChunkState::Errored);
        let stops = media
            .calls()
            .into_iter()
            .filter(|call| matches!(call, MediaCall::Stop { .. }))
            .count();
        assert_eq!(stops, 1);
    }

    #[test]
    fn set_rate_reaches_every_held_resource() {
        let media = FakeMediaBackend::new();
        let mut buffer = ChunkBuffer::new();
        register(&mut buffer, &media, 0);
        register(&mut buffer, &media, 3);

        buffer.set_rate(1.5);

        assert_eq!(media.rate_of("https://cdn/0.mp3"), Some(1.5));
        assert_eq!(media.rate_of("https://cdn/3.mp3"), Some(1.5));
    }

    #[test]
    fn clear_stops_everything_and_forgets_registrations() {
        let media = FakeMediaBackend::new();
        let mut buffer = ChunkBuffer::new();
        register(&mut buffer, &media, 0);
        register(&mut buffer, &media, 1);
        buffer.mark_ready(0);
        buffer.start(0);

        buffer.clear();

        assert!(buffer.is_empty());
        assert_eq!(buffer.registered_count(), 0);
        assert!(media.is_stopped("https://cdn/0.mp3"));
        assert!(media.is_stopped("https://cdn/1.mp3"));
        assert!(!media.is_playing("https://cdn/0.mp3"));
    }
}
