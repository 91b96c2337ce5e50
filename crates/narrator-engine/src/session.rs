//! One playback session: everything that belongs to a single `speak` request.
//!
//! A session is torn down as a whole. Teardown is the same for cancellation,
//! voice change, failure and close, and running it twice is harmless.

use std::fmt;

use narrator_core::StreamRequest;
use tokio_util::sync::CancellationToken;

use crate::cache::CachedPlayback;
use crate::poller::JobPoller;
use crate::scheduler::PlaybackScheduler;

/// Identifies a session; messages from older sessions are dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(u64);

impl SessionId {
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "s{}", self.0)
    }
}

/// Which resource of a session a media event belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaTarget {
    Cached,
    Chunk(usize),
}

/// What the session is currently doing.
#[derive(Debug)]
pub enum SessionMode {
    /// Waiting for `start_stream`.
    Starting(JobPoller),
    /// Polling a job and playing its chunks.
    Chunked {
        poller: JobPoller,
        scheduler: PlaybackScheduler,
    },
    /// Playing a cache hit.
    Cached(CachedPlayback),
    /// Finished, failed or torn down.
    Done,
}

/// Per-request state owned by the engine actor.
#[derive(Debug)]
pub struct Session {
    id: SessionId,
    token: CancellationToken,
    request: StreamRequest,
    pub(crate) mode: SessionMode,
}

impl Session {
    pub fn new(
        id: SessionId,
        request: StreamRequest,
        poller: JobPoller,
        token: CancellationToken,
    ) -> Self {
        Self {
            id,
            token,
            request,
            mode: SessionMode::Starting(poller),
        }
    }

    pub const fn id(&self) -> SessionId {
        self.id
    }

    pub const fn request(&self) -> &StreamRequest {
        &self.request
    }

    pub const fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Whether messages tagged `id` still concern this session.
    pub fn accepts(&self, id: SessionId) -> bool {
        self.id == id && !self.token.is_cancelled()
    }

    pub const fn is_done(&self) -> bool {
        matches!(self.mode, SessionMode::Done)
    }

    /// Cancel every pending task and stop every resource.
    ///
    /// The request is kept so the same text can be spoken again with
    /// another voice.
    pub fn teardown(&mut self) {
        self.token.cancel();
        match std::mem::replace(&mut self.mode, SessionMode::Done) {
            SessionMode::Starting(mut poller) => poller.cancel(),
            SessionMode::Chunked {
                mut poller,
                mut scheduler,
            } => {
                poller.cancel();
                scheduler.cancel();
            }
            SessionMode::Cached(mut cached) => cached.stop(),
            SessionMode::Done => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use narrator_core::testing::FakeMediaBackend;
    use narrator_core::{MediaEventSink, Voice};
    use std::time::Duration;

    fn session(id: u64) -> Session {
        let token = CancellationToken::new();
        Session::new(
            SessionId::new(id),
            StreamRequest::new("Hello.", Voice::Alloy),
            JobPoller::new(Duration::from_secs(2), token.clone()),
            token,
        )
    }

    #[test]
    fn accepts_only_own_live_messages() {
        let mut session = session(3);
        assert!(session.accepts(SessionId::new(3)));
        assert!(!session.accepts(SessionId::new(2)));

        session.teardown();
        assert!(!session.accepts(SessionId::new(3)));
        assert!(session.is_done());
    }

    #[test]
    fn teardown_is_idempotent_and_stops_media() {
        let media = FakeMediaBackend::new();
        let mut session = session(1);
        let mut scheduler = PlaybackScheduler::new(1, 1.0);
        scheduler.register(0, "https://cdn/0.mp3", &media, MediaEventSink::noop());
        let poller = JobPoller::new(Duration::from_secs(2), session.token().clone());
        session.mode = SessionMode::Chunked { poller, scheduler };

        session.teardown();
        session.teardown();

        assert!(media.is_stopped("https://cdn/0.mp3"));
        assert!(session.token().is_cancelled());
        assert_eq!(session.request().text, "Hello.");
    }

    #[test]
    fn ids_are_ordered() {
        let first = SessionId::new(1);
        assert!(first.next() > first);
        assert_eq!(first.next().to_string(), "s2");
    }
}
