//! Job status polling.
//!
//! ```text
//!   Idle → Starting → Polling ──▶ Completed
//!                        │  ▲
//!                        │  └── next poll after the interval
//!                        └────▶ Failed
//!   (any) ──cancel──▶ Cancelled
//! ```
//!
//! At most one poll is in flight or scheduled at any time. The spawned task
//! checks the cancellation token before it polls and again as soon as the
//! response arrives, so a cancelled poller never delivers anything.

use std::sync::Arc;
use std::time::Duration;

use narrator_core::{
    JobId, JobStatus, PlaybackFailure, SynthesisClientPort, SynthesisJob, SynthesisPortResult,
};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Lifecycle of a [`JobPoller`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollerState {
    Idle,
    /// `start_stream` is in flight.
    Starting,
    Polling,
    Completed,
    Failed,
    Cancelled,
}

/// What the owner should do with a poll response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollVerdict {
    /// Ingest the snapshot and schedule another poll.
    Continue(SynthesisJob),
    /// Ingest the snapshot one last time; polling is over.
    Completed(SynthesisJob),
    /// The job or the poll failed; polling is over.
    Failed(PlaybackFailure),
    /// The poller is no longer polling; drop the response.
    Ignored,
}

/// Drives repeated status polls of one job.
#[derive(Debug)]
pub struct JobPoller {
    state: PollerState,
    job_id: Option<JobId>,
    interval: Duration,
    token: CancellationToken,
    pending: Option<JoinHandle<()>>,
    polls: u64,
}

impl JobPoller {
    /// A poller that stops as soon as `token` is cancelled.
    pub const fn new(interval: Duration, token: CancellationToken) -> Self {
        Self {
            state: PollerState::Idle,
            job_id: None,
            interval,
            token,
            pending: None,
            polls: 0,
        }
    }

    pub const fn state(&self) -> PollerState {
        self.state
    }

    pub const fn job_id(&self) -> Option<&JobId> {
        self.job_id.as_ref()
    }

    pub const fn interval(&self) -> Duration {
        self.interval
    }

    /// Number of polls scheduled so far.
    pub const fn polls_scheduled(&self) -> u64 {
        self.polls
    }

    /// Whether a poll is scheduled or in flight.
    pub fn has_pending(&self) -> bool {
        self.pending.as_ref().is_some_and(|handle| !handle.is_finished())
    }

    /// `Idle` → `Starting`.
    pub fn mark_starting(&mut self) {
        if self.state == PollerState::Idle {
            self.state = PollerState::Starting;
        }
    }

    /// `Starting` → `Failed` when the stream could not be started.
    pub fn mark_start_failed(&mut self) {
        if self.state == PollerState::Starting {
            self.state = PollerState::Failed;
        }
    }

    /// Begin polling `job_id`.
    pub fn begin(&mut self, job_id: JobId) {
        if matches!(self.state, PollerState::Idle | PollerState::Starting) {
            self.job_id = Some(job_id);
            self.state = PollerState::Polling;
        }
    }

    /// Schedule the next poll after `delay`.
    ///
    /// This is the only transition that creates a poll. It does nothing
    /// unless the poller is polling and the token is live. The result goes
    /// to `deliver` unless the token was cancelled in the meantime.
    pub fn schedule<F>(
        &mut self,
        client: &Arc<dyn SynthesisClientPort>,
        delay: Duration,
        deliver: F,
    ) -> bool
    where
        F: FnOnce(SynthesisPortResult<SynthesisJob>) + Send + 'static,
    {
        if self.state != PollerState::Polling || self.token.is_cancelled() {
            return false;
        }
        let Some(job_id) = self.job_id.clone() else {
            return false;
        };
        if let Some(previous) = self.pending.take() {
            previous.abort();
        }

        let client = Arc::clone(client);
        let token = self.token.clone();
        self.polls += 1;
        self.pending = Some(tokio::spawn(async move {
            if !delay.is_zero() {
                tokio::select! {
                    () = token.cancelled() => return,
                    () = tokio::time::sleep(delay) => {}
                }
            }
            if token.is_cancelled() {
                return;
            }

            let result = client.poll_status(&job_id).await;

            if token.is_cancelled() {
                tracing::debug!(%job_id, "Discarding poll response for cancelled job");
                return;
            }
            deliver(result);
        }));
        true
    }

    /// Schedule the next poll after the regular interval.
    pub fn schedule_next<F>(&mut self, client: &Arc<dyn SynthesisClientPort>, deliver: F) -> bool
    where
        F: FnOnce(SynthesisPortResult<SynthesisJob>) + Send + 'static,
    {
        self.schedule(client, self.interval, deliver)
    }

    /// Interpret a poll response.
    pub fn on_response(&mut self, result: SynthesisPortResult<SynthesisJob>) -> PollVerdict {
        self.pending = None;
        if self.state != PollerState::Polling || self.token.is_cancelled() {
            return PollVerdict::Ignored;
        }

        match result {
            Err(e) => {
                self.state = PollerState::Failed;
                PollVerdict::Failed(PlaybackFailure::PollFailed {
                    detail: e.to_string(),
                })
            }
            Ok(job) => match job.status {
                JobStatus::Failed => {
                    self.state = PollerState::Failed;
                    PollVerdict::Failed(PlaybackFailure::JobFailed {
                        message: job.failure_message().map(str::to_string),
                    })
                }
                JobStatus::Completed => {
                    self.state = PollerState::Completed;
                    PollVerdict::Completed(job)
                }
                JobStatus::Pending | JobStatus::Processing => {
                    PollVerdict::Continue(job)
                }
            },
        }
    }

    /// Stop polling for good.
    ///
    /// Cancelling the token ends a scheduled timer right away. A poll already
    /// in flight runs to completion and its response is dropped.
    pub fn cancel(&mut self) {
        self.token.cancel();
        self.pending = None;
        if !matches!(self.state, PollerState::Completed | PollerState::Failed) {
            self.state = PollerState::Cancelled;
        }
    }
}
