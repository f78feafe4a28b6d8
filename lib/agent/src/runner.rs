//! The job runner.
//!
//! Submitting a job creates (or reuses) a thread, posts the user's text, and
//! starts a run. Awaiting completion polls the run at a fixed interval until
//! it reaches a terminal status or the deadline passes. The loop is a plain
//! cooperative async loop: dropping the future cancels the wait, and the run
//! itself stays owned by the service.

use crate::backend::{AgentBackend, MessageOrder};
use crate::error::JobError;
use crate::status::RunStatus;
use herald_core::{RunId, ThreadId};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{Instant, sleep};
use tracing::{debug, warn};

/// Poll cadence and deadline for awaiting a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollingPolicy {
    /// Time between status polls.
    pub interval: Duration,
    /// Total time to wait for a terminal status before giving up.
    pub max_wait: Duration,
}

impl Default for PollingPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(1000),
            max_wait: Duration::from_secs(120),
        }
    }
}

/// Identifies a submitted job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobHandle {
    /// The thread the job's message was posted to.
    pub thread_id: ThreadId,
    /// The run driving the job.
    pub run_id: RunId,
}

/// The result of a completed job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobOutcome {
    /// The newest assistant message text.
    pub text: String,
    /// Number of polls taken after the initial status check.
    pub polls: u32,
}

/// Drives agent runs to completion against an [`AgentBackend`].
pub struct JobRunner {
    backend: Arc<dyn AgentBackend>,
    policy: PollingPolicy,
}

impl JobRunner {
    /// Creates a runner over a backend.
    #[must_use]
    pub fn new(backend: Arc<dyn AgentBackend>, policy: PollingPolicy) -> Self {
        Self { backend, policy }
    }

    /// The polling policy in effect.
    #[must_use]
    pub fn policy(&self) -> PollingPolicy {
        self.policy
    }

    /// Submits a job: ensures a usable thread, posts `text` as a user
    /// message, and starts a run.
    ///
    /// A `thread_hint` is reused when the service still knows it; a stale
    /// hint falls back to a fresh thread rather than failing the job.
    ///
    /// # Errors
    ///
    /// Returns `JobError::Backend` when thread creation, message posting,
    /// or run creation fails.
    pub async fn submit(
        &self,
        thread_hint: Option<&ThreadId>,
        text: &str,
    ) -> Result<JobHandle, JobError> {
        let thread_id = match thread_hint {
            Some(hint) => match self.backend.get_thread(hint).await {
                Ok(thread) => thread.id,
                Err(e) => {
                    warn!(thread = %hint, error = %e, "thread hint unusable, creating a new thread");
                    self.backend.create_thread().await?.id
                }
            },
            None => self.backend.create_thread().await?.id,
        };

        self.backend.post_message(&thread_id, text).await?;
        let run = self.backend.create_run(&thread_id).await?;
        debug!(thread = %thread_id, run = %run.id, "job submitted");

        Ok(JobHandle {
            thread_id,
            run_id: run.id,
        })
    }

    /// Awaits a submitted job's terminal status and fetches its result.
    ///
    /// # Errors
    ///
    /// - `DeadlineExceeded` when no terminal status arrives within
    ///   `max_wait`.
    /// - `RunFailed` when the service reports the run as failed; no result
    ///   fetch is attempted and the run is not retried.
    /// - `ProtocolViolation` on an unknown status, an illegal status
    ///   progression, or a completed run with no assistant message.
    /// - `Backend` when a poll or the result fetch itself fails.
    pub async fn await_completion(&self, handle: &JobHandle) -> Result<JobOutcome, JobError> {
        let started = Instant::now();
        let mut polls: u32 = 0;
        let mut previous: Option<RunStatus> = None;

        loop {
            let status = self
                .backend
                .get_run(&handle.thread_id, &handle.run_id)
                .await?;
            debug!(run = %handle.run_id, %status, polls, "run polled");

            if status == RunStatus::Unknown {
                return Err(JobError::ProtocolViolation {
                    details: format!("run {} reported an unrecognized status", handle.run_id),
                });
            }
            if let Some(previous) = previous
                && !status.can_follow(previous)
            {
                return Err(JobError::ProtocolViolation {
                    details: format!(
                        "run {} moved from '{previous}' to '{status}'",
                        handle.run_id
                    ),
                });
            }
            previous = Some(status);

            match status {
                RunStatus::Completed => {
                    let text = self.fetch_reply(handle).await?;
                    return Ok(JobOutcome { text, polls });
                }
                RunStatus::Failed => {
                    return Err(JobError::RunFailed { status });
                }
                RunStatus::Queued | RunStatus::InProgress => {}
                RunStatus::Unknown => unreachable!("handled above"),
            }

            if started.elapsed() >= self.policy.max_wait {
                return Err(JobError::DeadlineExceeded {
                    waited_secs: self.policy.max_wait.as_secs(),
                });
            }

            sleep(self.policy.interval).await;
            polls += 1;
        }
    }

    async fn fetch_reply(&self, handle: &JobHandle) -> Result<String, JobError> {
        let messages = self
            .backend
            .list_messages(&handle.thread_id, MessageOrder::Descending)
            .await?;

        messages
            .into_iter()
            .find(|message| message.is_assistant())
            .map(|message| message.text)
            .ok_or_else(|| JobError::ProtocolViolation {
                details: format!(
                    "run {} completed but the thread has no assistant message",
                    handle.run_id
                ),
            })
    }
}
