//! The agent backend boundary.
//!
//! Provides a unified interface over the hosted agent-run service: threads,
//! messages, runs. The HTTP implementation lives in [`crate::http`]; the
//! scripted implementation here drives the runner in tests and demos without
//! a live service.

use crate::error::AgentError;
use crate::status::RunStatus;
use async_trait::async_trait;
use herald_core::{RunId, ThreadId};
use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};

/// A thread on the agent service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreadInfo {
    /// Service-assigned thread identifier.
    pub id: ThreadId,
}

/// A run on the agent service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunInfo {
    /// Service-assigned run identifier.
    pub id: RunId,
    /// The thread the run belongs to.
    pub thread_id: ThreadId,
    /// Status at creation time.
    pub status: RunStatus,
}

/// One message on a thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentMessage {
    /// Wire role string, e.g. "user" or "assistant".
    pub role: String,
    /// Concatenated text content.
    pub text: String,
}

impl AgentMessage {
    /// Creates an assistant message.
    #[must_use]
    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            text: text.into(),
        }
    }

    /// Creates a user message.
    #[must_use]
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            text: text.into(),
        }
    }

    /// Returns true for assistant-authored messages.
    #[must_use]
    pub fn is_assistant(&self) -> bool {
        self.role == "assistant"
    }
}

/// Listing order for thread messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageOrder {
    /// Oldest first.
    Ascending,
    /// Newest first.
    Descending,
}

impl MessageOrder {
    /// The value the wire expects in the `order` query parameter.
    #[must_use]
    pub fn as_query_value(self) -> &'static str {
        match self {
            Self::Ascending => "asc",
            Self::Descending => "desc",
        }
    }
}

/// Trait for agent-run backends.
#[async_trait]
pub trait AgentBackend: Send + Sync {
    /// Creates a new thread.
    async fn create_thread(&self) -> Result<ThreadInfo, AgentError>;

    /// Fetches an existing thread. An error means the thread is unusable.
    async fn get_thread(&self, thread: &ThreadId) -> Result<ThreadInfo, AgentError>;

    /// Posts a user message to a thread.
    async fn post_message(&self, thread: &ThreadId, text: &str) -> Result<(), AgentError>;

    /// Starts a run on a thread.
    async fn create_run(&self, thread: &ThreadId) -> Result<RunInfo, AgentError>;

    /// Fetches the current status of a run.
    async fn get_run(&self, thread: &ThreadId, run: &RunId) -> Result<RunStatus, AgentError>;

    /// Lists the messages on a thread in the given order.
    async fn list_messages(
        &self,
        thread: &ThreadId,
        order: MessageOrder,
    ) -> Result<Vec<AgentMessage>, AgentError>;
}

/// A backend that replays a scripted status sequence.
///
/// `get_run` consumes the script front to back; once the script is empty the
/// last status repeats. Posted messages are recorded for assertions, and
/// individual operations can be made to fail.
#[derive(Debug, Default)]
pub struct ScriptedBackend {
    statuses: Mutex<VecDeque<RunStatus>>,
    last_status: Mutex<Option<RunStatus>>,
    reply: Mutex<Vec<AgentMessage>>,
    posted: Mutex<Vec<(ThreadId, String)>>,
    poll_count: AtomicU32,
    message_fetch_count: AtomicU32,
    fail_create_thread: Mutex<Option<AgentError>>,
    fail_post_message: Mutex<Option<AgentError>>,
    fail_create_run: Mutex<Option<AgentError>>,
}

impl ScriptedBackend {
    /// Creates a backend that replays `statuses` and answers message listing
    /// with `reply`.
    #[must_use]
    pub fn new(
        statuses: impl IntoIterator<Item = RunStatus>,
        reply: impl IntoIterator<Item = AgentMessage>,
    ) -> Self {
        Self {
            statuses: Mutex::new(statuses.into_iter().collect()),
            reply: Mutex::new(reply.into_iter().collect()),
            ..Self::default()
        }
    }

    /// Makes `create_thread` fail with the given error.
    #[must_use]
    pub fn with_create_thread_error(self, error: AgentError) -> Self {
        *self.fail_create_thread.lock().expect("script poisoned") = Some(error);
        self
    }

    /// Makes `post_message` fail with the given error.
    #[must_use]
    pub fn with_post_message_error(self, error: AgentError) -> Self {
        *self.fail_post_message.lock().expect("script poisoned") = Some(error);
        self
    }

    /// Makes `create_run` fail with the given error.
    #[must_use]
    pub fn with_create_run_error(self, error: AgentError) -> Self {
        *self.fail_create_run.lock().expect("script poisoned") = Some(error);
        self
    }

    /// Number of `get_run` calls observed.
    #[must_use]
    pub fn polls(&self) -> u32 {
        self.poll_count.load(Ordering::SeqCst)
    }

    /// Number of `list_messages` calls observed.
    #[must_use]
    pub fn message_fetches(&self) -> u32 {
        self.message_fetch_count.load(Ordering::SeqCst)
    }

    /// Messages posted so far, with their thread.
    #[must_use]
    pub fn posted(&self) -> Vec<(ThreadId, String)> {
        self.posted.lock().expect("script poisoned").clone()
    }
}

#[async_trait]
impl AgentBackend for ScriptedBackend {
    async fn create_thread(&self) -> Result<ThreadInfo, AgentError> {
        if let Some(error) = self.fail_create_thread.lock().expect("script poisoned").clone() {
            return Err(error);
        }
        Ok(ThreadInfo {
            id: ThreadId::new("thread-scripted"),
        })
    }

    async fn get_thread(&self, thread: &ThreadId) -> Result<ThreadInfo, AgentError> {
        Ok(ThreadInfo { id: thread.clone() })
    }

    async fn post_message(&self, thread: &ThreadId, text: &str) -> Result<(), AgentError> {
        if let Some(error) = self.fail_post_message.lock().expect("script poisoned").clone() {
            return Err(error);
        }
        self.posted
            .lock()
            .expect("script poisoned")
            .push((thread.clone(), text.to_string()));
        Ok(())
    }

    async fn create_run(&self, thread: &ThreadId) -> Result<RunInfo, AgentError> {
        if let Some(error) = self.fail_create_run.lock().expect("script poisoned").clone() {
            return Err(error);
        }
        Ok(RunInfo {
            id: RunId::new("run-scripted"),
            thread_id: thread.clone(),
            status: RunStatus::Queued,
        })
    }

    async fn get_run(&self, _thread: &ThreadId, _run: &RunId) -> Result<RunStatus, AgentError> {
        self.poll_count.fetch_add(1, Ordering::SeqCst);
        let mut statuses = self.statuses.lock().expect("script poisoned");
        let mut last = self.last_status.lock().expect("script poisoned");
        let status = match statuses.pop_front() {
            Some(status) => {
                *last = Some(status);
                status
            }
            None => last.unwrap_or(RunStatus::Unknown),
        };
        Ok(status)
    }

    async fn list_messages(
        &self,
        _thread: &ThreadId,
        order: MessageOrder,
    ) -> Result<Vec<AgentMessage>, AgentError> {
        self.message_fetch_count.fetch_add(1, Ordering::SeqCst);
        let mut messages = self.reply.lock().expect("script poisoned").clone();
        if order == MessageOrder::Ascending {
            messages.reverse();
        }
        Ok(messages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn scripted_backend_replays_then_repeats_last() {
        let backend = ScriptedBackend::new(
            [RunStatus::Queued, RunStatus::Completed],
            [AgentMessage::assistant("done")],
        );
        let thread = ThreadId::new("t");
        let run = RunId::new("r");

        assert_eq!(
            backend.get_run(&thread, &run).await.unwrap(),
            RunStatus::Queued
        );
        assert_eq!(
            backend.get_run(&thread, &run).await.unwrap(),
            RunStatus::Completed
        );
        // Script exhausted; the terminal status repeats.
        assert_eq!(
            backend.get_run(&thread, &run).await.unwrap(),
            RunStatus::Completed
        );
        assert_eq!(backend.polls(), 3);
    }

    #[tokio::test]
    async fn scripted_backend_records_posts() {
        let backend = ScriptedBackend::new([], []);
        let thread = ThreadId::new("t1");
        backend.post_message(&thread, "hello").await.unwrap();

        let posted = backend.posted();
        assert_eq!(posted.len(), 1);
        assert_eq!(posted[0].1, "hello");
    }

    #[tokio::test]
    async fn injected_failures_surface() {
        let backend = ScriptedBackend::new([], []).with_create_run_error(
            AgentError::BackendUnavailable {
                details: "down".to_string(),
            },
        );
        let result = backend.create_run(&ThreadId::new("t")).await;
        assert!(matches!(
            result,
            Err(AgentError::BackendUnavailable { .. })
        ));
    }

    #[test]
    fn message_order_query_values() {
        assert_eq!(MessageOrder::Descending.as_query_value(), "desc");
        assert_eq!(MessageOrder::Ascending.as_query_value(), "asc");
    }
}
