//! AI agent-run integration: the backend boundary, the HTTP client for the
//! hosted agent service, and the job runner that drives a run to completion
//! with bounded polling.

pub mod backend;
pub mod card;
pub mod error;
pub mod http;
pub mod runner;
pub mod status;

pub use backend::{AgentBackend, AgentMessage, MessageOrder, RunInfo, ScriptedBackend, ThreadInfo};
pub use card::agent_reply_card;
pub use error::{AgentError, JobError};
pub use http::{HttpAgentBackend, HttpBackendConfig};
pub use runner::{JobHandle, JobOutcome, JobRunner, PollingPolicy};
pub use status::RunStatus;
