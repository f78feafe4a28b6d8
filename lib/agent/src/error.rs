//! Error types for the agent crate.
//!
//! `AgentError` covers the backend boundary (HTTP transport, wire shape);
//! `JobError` covers the lifecycle of one run. The job kinds are deliberately
//! distinct: a run that the service reports as failed, a run that outlived
//! the polling deadline, and a service that violated the status protocol are
//! three different situations and callers report them differently.

use crate::status::RunStatus;
use std::fmt;

/// Errors from the agent backend boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AgentError {
    /// The backend could not be reached.
    BackendUnavailable { details: String },
    /// The backend answered with a non-success status.
    RequestFailed {
        operation: String,
        status: u16,
        details: String,
    },
    /// The backend's response did not have the expected shape.
    ResponseParseFailed { operation: String, details: String },
    /// The client configuration is unusable.
    InvalidConfig { reason: String },
}

impl fmt::Display for AgentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BackendUnavailable { details } => {
                write!(f, "agent backend unavailable: {details}")
            }
            Self::RequestFailed {
                operation,
                status,
                details,
            } => {
                write!(f, "agent {operation} request failed ({status}): {details}")
            }
            Self::ResponseParseFailed { operation, details } => {
                write!(f, "failed to parse agent {operation} response: {details}")
            }
            Self::InvalidConfig { reason } => {
                write!(f, "invalid agent backend configuration: {reason}")
            }
        }
    }
}

impl std::error::Error for AgentError {}

/// Errors from driving one run to completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobError {
    /// The run did not reach a terminal status within the polling deadline.
    DeadlineExceeded { waited_secs: u64 },
    /// The service reported the run as failed.
    RunFailed { status: RunStatus },
    /// The service reported a status sequence the run protocol does not
    /// allow, or a status this client does not know.
    ProtocolViolation { details: String },
    /// A backend call failed before or while driving the run.
    Backend(AgentError),
}

impl fmt::Display for JobError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DeadlineExceeded { waited_secs } => {
                write!(f, "run did not complete within {waited_secs}s")
            }
            Self::RunFailed { status } => {
                write!(f, "run ended with status '{status}'")
            }
            Self::ProtocolViolation { details } => {
                write!(f, "run status protocol violation: {details}")
            }
            Self::Backend(e) => write!(f, "agent backend error: {e}"),
        }
    }
}

impl std::error::Error for JobError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Backend(e) => Some(e),
            _ => None,
        }
    }
}

impl From<AgentError> for JobError {
    fn from(e: AgentError) -> Self {
        Self::Backend(e)
    }
}
