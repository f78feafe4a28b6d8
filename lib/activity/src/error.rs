//! Error types for the activity crate.
//!
//! The dispatch boundary converts all of these into log entries and
//! best-effort user replies; none of them abort a dispatch.

use std::fmt;

/// Errors from matcher construction or evaluation.
#[derive(Debug, Clone)]
pub enum MatcherError {
    /// A regex pattern failed to compile.
    InvalidPattern { pattern: String, details: String },
    /// An async predicate failed while evaluating an activity.
    PredicateFailed { details: String },
}

impl fmt::Display for MatcherError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidPattern { pattern, details } => {
                write!(f, "invalid matcher pattern '{pattern}': {details}")
            }
            Self::PredicateFailed { details } => {
                write!(f, "predicate evaluation failed: {details}")
            }
        }
    }
}

impl std::error::Error for MatcherError {}

/// Errors from the outbound reply channel.
#[derive(Debug, Clone)]
pub enum ReplyError {
    /// Sending the reply failed.
    SendFailed { details: String },
    /// No route to the conversation is known.
    ChannelUnavailable { conversation: String },
}

impl fmt::Display for ReplyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SendFailed { details } => write!(f, "failed to send reply: {details}"),
            Self::ChannelUnavailable { conversation } => {
                write!(f, "no reply route for conversation '{conversation}'")
            }
        }
    }
}

impl std::error::Error for ReplyError {}

/// Errors raised by an activity handler.
#[derive(Debug, Clone)]
pub enum HandlerError {
    /// Replying to the user failed.
    Reply(ReplyError),
    /// An external collaborator the handler depends on failed.
    External { collaborator: String, details: String },
    /// The handler's own logic failed.
    Failed { details: String },
}

impl fmt::Display for HandlerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Reply(e) => write!(f, "reply error: {e}"),
            Self::External {
                collaborator,
                details,
            } => {
                write!(f, "external collaborator '{collaborator}' failed: {details}")
            }
            Self::Failed { details } => write!(f, "handler failed: {details}"),
        }
    }
}

impl std::error::Error for HandlerError {}

impl From<ReplyError> for HandlerError {
    fn from(e: ReplyError) -> Self {
        Self::Reply(e)
    }
}
