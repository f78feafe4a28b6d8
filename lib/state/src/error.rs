//! Error types for the state crate.

use std::fmt;

/// Errors from conversation state storage.
///
/// The in-memory store never fails, but the trait carries an error type so
/// persistent backends can report theirs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateError {
    /// The backing store failed.
    Backend { details: String },
    /// A stored record could not be encoded or decoded.
    Serialization { details: String },
}

impl fmt::Display for StateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Backend { details } => write!(f, "state store backend error: {details}"),
            Self::Serialization { details } => {
                write!(f, "state record serialization error: {details}")
            }
        }
    }
}

impl std::error::Error for StateError {}
