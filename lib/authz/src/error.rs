//! Error types for the authz crate.

use std::fmt;

/// Errors from the external token collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    /// Token acquisition failed.
    AcquisitionFailed { capability: String, details: String },
    /// Token exchange failed.
    ExchangeFailed { capability: String, details: String },
}

impl fmt::Display for TokenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AcquisitionFailed {
                capability,
                details,
            } => {
                write!(
                    f,
                    "failed to acquire token for capability '{capability}': {details}"
                )
            }
            Self::ExchangeFailed {
                capability,
                details,
            } => {
                write!(
                    f,
                    "failed to exchange token for capability '{capability}': {details}"
                )
            }
        }
    }
}

impl std::error::Error for TokenError {}
