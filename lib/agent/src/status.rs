//! The run status state machine.

use std::fmt;

/// Status of an externally-owned agent run.
///
/// The wire carries free-form strings; everything this client does not
/// recognize maps to [`RunStatus::Unknown`], which the runner treats as a
/// protocol violation rather than silently polling forever.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    /// Accepted, not yet started.
    Queued,
    /// Currently executing.
    InProgress,
    /// Finished successfully; results are available.
    Completed,
    /// Finished unsuccessfully.
    Failed,
    /// A status string this client does not recognize.
    Unknown,
}

impl RunStatus {
    /// Parses a wire status string. Unrecognized values become `Unknown`.
    #[must_use]
    pub fn parse(status: &str) -> Self {
        match status {
            "queued" => Self::Queued,
            "in_progress" => Self::InProgress,
            "completed" => Self::Completed,
            "failed" => Self::Failed,
            _ => Self::Unknown,
        }
    }

    /// Returns true for statuses that end the run.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Returns true when observing `self` after `previous` is a legal
    /// progression. A run may report the same status across polls; it may
    /// never regress, and terminal statuses only repeat themselves.
    #[must_use]
    pub fn can_follow(self, previous: Self) -> bool {
        match previous {
            Self::Queued => matches!(
                self,
                Self::Queued | Self::InProgress | Self::Completed | Self::Failed
            ),
            Self::InProgress => {
                matches!(self, Self::InProgress | Self::Completed | Self::Failed)
            }
            Self::Completed => self == Self::Completed,
            Self::Failed => self == Self::Failed,
            Self::Unknown => false,
        }
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Queued => "queued",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_statuses() {
        assert_eq!(RunStatus::parse("queued"), RunStatus::Queued);
        assert_eq!(RunStatus::parse("in_progress"), RunStatus::InProgress);
        assert_eq!(RunStatus::parse("completed"), RunStatus::Completed);
        assert_eq!(RunStatus::parse("failed"), RunStatus::Failed);
    }

    #[test]
    fn unrecognized_statuses_map_to_unknown() {
        assert_eq!(RunStatus::parse("cancelled"), RunStatus::Unknown);
        assert_eq!(RunStatus::parse(""), RunStatus::Unknown);
        // Parsing is exact; casing is part of the protocol.
        assert_eq!(RunStatus::parse("Queued"), RunStatus::Unknown);
    }

    #[test]
    fn terminal_statuses() {
        assert!(RunStatus::Completed.is_terminal());
        assert!(RunStatus::Failed.is_terminal());
        assert!(!RunStatus::Queued.is_terminal());
        assert!(!RunStatus::InProgress.is_terminal());
    }

    #[test]
    fn forward_progressions_are_legal() {
        assert!(RunStatus::InProgress.can_follow(RunStatus::Queued));
        assert!(RunStatus::Completed.can_follow(RunStatus::Queued));
        assert!(RunStatus::Completed.can_follow(RunStatus::InProgress));
        assert!(RunStatus::Failed.can_follow(RunStatus::InProgress));
        assert!(RunStatus::InProgress.can_follow(RunStatus::InProgress));
    }

    #[test]
    fn regressions_and_terminal_exits_are_illegal() {
        assert!(!RunStatus::Queued.can_follow(RunStatus::InProgress));
        assert!(!RunStatus::Queued.can_follow(RunStatus::Completed));
        assert!(!RunStatus::InProgress.can_follow(RunStatus::Completed));
        assert!(!RunStatus::InProgress.can_follow(RunStatus::Failed));
        assert!(RunStatus::Completed.can_follow(RunStatus::Completed));
    }
}
