//! The per-conversation record.

use herald_core::ThreadId;
use serde::{Deserialize, Serialize};

/// The small mutable record kept for each conversation.
///
/// Created lazily on first access, mutated by handlers during one
/// activity-processing cycle, and deleted on explicit reset. Ownership stays
/// with the state store; handlers only ever see a borrow.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationRecord {
    /// Number of message-type activities processed for this conversation.
    /// Only ever moves up, by exactly one per counted message.
    pub count: u64,
    /// Agent thread backing this conversation, once one has been created.
    pub thread_id: Option<ThreadId>,
}

impl ConversationRecord {
    /// Creates a fresh record with a zero count and no agent thread.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Increments the message count and returns the new value.
    pub fn increment(&mut self) -> u64 {
        self.count += 1;
        self.count
    }

    /// Records the agent thread backing this conversation.
    pub fn set_thread(&mut self, thread_id: ThreadId) {
        self.thread_id = Some(thread_id);
    }

    /// Returns true if no activity has ever been counted for this record.
    #[must_use]
    pub fn is_fresh(&self) -> bool {
        self.count == 0 && self.thread_id.is_none()
    }
}
