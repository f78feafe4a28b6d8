//! Per-conversation mutual exclusion.
//!
//! The state store itself provides no locking, so two activities for the
//! same conversation could interleave their read-modify-write cycles and
//! lose count increments. `ConversationLocks` is a single-flight map keyed
//! by conversation identifier: holding the guard for a conversation
//! serializes all processing for that conversation while leaving other
//! conversations free to proceed.

use herald_core::ConversationId;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// A keyed mutex map providing one lock per conversation.
#[derive(Debug, Default)]
pub struct ConversationLocks {
    // Entries are created on first use and kept for the process lifetime,
    // bounded by the number of distinct conversations seen.
    locks: Mutex<HashMap<ConversationId, Arc<AsyncMutex<()>>>>,
}

impl ConversationLocks {
    /// Creates an empty lock map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquires the lock for a conversation, waiting if another activity for
    /// the same conversation is currently being processed.
    ///
    /// The returned guard must be held for the whole read-dispatch-persist
    /// cycle of one activity.
    pub async fn acquire(&self, id: &ConversationId) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().expect("conversation lock map poisoned");
            locks
                .entry(id.clone())
                .or_insert_with(|| Arc::new(AsyncMutex::new(())))
                .clone()
        };
        lock.lock_owned().await
    }

    /// Returns the number of conversations a lock has been created for.
    #[must_use]
    pub fn len(&self) -> usize {
        self.locks.lock().expect("conversation lock map poisoned").len()
    }

    /// Returns true if no lock has been created yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
