//! Conversation state storage.
//!
//! The store is a plain key-value mapping from conversation identifier to
//! [`ConversationRecord`]. It provides no locking of its own; atomicity of
//! read-modify-write cycles comes from the caller serializing processing per
//! conversation (see [`crate::lock::ConversationLocks`]).

use crate::error::StateError;
use crate::record::ConversationRecord;
use async_trait::async_trait;
use herald_core::ConversationId;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Trait for conversation state storage.
#[async_trait]
pub trait ConversationStateStore: Send + Sync {
    /// Returns the record for a conversation, creating a default one if the
    /// conversation has never been seen.
    async fn get(&self, id: &ConversationId) -> Result<ConversationRecord, StateError>;

    /// Stores the record for a conversation, replacing any previous one.
    async fn set(&self, id: &ConversationId, record: ConversationRecord)
    -> Result<(), StateError>;

    /// Deletes the record for a conversation. Deleting an absent record is
    /// not an error.
    async fn delete(&self, id: &ConversationId) -> Result<(), StateError>;
}

/// In-memory conversation state store.
///
/// Records live for the lifetime of the process. This matches the reference
/// deployment shape; persistent backends implement the same trait.
#[derive(Debug, Default)]
pub struct MemoryStateStore {
    records: RwLock<HashMap<ConversationId, ConversationRecord>>,
}

impl MemoryStateStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of conversations with a stored record.
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    /// Returns true if no conversation has a stored record.
    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl ConversationStateStore for MemoryStateStore {
    async fn get(&self, id: &ConversationId) -> Result<ConversationRecord, StateError> {
        Ok(self
            .records
            .read()
            .await
            .get(id)
            .cloned()
            .unwrap_or_default())
    }

    async fn set(
        &self,
        id: &ConversationId,
        record: ConversationRecord,
    ) -> Result<(), StateError> {
        self.records.write().await.insert(id.clone(), record);
        Ok(())
    }

    async fn delete(&self, id: &ConversationId) -> Result<(), StateError> {
        self.records.write().await.remove(id);
        Ok(())
    }
}
