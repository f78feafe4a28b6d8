//! The outbound reply boundary.
//!
//! The core builds reply payloads but never renders or transports them;
//! delivery belongs to the channel behind [`ReplyChannel`].

use crate::error::ReplyError;
use async_trait::async_trait;
use herald_core::ConversationId;
use serde_json::Value as JsonValue;
use std::sync::Mutex;

/// An outbound message. Card payloads are opaque to the core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutgoingMessage {
    /// Plain text.
    Text(String),
    /// A structured card payload, passed through to the channel unrendered.
    Card(JsonValue),
}

impl OutgoingMessage {
    /// Creates a text message.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    /// Creates a card message.
    #[must_use]
    pub fn card(payload: JsonValue) -> Self {
        Self::Card(payload)
    }

    /// Returns the text content, if this is a text message.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Card(_) => None,
        }
    }
}

/// Trait for the outbound reply channel.
#[async_trait]
pub trait ReplyChannel: Send + Sync {
    /// Sends a message to a conversation.
    async fn send(
        &self,
        conversation: &ConversationId,
        message: OutgoingMessage,
    ) -> Result<(), ReplyError>;
}

/// A reply channel that records everything it is asked to send.
///
/// Used by tests to assert on replies without a live channel.
#[derive(Debug, Default)]
pub struct MemoryReplyChannel {
    sent: Mutex<Vec<(ConversationId, OutgoingMessage)>>,
}

impl MemoryReplyChannel {
    /// Creates an empty recording channel.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns everything sent so far, in order.
    #[must_use]
    pub fn sent(&self) -> Vec<(ConversationId, OutgoingMessage)> {
        self.sent.lock().expect("reply log poisoned").clone()
    }

    /// Returns the text messages sent to one conversation, in order.
    #[must_use]
    pub fn texts_for(&self, conversation: &ConversationId) -> Vec<String> {
        self.sent()
            .into_iter()
            .filter(|(conv, _)| conv == conversation)
            .filter_map(|(_, message)| message.as_text().map(str::to_string))
            .collect()
    }
}

#[async_trait]
impl ReplyChannel for MemoryReplyChannel {
    async fn send(
        &self,
        conversation: &ConversationId,
        message: OutgoingMessage,
    ) -> Result<(), ReplyError> {
        self.sent
            .lock()
            .expect("reply log poisoned")
            .push((conversation.clone(), message));
        Ok(())
    }
}
