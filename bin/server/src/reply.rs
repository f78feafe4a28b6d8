//! HTTP reply channel.
//!
//! Delivers outgoing messages back to the chat channel by posting reply
//! activities to the conversation's service URL. The service URL arrives on
//! each inbound activity; the channel remembers the most recent one per
//! conversation and falls back to a configured base URL for conversations
//! it has never seen an activity from.

use async_trait::async_trait;
use herald_activity::{OutgoingMessage, ReplyChannel, ReplyError};
use herald_core::ConversationId;
use reqwest::Client;
use serde_json::{Value as JsonValue, json};
use std::collections::HashMap;
use std::sync::RwLock;
use tracing::debug;

/// Reply channel that posts activities to the channel's REST surface.
pub struct HttpReplyChannel {
    client: Client,
    base_url: Option<String>,
    routes: RwLock<HashMap<ConversationId, String>>,
}

impl HttpReplyChannel {
    /// Creates a channel with an optional fallback base URL.
    #[must_use]
    pub fn new(base_url: Option<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.map(|url| url.trim_end_matches('/').to_string()),
            routes: RwLock::new(HashMap::new()),
        }
    }

    /// Records the service URL an activity arrived with, so replies to its
    /// conversation go back the same way.
    pub fn note_route(&self, conversation: &ConversationId, service_url: &str) {
        let mut routes = self.routes.write().expect("route table poisoned");
        routes.insert(
            conversation.clone(),
            service_url.trim_end_matches('/').to_string(),
        );
    }

    /// Resolves the delivery URL for a conversation.
    fn route_for(&self, conversation: &ConversationId) -> Option<String> {
        let routes = self.routes.read().expect("route table poisoned");
        routes
            .get(conversation)
            .cloned()
            .or_else(|| self.base_url.clone())
    }
}

/// Builds the reply activity body posted to the channel.
#[must_use]
pub fn reply_activity_payload(message: &OutgoingMessage) -> JsonValue {
    match message {
        OutgoingMessage::Text(text) => json!({
            "type": "message",
            "text": text,
        }),
        OutgoingMessage::Card(payload) => json!({
            "type": "message",
            "attachments": [payload],
        }),
    }
}

#[async_trait]
impl ReplyChannel for HttpReplyChannel {
    async fn send(
        &self,
        conversation: &ConversationId,
        message: OutgoingMessage,
    ) -> Result<(), ReplyError> {
        let base = self
            .route_for(conversation)
            .ok_or_else(|| ReplyError::ChannelUnavailable {
                conversation: conversation.as_str().to_string(),
            })?;

        let url = format!(
            "{base}/v3/conversations/{}/activities",
            conversation.as_str()
        );
        let body = reply_activity_payload(&message);

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| ReplyError::SendFailed {
                details: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ReplyError::SendFailed {
                details: format!("channel answered {status}"),
            });
        }

        debug!(conversation = %conversation, "reply delivered");
        Ok(())
    }
}
