//! The inbound activity model.
//!
//! An activity is one conversational event delivered by the transport
//! layer: a user message, a membership change, and so on. Activities are
//! immutable once received. The `type` field is a free-form string on the
//! wire; well-known values live in [`activity_types`].

use herald_core::ConversationId;
use serde::{Deserialize, Serialize};

/// Well-known activity type values.
pub mod activity_types {
    /// A user message.
    pub const MESSAGE: &str = "message";
    /// A conversation membership or metadata change.
    pub const CONVERSATION_UPDATE: &str = "conversationUpdate";
}

/// A participant reference carried on an activity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelAccount {
    /// Channel-assigned account identifier.
    pub id: String,
    /// Display name, when the channel provides one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl ChannelAccount {
    /// Creates an account reference.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
        }
    }
}

/// The conversation an activity belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationReference {
    /// Channel-assigned conversation identifier.
    pub id: ConversationId,
    /// Display name, when the channel provides one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// One inbound conversational event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    /// Channel-assigned activity identifier, when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Free-form activity type, e.g. "message" or "conversationUpdate".
    #[serde(rename = "type")]
    pub activity_type: String,
    /// Message text, for message-type activities.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// The conversation this activity belongs to.
    pub conversation: ConversationReference,
    /// The sender, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<ChannelAccount>,
    /// Members added, for conversationUpdate activities.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub members_added: Vec<ChannelAccount>,
    /// Channel endpoint replies should be routed to. Opaque to the core.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_url: Option<String>,
}

impl Activity {
    /// Creates a message activity.
    #[must_use]
    pub fn message(conversation: ConversationId, text: impl Into<String>) -> Self {
        Self {
            id: None,
            activity_type: activity_types::MESSAGE.to_string(),
            text: Some(text.into()),
            conversation: ConversationReference {
                id: conversation,
                name: None,
            },
            from: None,
            members_added: Vec::new(),
            service_url: None,
        }
    }

    /// Creates a conversationUpdate activity announcing added members.
    #[must_use]
    pub fn members_added(
        conversation: ConversationId,
        members: impl IntoIterator<Item = ChannelAccount>,
    ) -> Self {
        Self {
            id: None,
            activity_type: activity_types::CONVERSATION_UPDATE.to_string(),
            text: None,
            conversation: ConversationReference {
                id: conversation,
                name: None,
            },
            from: None,
            members_added: members.into_iter().collect(),
            service_url: None,
        }
    }

    /// Returns the conversation identifier.
    #[must_use]
    pub fn conversation_id(&self) -> &ConversationId {
        &self.conversation.id
    }

    /// Returns true for message-type activities.
    #[must_use]
    pub fn is_message(&self) -> bool {
        self.activity_type == activity_types::MESSAGE
    }

    /// Returns the message text with surrounding whitespace removed, if any.
    #[must_use]
    pub fn trimmed_text(&self) -> Option<&str> {
        self.text.as_deref().map(str::trim).filter(|t| !t.is_empty())
    }
}
