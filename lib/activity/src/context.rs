//! The context a handler sees while processing one activity.

use crate::activity::Activity;
use crate::error::ReplyError;
use crate::reply::{OutgoingMessage, ReplyChannel};
use herald_core::ConversationId;
use herald_state::ConversationRecord;
use serde_json::Value as JsonValue;

/// Everything a handler needs for one activity-processing cycle: the
/// activity, a mutable borrow of the conversation's record, and the reply
/// channel. The borrow is only valid for the duration of the cycle; the
/// surrounding service persists (or deletes) the record afterwards.
pub struct TurnContext<'a> {
    activity: &'a Activity,
    record: &'a mut ConversationRecord,
    replies: &'a dyn ReplyChannel,
    args: Option<String>,
    reset_requested: bool,
}

impl<'a> TurnContext<'a> {
    /// Creates a context for one activity-processing cycle.
    pub fn new(
        activity: &'a Activity,
        record: &'a mut ConversationRecord,
        replies: &'a dyn ReplyChannel,
    ) -> Self {
        Self {
            activity,
            record,
            replies,
            args: None,
            reset_requested: false,
        }
    }

    /// The activity being processed.
    #[must_use]
    pub fn activity(&self) -> &Activity {
        self.activity
    }

    /// The conversation identifier of the activity.
    #[must_use]
    pub fn conversation_id(&self) -> &ConversationId {
        self.activity.conversation_id()
    }

    /// The conversation's record, mutable for the duration of this cycle.
    pub fn record(&mut self) -> &mut ConversationRecord {
        self.record
    }

    /// Read-only view of the conversation's record.
    #[must_use]
    pub fn record_ref(&self) -> &ConversationRecord {
        self.record
    }

    /// The argument tail of the matched command, when the current binding
    /// matched via an exact-command matcher and arguments were present.
    #[must_use]
    pub fn args(&self) -> Option<&str> {
        self.args.as_deref()
    }

    pub(crate) fn set_args(&mut self, args: Option<String>) {
        self.args = args;
    }

    /// Sends a plain-text reply to the activity's conversation.
    ///
    /// # Errors
    ///
    /// Returns an error if the reply channel fails.
    pub async fn send_text(&self, text: impl Into<String>) -> Result<(), ReplyError> {
        self.replies
            .send(self.conversation_id(), OutgoingMessage::text(text))
            .await
    }

    /// Sends a card reply to the activity's conversation.
    ///
    /// # Errors
    ///
    /// Returns an error if the reply channel fails.
    pub async fn send_card(&self, payload: JsonValue) -> Result<(), ReplyError> {
        self.replies
            .send(self.conversation_id(), OutgoingMessage::card(payload))
            .await
    }

    /// Signals that the conversation's record should be deleted instead of
    /// persisted when this cycle ends.
    pub fn request_reset(&mut self) {
        self.reset_requested = true;
    }

    /// Returns true if a handler requested a state reset this cycle.
    #[must_use]
    pub fn reset_requested(&self) -> bool {
        self.reset_requested
    }
}
