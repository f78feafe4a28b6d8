//! The bot service.
//!
//! One `handle` call processes one inbound activity end to end: serialize
//! on the conversation, load its record, resolve capabilities, dispatch
//! through the binding table, then persist or delete the record. Nothing
//! propagates out of `handle`; every failure becomes a log entry and, where
//! a handler could still speak, an in-band reply.

use herald_activity::{Activity, ActivityRouter, ReplyChannel, TurnContext};
use herald_authz::{Capability, CapabilitySnapshot, TokenProvider};
use herald_state::{ConversationLocks, ConversationRecord, ConversationStateStore};
use std::sync::Arc;
use tracing::{debug, warn};

/// Composes the router, state store, capability provider, and reply
/// channel into the per-activity processing cycle.
pub struct BotService {
    router: ActivityRouter,
    store: Arc<dyn ConversationStateStore>,
    locks: ConversationLocks,
    tokens: Arc<dyn TokenProvider>,
    replies: Arc<dyn ReplyChannel>,
    gated_capabilities: Vec<Capability>,
}

impl BotService {
    /// Creates the service.
    #[must_use]
    pub fn new(
        router: ActivityRouter,
        store: Arc<dyn ConversationStateStore>,
        tokens: Arc<dyn TokenProvider>,
        replies: Arc<dyn ReplyChannel>,
    ) -> Self {
        let gated_capabilities = router.required_capabilities();
        Self {
            router,
            store,
            locks: ConversationLocks::new(),
            tokens,
            replies,
            gated_capabilities,
        }
    }

    /// Processes one activity.
    ///
    /// Activities for the same conversation are serialized on a keyed
    /// lock; different conversations proceed concurrently. The record is
    /// read once, mutated by handlers through the turn context, and
    /// written back (or deleted, when a handler requested a reset) after
    /// dispatch.
    pub async fn handle(&self, activity: Activity) {
        let conversation = activity.conversation_id().clone();
        let _guard = self.locks.acquire(&conversation).await;

        let mut record = match self.store.get(&conversation).await {
            Ok(record) => record,
            Err(e) => {
                warn!(conversation = %conversation, error = %e, "state load failed, starting from a fresh record");
                ConversationRecord::new()
            }
        };

        let capabilities =
            CapabilitySnapshot::resolve(self.tokens.as_ref(), &self.gated_capabilities).await;

        let mut ctx = TurnContext::new(&activity, &mut record, self.replies.as_ref());
        let report = self.router.dispatch(&mut ctx, &capabilities).await;
        let reset_requested = ctx.reset_requested();
        drop(ctx);

        debug!(
            conversation = %conversation,
            matched = ?report.matched,
            skipped = ?report.skipped_gated,
            failed = ?report.failed,
            "activity dispatched"
        );

        if reset_requested {
            if let Err(e) = self.store.delete(&conversation).await {
                warn!(conversation = %conversation, error = %e, "state delete failed");
            }
        } else if let Err(e) = self.store.set(&conversation, record).await {
            warn!(conversation = %conversation, error = %e, "state persist failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use herald_activity::{
        ActivityHandler, HandlerError, Matcher, MemoryReplyChannel, RouterBuilder,
    };
    use herald_core::ConversationId;
    use herald_state::MemoryStateStore;
    use herald_authz::StaticTokenProvider;

    /// Increments the count and echoes, like the generic message binding.
    struct CountingHandler;

    #[async_trait]
    impl ActivityHandler for CountingHandler {
        async fn handle(&self, ctx: &mut TurnContext<'_>) -> Result<(), HandlerError> {
            let count = ctx.record().increment();
            let text = ctx.activity().trimmed_text().unwrap_or("").to_string();
            ctx.send_text(format!("[{count}] you said: {text}")).await?;
            Ok(())
        }
    }

    struct ResetHandler;

    #[async_trait]
    impl ActivityHandler for ResetHandler {
        async fn handle(&self, ctx: &mut TurnContext<'_>) -> Result<(), HandlerError> {
            ctx.request_reset();
            Ok(())
        }
    }

    fn service(replies: Arc<MemoryReplyChannel>) -> (BotService, Arc<MemoryStateStore>) {
        let store = Arc::new(MemoryStateStore::new());
        let router = RouterBuilder::new()
            .bind("reset", Matcher::command("/reset"), ResetHandler)
            .bind(
                "count",
                Matcher::type_pattern("^message$").unwrap(),
                CountingHandler,
            )
            .build();
        let service = BotService::new(
            router,
            store.clone(),
            Arc::new(StaticTokenProvider::empty()),
            replies,
        );
        (service, store)
    }

    #[tokio::test]
    async fn count_accumulates_across_sequential_messages() {
        let replies = Arc::new(MemoryReplyChannel::new());
        let (service, store) = service(replies.clone());
        let conversation = ConversationId::new("c1");

        for text in ["one", "two", "three"] {
            service
                .handle(Activity::message(conversation.clone(), text))
                .await;
        }

        let record = store.get(&conversation).await.unwrap();
        assert_eq!(record.count, 3);
        assert_eq!(
            replies.texts_for(&conversation),
            vec![
                "[1] you said: one",
                "[2] you said: two",
                "[3] you said: three"
            ]
        );
    }

    #[tokio::test]
    async fn conversations_are_isolated() {
        let replies = Arc::new(MemoryReplyChannel::new());
        let (service, store) = service(replies);

        service
            .handle(Activity::message(ConversationId::new("a"), "hi"))
            .await;
        service
            .handle(Activity::message(ConversationId::new("a"), "hi"))
            .await;
        service
            .handle(Activity::message(ConversationId::new("b"), "hi"))
            .await;

        assert_eq!(store.get(&ConversationId::new("a")).await.unwrap().count, 2);
        assert_eq!(store.get(&ConversationId::new("b")).await.unwrap().count, 1);
    }

    #[tokio::test]
    async fn concurrent_activities_on_one_conversation_serialize() {
        let replies = Arc::new(MemoryReplyChannel::new());
        let (service, store) = service(replies);
        let service = Arc::new(service);
        let conversation = ConversationId::new("busy");

        let mut handles = Vec::new();
        for _ in 0..10 {
            let service = service.clone();
            let conversation = conversation.clone();
            handles.push(tokio::spawn(async move {
                service
                    .handle(Activity::message(conversation, "ping"))
                    .await;
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        // Lost updates would leave the count below 10.
        assert_eq!(store.get(&conversation).await.unwrap().count, 10);
    }

    #[tokio::test]
    async fn reset_deletes_the_record_instead_of_persisting() {
        let replies = Arc::new(MemoryReplyChannel::new());
        let (service, store) = service(replies);
        let conversation = ConversationId::new("c1");

        service
            .handle(Activity::message(conversation.clone(), "hello"))
            .await;
        assert_eq!(store.len().await, 1);

        service
            .handle(Activity::message(conversation.clone(), "/reset"))
            .await;
        assert_eq!(store.len().await, 0);

        // The next message starts over from a fresh record.
        service
            .handle(Activity::message(conversation.clone(), "again"))
            .await;
        assert_eq!(store.get(&conversation).await.unwrap().count, 1);
    }
}
