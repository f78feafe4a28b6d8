//! The canonical binding table.
//!
//! One ordered table serves every deployment; optional bindings are
//! appended behind feature flags from configuration. Registration order is
//! dispatch order, and several bindings deliberately overlap (a command
//! message also matches the regex and predicate demos) to exercise the
//! non-short-circuit dispatch.

use crate::config::FeatureFlags;
use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use herald_activity::{
    ActivityHandler, ActivityPredicate, ActivityRouter, HandlerError, Matcher, MatcherError,
    RouterBuilder, TurnContext, activity_types,
};
use herald_agent::{AgentError, JobError, JobRunner, agent_reply_card};
use herald_authz::Capability;
use serde_json::json;
use std::sync::Arc;
use tracing::warn;

/// Version string reported by /runtime and the welcome greeting.
const SERVICE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Builds the binding table for the configured feature set.
///
/// # Errors
///
/// Returns an error if a built-in pattern fails to compile; callers treat
/// this as a bootstrap failure.
pub fn binding_table(
    flags: &FeatureFlags,
    runner: Option<Arc<JobRunner>>,
    model_name: Option<String>,
) -> Result<ActivityRouter, MatcherError> {
    let mut builder = RouterBuilder::new()
        .bind("reset", Matcher::command("/reset"), ResetHandler)
        .bind("count", Matcher::command("/count"), CountReportHandler)
        .bind("diag", Matcher::command("/diag"), DiagHandler)
        .bind("state", Matcher::command("/state"), StateHandler)
        .bind(
            "runtime",
            Matcher::command("/runtime"),
            RuntimeHandler { model_name },
        )
        .bind(
            "base64url",
            Matcher::command("/base64url"),
            Base64UrlHandler,
        )
        .bind(
            "welcome",
            Matcher::predicate(MembersAddedPredicate),
            WelcomeHandler,
        )
        .bind(
            "echo",
            Matcher::type_pattern("^message$")?,
            EchoHandler,
        )
        .bind(
            "regex-demo",
            Matcher::type_pattern("^message")?,
            RegexDemoHandler,
        )
        .bind(
            "predicate-demo",
            Matcher::predicate(IsMessagePredicate),
            PredicateDemoHandler,
        );

    if flags.enable_agent {
        if let Some(runner) = runner {
            builder = builder.bind("agent", Matcher::command("/agent"), AgentHandler { runner });
        } else {
            warn!("agent feature enabled but the agent backend is not configured; skipping the /agent binding");
        }
    }

    if flags.enable_auth_demo {
        builder = builder.bind_gated(
            "whoami",
            Matcher::command("/whoami"),
            WhoamiHandler,
            vec![Capability::agent_session()],
        );
    }

    Ok(builder.build())
}

/// Matches conversationUpdate activities that announce new members.
struct MembersAddedPredicate;

#[async_trait]
impl ActivityPredicate for MembersAddedPredicate {
    async fn test(
        &self,
        activity: &herald_activity::Activity,
    ) -> Result<bool, MatcherError> {
        Ok(activity.activity_type == activity_types::CONVERSATION_UPDATE
            && !activity.members_added.is_empty())
    }
}

/// Matches message activities through the async predicate path.
struct IsMessagePredicate;

#[async_trait]
impl ActivityPredicate for IsMessagePredicate {
    async fn test(
        &self,
        activity: &herald_activity::Activity,
    ) -> Result<bool, MatcherError> {
        Ok(activity.activity_type == activity_types::MESSAGE)
    }
}

struct ResetHandler;

#[async_trait]
impl ActivityHandler for ResetHandler {
    async fn handle(&self, ctx: &mut TurnContext<'_>) -> Result<(), HandlerError> {
        ctx.request_reset();
        ctx.send_text("Ok I've deleted the current conversation state.")
            .await?;
        Ok(())
    }
}

struct CountReportHandler;

#[async_trait]
impl ActivityHandler for CountReportHandler {
    async fn handle(&self, ctx: &mut TurnContext<'_>) -> Result<(), HandlerError> {
        let count = ctx.record_ref().count;
        ctx.send_text(format!("The count is {count}")).await?;
        Ok(())
    }
}

struct DiagHandler;

#[async_trait]
impl ActivityHandler for DiagHandler {
    async fn handle(&self, ctx: &mut TurnContext<'_>) -> Result<(), HandlerError> {
        let body = serde_json::to_string(ctx.activity()).map_err(|e| HandlerError::Failed {
            details: format!("activity serialization failed: {e}"),
        })?;
        ctx.send_text(body).await?;
        Ok(())
    }
}

struct StateHandler;

#[async_trait]
impl ActivityHandler for StateHandler {
    async fn handle(&self, ctx: &mut TurnContext<'_>) -> Result<(), HandlerError> {
        let body = serde_json::to_string(ctx.record_ref()).map_err(|e| HandlerError::Failed {
            details: format!("record serialization failed: {e}"),
        })?;
        ctx.send_text(body).await?;
        Ok(())
    }
}

struct RuntimeHandler {
    model_name: Option<String>,
}

#[async_trait]
impl ActivityHandler for RuntimeHandler {
    async fn handle(&self, ctx: &mut TurnContext<'_>) -> Result<(), HandlerError> {
        let mut runtime = json!({
            "service": env!("CARGO_PKG_NAME"),
            "version": SERVICE_VERSION,
        });
        if let Some(model) = &self.model_name {
            runtime["model"] = json!(model);
        }
        ctx.send_text(runtime.to_string()).await?;
        Ok(())
    }
}

struct Base64UrlHandler;

#[async_trait]
impl ActivityHandler for Base64UrlHandler {
    async fn handle(&self, ctx: &mut TurnContext<'_>) -> Result<(), HandlerError> {
        let reply = match ctx.args() {
            Some(args) => URL_SAFE_NO_PAD.encode(args),
            None => "Nothing to encode.".to_string(),
        };
        ctx.send_text(reply).await?;
        Ok(())
    }
}

struct WelcomeHandler;

#[async_trait]
impl ActivityHandler for WelcomeHandler {
    async fn handle(&self, ctx: &mut TurnContext<'_>) -> Result<(), HandlerError> {
        ctx.send_text(format!(
            "Hello from herald running version: {SERVICE_VERSION}"
        ))
        .await?;
        Ok(())
    }
}

/// The generic message binding: counts and echoes what the user said.
///
/// Command-shaped messages (leading `/`) are claimed by their command
/// bindings and pass through here without incrementing or echoing, so the
/// counter tracks conversational messages only.
struct EchoHandler;

#[async_trait]
impl ActivityHandler for EchoHandler {
    async fn handle(&self, ctx: &mut TurnContext<'_>) -> Result<(), HandlerError> {
        let Some(text) = ctx.activity().trimmed_text().map(str::to_string) else {
            return Ok(());
        };
        if text.starts_with('/') {
            return Ok(());
        }
        let count = ctx.record().increment();
        ctx.send_text(format!("[{count}] you said: {text}")).await?;
        Ok(())
    }
}

struct RegexDemoHandler;

#[async_trait]
impl ActivityHandler for RegexDemoHandler {
    async fn handle(&self, ctx: &mut TurnContext<'_>) -> Result<(), HandlerError> {
        let activity_type = ctx.activity().activity_type.clone();
        ctx.send_text(format!("Matched with regex: {activity_type}"))
            .await?;
        Ok(())
    }
}

struct PredicateDemoHandler;

#[async_trait]
impl ActivityHandler for PredicateDemoHandler {
    async fn handle(&self, ctx: &mut TurnContext<'_>) -> Result<(), HandlerError> {
        let activity_type = ctx.activity().activity_type.clone();
        ctx.send_text(format!("Matched function: {activity_type}"))
            .await?;
        Ok(())
    }
}

/// Submits the prompt to the hosted agent and replies with its answer.
struct AgentHandler {
    runner: Arc<JobRunner>,
}

#[async_trait]
impl ActivityHandler for AgentHandler {
    async fn handle(&self, ctx: &mut TurnContext<'_>) -> Result<(), HandlerError> {
        let Some(prompt) = ctx.args().map(str::to_string) else {
            ctx.send_text("Give me a prompt, e.g. `/agent what's on my calendar?`")
                .await?;
            return Ok(());
        };

        let thread_hint = ctx.record_ref().thread_id.clone();
        let handle = match self.runner.submit(thread_hint.as_ref(), &prompt).await {
            Ok(handle) => handle,
            Err(e) => {
                warn!(error = %e, "agent job submission failed");
                ctx.send_text(submit_failure_reply(&e)).await?;
                return Ok(());
            }
        };

        // The thread survives the conversation's turns; later prompts
        // continue it.
        ctx.record().set_thread(handle.thread_id.clone());

        match self.runner.await_completion(&handle).await {
            Ok(outcome) => {
                ctx.send_card(agent_reply_card(&outcome.text)).await?;
            }
            Err(e) => {
                warn!(error = %e, run = %handle.run_id, "agent job did not complete");
                ctx.send_text(completion_failure_reply(&e)).await?;
            }
        }
        Ok(())
    }
}

/// User-visible message for a failure before the run existed. Each external
/// failure point gets its own wording so the user can tell them apart.
fn submit_failure_reply(error: &JobError) -> String {
    match error {
        JobError::Backend(AgentError::BackendUnavailable { .. }) => {
            "I couldn't reach the agent service.".to_string()
        }
        JobError::Backend(AgentError::RequestFailed { operation, .. }) => {
            match operation.as_str() {
                "create_thread" | "get_thread" => {
                    "I couldn't set up a conversation thread with the agent.".to_string()
                }
                "post_message" => "I couldn't deliver your message to the agent.".to_string(),
                "create_run" => "I couldn't start the agent run.".to_string(),
                _ => "The agent service rejected the request.".to_string(),
            }
        }
        _ => "Something went wrong talking to the agent service.".to_string(),
    }
}

/// User-visible message for a failure while awaiting the run.
fn completion_failure_reply(error: &JobError) -> String {
    match error {
        JobError::DeadlineExceeded { waited_secs } => {
            format!("The agent didn't answer within {waited_secs}s. Please try again.")
        }
        JobError::RunFailed { status } => {
            format!("The agent run ended with status '{status}'.")
        }
        JobError::ProtocolViolation { .. } => {
            "The agent service answered in an unexpected way.".to_string()
        }
        JobError::Backend(_) => "I lost contact with the agent service.".to_string(),
    }
}

struct WhoamiHandler;

#[async_trait]
impl ActivityHandler for WhoamiHandler {
    async fn handle(&self, ctx: &mut TurnContext<'_>) -> Result<(), HandlerError> {
        ctx.send_text("You are authorized: the agent-session capability is active.")
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::BotService;
    use herald_activity::{Activity, ChannelAccount, MemoryReplyChannel};
    use herald_agent::{AgentMessage, PollingPolicy, RunStatus, ScriptedBackend};
    use herald_authz::{AccessToken, StaticTokenProvider, TokenProvider};
    use herald_core::ConversationId;
    use herald_state::{ConversationStateStore, MemoryStateStore};
    use std::time::Duration;

    fn flags(agent: bool, auth: bool) -> FeatureFlags {
        FeatureFlags {
            enable_agent: agent,
            enable_auth_demo: auth,
        }
    }

    fn scripted_runner(backend: ScriptedBackend) -> Arc<JobRunner> {
        Arc::new(JobRunner::new(
            Arc::new(backend),
            PollingPolicy {
                interval: Duration::from_millis(5),
                max_wait: Duration::from_secs(2),
            },
        ))
    }

    struct Harness {
        service: BotService,
        store: Arc<MemoryStateStore>,
        replies: Arc<MemoryReplyChannel>,
    }

    fn harness_with(
        flags: FeatureFlags,
        runner: Option<Arc<JobRunner>>,
        tokens: Arc<dyn TokenProvider>,
    ) -> Harness {
        let router = binding_table(&flags, runner, None).expect("binding table");
        let store = Arc::new(MemoryStateStore::new());
        let replies = Arc::new(MemoryReplyChannel::new());
        let service = BotService::new(router, store.clone(), tokens, replies.clone());
        Harness {
            service,
            store,
            replies,
        }
    }

    fn harness() -> Harness {
        harness_with(
            flags(false, false),
            None,
            Arc::new(StaticTokenProvider::empty()),
        )
    }

    fn conv() -> ConversationId {
        ConversationId::new("c1")
    }

    #[tokio::test]
    async fn plain_message_echoes_with_count_and_demo_replies() {
        let h = harness();
        h.service.handle(Activity::message(conv(), "hello")).await;

        let texts = h.replies.texts_for(&conv());
        assert_eq!(
            texts,
            vec![
                "[1] you said: hello",
                "Matched with regex: message",
                "Matched function: message",
            ]
        );
    }

    #[tokio::test]
    async fn count_reset_count_round_trip() {
        let h = harness();
        for text in ["/count", "/reset", "/count"] {
            h.service.handle(Activity::message(conv(), text)).await;
        }

        let texts = h.replies.texts_for(&conv());
        assert!(texts.contains(&"The count is 0".to_string()));
        assert!(texts.contains(&"Ok I've deleted the current conversation state.".to_string()));
        // Commands never increment, so both /count replies read zero.
        assert_eq!(
            texts.iter().filter(|t| *t == "The count is 0").count(),
            2
        );
    }

    #[tokio::test]
    async fn count_reflects_processed_messages() {
        let h = harness();
        h.service.handle(Activity::message(conv(), "one")).await;
        h.service.handle(Activity::message(conv(), "two")).await;
        h.service.handle(Activity::message(conv(), "/count")).await;

        let texts = h.replies.texts_for(&conv());
        assert!(texts.contains(&"The count is 2".to_string()));
    }

    #[tokio::test]
    async fn base64url_command_coexists_with_demo_bindings() {
        let h = harness();
        h.service
            .handle(Activity::message(conv(), "/base64url hello"))
            .await;

        let texts = h.replies.texts_for(&conv());
        // "hello" in unpadded base64url.
        assert_eq!(
            texts,
            vec![
                "aGVsbG8",
                "Matched with regex: message",
                "Matched function: message",
            ]
        );
    }

    #[tokio::test]
    async fn base64url_without_arguments_explains_itself() {
        let h = harness();
        h.service
            .handle(Activity::message(conv(), "/base64url"))
            .await;
        assert!(
            h.replies
                .texts_for(&conv())
                .contains(&"Nothing to encode.".to_string())
        );
    }

    #[tokio::test]
    async fn diag_replies_with_the_activity_json() {
        let h = harness();
        h.service.handle(Activity::message(conv(), "/diag")).await;

        let texts = h.replies.texts_for(&conv());
        let diag = texts.first().expect("diag reply");
        let parsed: serde_json::Value = serde_json::from_str(diag).expect("valid json");
        assert_eq!(parsed["type"], json!("message"));
        assert_eq!(parsed["text"], json!("/diag"));
    }

    #[tokio::test]
    async fn state_replies_with_the_record_json() {
        let h = harness();
        h.service.handle(Activity::message(conv(), "hi")).await;
        h.service.handle(Activity::message(conv(), "/state")).await;

        let texts = h.replies.texts_for(&conv());
        let state = texts
            .iter()
            .find(|t| t.starts_with('{'))
            .expect("state reply");
        let parsed: serde_json::Value = serde_json::from_str(state).expect("valid json");
        assert_eq!(parsed["count"], json!(1));
    }

    #[tokio::test]
    async fn runtime_reports_service_and_version() {
        let h = harness();
        h.service
            .handle(Activity::message(conv(), "/runtime"))
            .await;

        let texts = h.replies.texts_for(&conv());
        let parsed: serde_json::Value =
            serde_json::from_str(texts.first().expect("runtime reply")).expect("valid json");
        assert_eq!(parsed["version"], json!(SERVICE_VERSION));
    }

    #[tokio::test]
    async fn members_added_triggers_the_welcome() {
        let h = harness();
        h.service
            .handle(Activity::members_added(
                conv(),
                [ChannelAccount::new("user-1")],
            ))
            .await;

        let texts = h.replies.texts_for(&conv());
        assert_eq!(texts.len(), 1);
        assert!(texts[0].starts_with("Hello from herald"));
        assert!(texts[0].contains(SERVICE_VERSION));
    }

    #[tokio::test]
    async fn conversation_update_without_members_is_silent() {
        let h = harness();
        h.service
            .handle(Activity::members_added(conv(), []))
            .await;
        assert!(h.replies.texts_for(&conv()).is_empty());
    }

    #[tokio::test]
    async fn agent_command_replies_with_a_card_and_keeps_the_thread() {
        let runner = scripted_runner(ScriptedBackend::new(
            [RunStatus::Queued, RunStatus::Completed],
            [AgentMessage::assistant("42, obviously")],
        ));
        let h = harness_with(
            flags(true, false),
            Some(runner),
            Arc::new(StaticTokenProvider::empty()),
        );

        h.service
            .handle(Activity::message(conv(), "/agent what is the answer?"))
            .await;

        let sent = h.replies.sent();
        let card = sent
            .iter()
            .find_map(|(_, message)| match message {
                herald_activity::OutgoingMessage::Card(payload) => Some(payload.clone()),
                herald_activity::OutgoingMessage::Text(_) => None,
            })
            .expect("card reply");
        assert_eq!(card["content"]["body"][0]["text"], json!("42, obviously"));

        let record = h.store.get(&conv()).await.unwrap();
        assert_eq!(
            record.thread_id.as_ref().map(|t| t.as_str()),
            Some("thread-scripted")
        );
    }

    #[tokio::test]
    async fn agent_failure_points_get_distinct_replies() {
        let backend = ScriptedBackend::new([], []).with_create_run_error(
            AgentError::RequestFailed {
                operation: "create_run".to_string(),
                status: 503,
                details: "busy".to_string(),
            },
        );
        let h = harness_with(
            flags(true, false),
            Some(scripted_runner(backend)),
            Arc::new(StaticTokenProvider::empty()),
        );

        h.service
            .handle(Activity::message(conv(), "/agent hello"))
            .await;

        assert!(
            h.replies
                .texts_for(&conv())
                .contains(&"I couldn't start the agent run.".to_string())
        );
    }

    #[tokio::test]
    async fn failed_run_reply_names_the_status() {
        let runner = scripted_runner(ScriptedBackend::new([RunStatus::Failed], []));
        let h = harness_with(
            flags(true, false),
            Some(runner),
            Arc::new(StaticTokenProvider::empty()),
        );

        h.service
            .handle(Activity::message(conv(), "/agent hello"))
            .await;

        assert!(
            h.replies
                .texts_for(&conv())
                .contains(&"The agent run ended with status 'failed'.".to_string())
        );
    }

    #[tokio::test]
    async fn whoami_is_skipped_without_the_capability() {
        let h = harness_with(
            flags(false, true),
            None,
            Arc::new(StaticTokenProvider::empty()),
        );

        h.service.handle(Activity::message(conv(), "/whoami")).await;

        // Only the demo bindings answer; the gated binding never runs.
        let texts = h.replies.texts_for(&conv());
        assert!(!texts.iter().any(|t| t.contains("authorized")));
    }

    #[tokio::test]
    async fn whoami_answers_when_the_capability_is_satisfied() {
        let tokens = StaticTokenProvider::empty()
            .with_token(Capability::agent_session(), AccessToken::new("token"));
        let h = harness_with(flags(false, true), None, Arc::new(tokens));

        h.service.handle(Activity::message(conv(), "/whoami")).await;

        assert!(
            h.replies
                .texts_for(&conv())
                .iter()
                .any(|t| t.contains("agent-session capability is active"))
        );
    }
}
