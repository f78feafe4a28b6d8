//! Activity matchers.
//!
//! A matcher decides whether a binding applies to an inbound activity. The
//! closed variants cover exact command and regex matching; the predicate
//! variant accepts arbitrary async logic behind a trait object. All forms
//! answer the same question: `evaluate(activity) -> bool`.

use crate::activity::Activity;
use crate::error::MatcherError;
use async_trait::async_trait;
use regex::Regex;
use std::fmt;
use std::sync::Arc;

/// An arbitrary asynchronous predicate over an activity.
#[async_trait]
pub trait ActivityPredicate: Send + Sync {
    /// Tests the activity. An `Err` is treated as "does not match" by the
    /// dispatcher, never as a dispatch failure.
    async fn test(&self, activity: &Activity) -> Result<bool, MatcherError>;
}

/// How a binding decides whether it applies to an activity.
#[derive(Clone)]
pub enum Matcher {
    /// Matches when the first whitespace token of the trimmed text equals
    /// the command string (case-sensitive). Remaining tokens are the
    /// command's arguments and are passed through untouched.
    Command(String),
    /// Matches when the regex tests true against the activity type.
    /// No anchoring is assumed beyond what the pattern itself carries.
    TypePattern(Regex),
    /// Matches when the regex tests true against the activity text.
    TextPattern(Regex),
    /// Matches when the async predicate returns true.
    Predicate(Arc<dyn ActivityPredicate>),
}

impl Matcher {
    /// Creates an exact-command matcher.
    #[must_use]
    pub fn command(command: impl Into<String>) -> Self {
        Self::Command(command.into())
    }

    /// Creates a regex matcher over the activity type.
    ///
    /// # Errors
    ///
    /// Returns an error if the pattern does not compile.
    pub fn type_pattern(pattern: &str) -> Result<Self, MatcherError> {
        Regex::new(pattern)
            .map(Self::TypePattern)
            .map_err(|e| MatcherError::InvalidPattern {
                pattern: pattern.to_string(),
                details: e.to_string(),
            })
    }

    /// Creates a regex matcher over the activity text.
    ///
    /// # Errors
    ///
    /// Returns an error if the pattern does not compile.
    pub fn text_pattern(pattern: &str) -> Result<Self, MatcherError> {
        Regex::new(pattern)
            .map(Self::TextPattern)
            .map_err(|e| MatcherError::InvalidPattern {
                pattern: pattern.to_string(),
                details: e.to_string(),
            })
    }

    /// Creates a predicate matcher.
    #[must_use]
    pub fn predicate(predicate: impl ActivityPredicate + 'static) -> Self {
        Self::Predicate(Arc::new(predicate))
    }

    /// Evaluates the matcher against an activity.
    ///
    /// # Errors
    ///
    /// Returns an error only for predicate evaluation failures; the
    /// dispatcher logs these and treats them as a non-match.
    pub async fn evaluate(&self, activity: &Activity) -> Result<bool, MatcherError> {
        match self {
            Self::Command(command) => Ok(command_matches(activity, command)),
            Self::TypePattern(regex) => Ok(regex.is_match(&activity.activity_type)),
            Self::TextPattern(regex) => Ok(activity
                .text
                .as_deref()
                .is_some_and(|text| regex.is_match(text))),
            Self::Predicate(predicate) => predicate.test(activity).await,
        }
    }
}

impl fmt::Debug for Matcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Command(command) => f.debug_tuple("Command").field(command).finish(),
            Self::TypePattern(regex) => f.debug_tuple("TypePattern").field(&regex.as_str()).finish(),
            Self::TextPattern(regex) => f.debug_tuple("TextPattern").field(&regex.as_str()).finish(),
            Self::Predicate(_) => f.write_str("Predicate(..)"),
        }
    }
}

/// Returns true when the first whitespace token of the activity's trimmed
/// text equals the command string, which also covers the no-argument case
/// where the whole trimmed text is the command.
fn command_matches(activity: &Activity, command: &str) -> bool {
    activity
        .trimmed_text()
        .and_then(|text| text.split_whitespace().next())
        .is_some_and(|first| first == command)
}

/// Extracts the argument tail of a command invocation: everything after the
/// command token, with leading whitespace removed and otherwise untouched.
#[must_use]
pub fn command_arguments<'a>(text: &'a str, command: &str) -> Option<&'a str> {
    let trimmed = text.trim();
    let rest = trimmed.strip_prefix(command)?;
    if rest.is_empty() {
        return None;
    }
    // Require a token boundary so "/countx" is not "/count" plus args.
    if !rest.starts_with(char::is_whitespace) {
        return None;
    }
    let args = rest.trim_start();
    (!args.is_empty()).then_some(args)
}

#[cfg(test)]
mod tests {
    use super::*;
    use herald_core::ConversationId;

    fn message(text: &str) -> Activity {
        Activity::message(ConversationId::new("c1"), text)
    }

    #[tokio::test]
    async fn command_matches_exact_text() {
        let matcher = Matcher::command("/count");
        assert!(matcher.evaluate(&message("/count")).await.unwrap());
    }

    #[tokio::test]
    async fn command_matches_with_arguments_and_padding() {
        let matcher = Matcher::command("/base64url");
        assert!(matcher.evaluate(&message("  /base64url hello world  ")).await.unwrap());
    }

    #[tokio::test]
    async fn command_is_case_sensitive() {
        let matcher = Matcher::command("/count");
        assert!(!matcher.evaluate(&message("/Count")).await.unwrap());
    }

    #[tokio::test]
    async fn command_requires_token_boundary() {
        let matcher = Matcher::command("/count");
        assert!(!matcher.evaluate(&message("/countx")).await.unwrap());
        assert!(!matcher.evaluate(&message("say /count")).await.unwrap());
    }

    #[tokio::test]
    async fn command_ignores_textless_activities() {
        let matcher = Matcher::command("/count");
        let activity = Activity::members_added(ConversationId::new("c1"), []);
        assert!(!matcher.evaluate(&activity).await.unwrap());
    }

    #[tokio::test]
    async fn type_pattern_is_unanchored() {
        let matcher = Matcher::type_pattern("^message").unwrap();
        assert!(matcher.evaluate(&message("hi")).await.unwrap());

        let substring = Matcher::type_pattern("essag").unwrap();
        assert!(substring.evaluate(&message("hi")).await.unwrap());

        let update = Activity::members_added(ConversationId::new("c1"), []);
        assert!(!matcher.evaluate(&update).await.unwrap());
    }

    #[tokio::test]
    async fn text_pattern_matches_text() {
        let matcher = Matcher::text_pattern(r"\bweather\b").unwrap();
        assert!(matcher.evaluate(&message("what's the weather today")).await.unwrap());
        assert!(!matcher.evaluate(&message("whats the weatherman up to")).await.unwrap());
    }

    #[tokio::test]
    async fn invalid_pattern_is_a_construction_error() {
        let result = Matcher::type_pattern("^(message");
        assert!(matches!(result, Err(MatcherError::InvalidPattern { .. })));
    }

    #[tokio::test]
    async fn predicate_matcher_runs_async_logic() {
        struct IsMessage;

        #[async_trait]
        impl ActivityPredicate for IsMessage {
            async fn test(&self, activity: &Activity) -> Result<bool, MatcherError> {
                Ok(activity.is_message())
            }
        }

        let matcher = Matcher::predicate(IsMessage);
        assert!(matcher.evaluate(&message("hi")).await.unwrap());

        let update = Activity::members_added(ConversationId::new("c1"), []);
        assert!(!matcher.evaluate(&update).await.unwrap());
    }

    #[test]
    fn command_arguments_extraction() {
        assert_eq!(command_arguments("/base64url hello world", "/base64url"), Some("hello world"));
        assert_eq!(command_arguments("  /base64url   spaced  ", "/base64url"), Some("spaced"));
        assert_eq!(command_arguments("/base64url", "/base64url"), None);
        assert_eq!(command_arguments("/base64urlx", "/base64url"), None);
    }
}
