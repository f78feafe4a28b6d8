//! The external token collaborator boundary.
//!
//! The bot never implements token acquisition itself; it asks the
//! collaborator once per dispatch and treats an absent token as "capability
//! unsatisfied". It never retries acquisition on its own.

use crate::capability::{Capability, CapabilitySnapshot};
use crate::error::TokenError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tracing::warn;

/// A token obtained from the authorization collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessToken {
    /// The raw token value.
    pub token: String,
    /// When the token expires, if known.
    pub expires_at: Option<DateTime<Utc>>,
}

impl AccessToken {
    /// Creates a token with no known expiry.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            expires_at: None,
        }
    }

    /// Returns true if the token is expired as of now.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|at| at <= Utc::now())
    }
}

/// Trait for the external authorization/token collaborator.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// Returns the current token for a capability, or `None` if the
    /// capability is not satisfied.
    async fn get_token(&self, capability: &Capability)
    -> Result<Option<AccessToken>, TokenError>;

    /// Exchanges the current token for one scoped to the given scopes, or
    /// `None` if the capability is not satisfied.
    async fn exchange_token(
        &self,
        capability: &Capability,
        scopes: &[String],
    ) -> Result<Option<AccessToken>, TokenError>;
}

/// A token provider backed by a fixed capability-to-token map.
///
/// Used in tests and in deployments where tokens arrive through
/// configuration rather than an interactive exchange.
#[derive(Debug, Default)]
pub struct StaticTokenProvider {
    tokens: HashMap<Capability, AccessToken>,
}

impl StaticTokenProvider {
    /// A provider that satisfies no capability.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Adds a token for a capability.
    #[must_use]
    pub fn with_token(mut self, capability: Capability, token: AccessToken) -> Self {
        self.tokens.insert(capability, token);
        self
    }
}

#[async_trait]
impl TokenProvider for StaticTokenProvider {
    async fn get_token(
        &self,
        capability: &Capability,
    ) -> Result<Option<AccessToken>, TokenError> {
        Ok(self
            .tokens
            .get(capability)
            .filter(|token| !token.is_expired())
            .cloned())
    }

    async fn exchange_token(
        &self,
        capability: &Capability,
        _scopes: &[String],
    ) -> Result<Option<AccessToken>, TokenError> {
        self.get_token(capability).await
    }
}

impl CapabilitySnapshot {
    /// Builds a snapshot by asking the provider once for each capability.
    ///
    /// An absent token or a provider error both leave the capability
    /// unsatisfied; errors are logged, never retried here.
    pub async fn resolve(
        provider: &dyn TokenProvider,
        capabilities: &[Capability],
    ) -> CapabilitySnapshot {
        let mut satisfied = Vec::new();
        for capability in capabilities {
            match provider.get_token(capability).await {
                Ok(Some(_)) => satisfied.push(capability.clone()),
                Ok(None) => {}
                Err(e) => {
                    warn!(capability = %capability, error = %e, "token lookup failed; treating capability as unsatisfied");
                }
            }
        }
        CapabilitySnapshot::from_satisfied(satisfied)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    /// A provider that always fails, for exercising the error path.
    struct FailingProvider;

    #[async_trait]
    impl TokenProvider for FailingProvider {
        async fn get_token(
            &self,
            capability: &Capability,
        ) -> Result<Option<AccessToken>, TokenError> {
            Err(TokenError::AcquisitionFailed {
                capability: capability.to_string(),
                details: "provider down".to_string(),
            })
        }

        async fn exchange_token(
            &self,
            capability: &Capability,
            _scopes: &[String],
        ) -> Result<Option<AccessToken>, TokenError> {
            self.get_token(capability).await
        }
    }

    #[tokio::test]
    async fn static_provider_returns_configured_token() {
        let provider = StaticTokenProvider::empty()
            .with_token(Capability::agent_session(), AccessToken::new("tok-1"));

        let token = provider
            .get_token(&Capability::agent_session())
            .await
            .unwrap();
        assert_eq!(token.map(|t| t.token), Some("tok-1".to_string()));

        let absent = provider
            .get_token(&Capability::new("other"))
            .await
            .unwrap();
        assert!(absent.is_none());
    }

    #[tokio::test]
    async fn expired_token_does_not_satisfy_capability() {
        let expired = AccessToken {
            token: "tok-1".to_string(),
            expires_at: Some(Utc::now() - Duration::minutes(1)),
        };
        let provider =
            StaticTokenProvider::empty().with_token(Capability::agent_session(), expired);

        let snapshot =
            CapabilitySnapshot::resolve(&provider, &[Capability::agent_session()]).await;
        assert!(!snapshot.is_satisfied(&Capability::agent_session()));
    }

    #[tokio::test]
    async fn resolve_marks_satisfied_capabilities() {
        let provider = StaticTokenProvider::empty()
            .with_token(Capability::agent_session(), AccessToken::new("tok-1"));

        let snapshot = CapabilitySnapshot::resolve(
            &provider,
            &[Capability::agent_session(), Capability::new("graph-read")],
        )
        .await;

        assert!(snapshot.is_satisfied(&Capability::agent_session()));
        assert!(!snapshot.is_satisfied(&Capability::new("graph-read")));
    }

    #[tokio::test]
    async fn provider_errors_leave_capability_unsatisfied() {
        let snapshot =
            CapabilitySnapshot::resolve(&FailingProvider, &[Capability::agent_session()]).await;
        assert!(!snapshot.is_satisfied(&Capability::agent_session()));
    }
}
