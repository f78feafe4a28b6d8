//! Centralized server configuration.
//!
//! Strongly-typed configuration loaded via the `config` crate from
//! environment variables. Flat fields map to their uppercased names
//! (`PORT`, `AI_FOUNDRY_ENDPOINT`); nested sections use `__` as the
//! separator (`FEATURES__ENABLE_AGENT`, `POLLING__INTERVAL_MS`).

use herald_agent::{HttpBackendConfig, PollingPolicy};
use serde::Deserialize;
use std::time::Duration;

/// Server configuration.
#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    /// Port the listener binds on.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Address the listener binds on.
    #[serde(default = "default_host")]
    pub host: String,

    /// Hosted agent service endpoint, e.g.
    /// `https://host/api/projects/my-project`.
    #[serde(default)]
    pub ai_foundry_endpoint: Option<String>,

    /// Identifier of the agent runs are created against.
    #[serde(default)]
    pub ai_foundry_agent_id: Option<String>,

    /// Model name, surfaced by the /runtime command when set.
    #[serde(default)]
    pub ai_foundry_model_name: Option<String>,

    /// Bearer token for the agent service.
    #[serde(default)]
    pub ai_foundry_api_key: Option<String>,

    /// API version sent with agent service requests.
    #[serde(default = "default_api_version")]
    pub ai_foundry_api_version: String,

    /// Base URL replies fall back to when an activity carried no
    /// service URL.
    #[serde(default)]
    pub reply_base_url: Option<String>,

    /// Token that satisfies the agent-session capability for gated
    /// bindings. Absent means the capability stays unsatisfied.
    #[serde(default)]
    pub agent_session_token: Option<String>,

    /// Feature selection for the binding table.
    #[serde(default)]
    pub features: FeatureFlags,

    /// Run polling tuning.
    #[serde(default)]
    pub polling: PollingConfig,
}

/// Which optional bindings are registered.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FeatureFlags {
    /// Registers the /agent binding backed by the hosted agent service.
    #[serde(default)]
    pub enable_agent: bool,

    /// Registers the capability-gated /whoami binding.
    #[serde(default)]
    pub enable_auth_demo: bool,
}

/// Poll cadence and deadline for awaiting agent runs.
#[derive(Debug, Clone, Deserialize)]
pub struct PollingConfig {
    /// Time between status polls, in milliseconds.
    #[serde(default = "default_poll_interval_ms")]
    pub interval_ms: u64,

    /// Total time to wait for a run before giving up, in seconds.
    #[serde(default = "default_poll_max_wait_secs")]
    pub max_wait_secs: u64,
}

fn default_port() -> u16 {
    3978
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_api_version() -> String {
    "2025-05-01".to_string()
}

fn default_poll_interval_ms() -> u64 {
    1000
}

fn default_poll_max_wait_secs() -> u64 {
    120
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_poll_interval_ms(),
            max_wait_secs: default_poll_max_wait_secs(),
        }
    }
}

impl PollingConfig {
    /// Converts the tuning into a runner policy.
    #[must_use]
    pub fn policy(&self) -> PollingPolicy {
        PollingPolicy {
            interval: Duration::from_millis(self.interval_ms),
            max_wait: Duration::from_secs(self.max_wait_secs),
        }
    }
}

impl ServerConfig {
    /// Loads configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if required configuration is missing or invalid.
    pub fn from_env() -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(
                config::Environment::default()
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }

    /// The socket address the listener binds on.
    #[must_use]
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Builds the agent backend configuration when the agent feature is
    /// fully configured. Returns `None` (with the missing pieces logged by
    /// the caller) otherwise.
    #[must_use]
    pub fn agent_backend_config(&self) -> Option<HttpBackendConfig> {
        let endpoint = self.ai_foundry_endpoint.clone()?;
        let agent_id = self.ai_foundry_agent_id.clone()?;
        let api_key = self.ai_foundry_api_key.clone()?;
        Some(HttpBackendConfig {
            endpoint,
            agent_id,
            api_version: self.ai_foundry_api_version.clone(),
            api_key,
        })
    }
}
