//! HTTP implementation of [`AgentBackend`] for the hosted agent service.
//!
//! Targets the REST surface rooted at `{endpoint}/threads`: thread creation
//! and lookup, message posting, run creation and polling, message listing.
//! Every call carries bearer auth and the configured API version.

use crate::backend::{AgentBackend, AgentMessage, MessageOrder, RunInfo, ThreadInfo};
use crate::error::AgentError;
use crate::status::RunStatus;
use async_trait::async_trait;
use herald_core::{RunId, ThreadId};
use reqwest::{Client, RequestBuilder};
use rootcause::prelude::Report;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

/// Configuration for the HTTP agent backend.
#[derive(Debug, Clone)]
pub struct HttpBackendConfig {
    /// Service endpoint, e.g. `https://host/api/projects/my-project`.
    pub endpoint: String,
    /// Identifier of the agent that runs are created against.
    pub agent_id: String,
    /// API version sent with every request.
    pub api_version: String,
    /// Bearer token for authentication.
    pub api_key: String,
}

/// HTTP client for the hosted agent-run service.
pub struct HttpAgentBackend {
    client: Client,
    endpoint: String,
    agent_id: String,
    api_version: String,
    api_key: String,
}

impl HttpAgentBackend {
    /// Creates a new backend client.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is unusable or the underlying
    /// HTTP client cannot be constructed.
    pub fn new(config: HttpBackendConfig) -> Result<Self, Report<AgentError>> {
        if config.endpoint.trim().is_empty() {
            return Err(AgentError::InvalidConfig {
                reason: "endpoint is empty".to_string(),
            }
            .into());
        }
        if config.agent_id.trim().is_empty() {
            return Err(AgentError::InvalidConfig {
                reason: "agent id is empty".to_string(),
            }
            .into());
        }

        let client = Client::builder()
            .build()
            .map_err(|e| AgentError::InvalidConfig {
                reason: e.to_string(),
            })?;

        Ok(Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            agent_id: config.agent_id,
            api_version: config.api_version,
            api_key: config.api_key,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{path}", self.endpoint)
    }

    fn request(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .bearer_auth(&self.api_key)
            .query(&[("api-version", self.api_version.as_str())])
    }

    async fn execute<T>(&self, operation: &str, builder: RequestBuilder) -> Result<T, AgentError>
    where
        T: for<'de> Deserialize<'de>,
    {
        let response = self
            .request(builder)
            .send()
            .await
            .map_err(|e| AgentError::BackendUnavailable {
                details: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let details = response.text().await.unwrap_or_default();
            return Err(AgentError::RequestFailed {
                operation: operation.to_string(),
                status: status.as_u16(),
                details,
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|e| AgentError::ResponseParseFailed {
                operation: operation.to_string(),
                details: e.to_string(),
            })
    }

    async fn execute_no_body(
        &self,
        operation: &str,
        builder: RequestBuilder,
    ) -> Result<(), AgentError> {
        let response = self
            .request(builder)
            .send()
            .await
            .map_err(|e| AgentError::BackendUnavailable {
                details: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let details = response.text().await.unwrap_or_default();
            return Err(AgentError::RequestFailed {
                operation: operation.to_string(),
                status: status.as_u16(),
                details,
            });
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct ThreadResponse {
    id: String,
}

#[derive(Debug, Deserialize)]
struct RunResponse {
    id: String,
    thread_id: String,
    status: String,
}

#[derive(Debug, Deserialize)]
struct MessageListResponse {
    data: Vec<MessageResponse>,
}

#[derive(Debug, Deserialize)]
struct MessageResponse {
    role: String,
    #[serde(default)]
    content: Vec<ContentItem>,
}

#[derive(Debug, Deserialize)]
struct ContentItem {
    #[serde(rename = "type")]
    kind: String,
    text: Option<TextContent>,
}

#[derive(Debug, Deserialize)]
struct TextContent {
    value: String,
}

impl MessageResponse {
    /// Concatenates the text parts of the message. Non-text parts (images,
    /// file references) are skipped.
    fn text(&self) -> String {
        self.content
            .iter()
            .filter(|item| item.kind == "text")
            .filter_map(|item| item.text.as_ref())
            .map(|text| text.value.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[async_trait]
impl AgentBackend for HttpAgentBackend {
    async fn create_thread(&self) -> Result<ThreadInfo, AgentError> {
        let builder = self.client.post(self.url("threads")).json(&json!({}));
        let thread: ThreadResponse = self.execute("create_thread", builder).await?;
        debug!(thread = %thread.id, "thread created");
        Ok(ThreadInfo {
            id: ThreadId::new(thread.id),
        })
    }

    async fn get_thread(&self, thread: &ThreadId) -> Result<ThreadInfo, AgentError> {
        let builder = self
            .client
            .get(self.url(&format!("threads/{}", thread.as_str())));
        let thread: ThreadResponse = self.execute("get_thread", builder).await?;
        Ok(ThreadInfo {
            id: ThreadId::new(thread.id),
        })
    }

    async fn post_message(&self, thread: &ThreadId, text: &str) -> Result<(), AgentError> {
        let builder = self
            .client
            .post(self.url(&format!("threads/{}/messages", thread.as_str())))
            .json(&json!({ "role": "user", "content": text }));
        self.execute_no_body("post_message", builder).await
    }

    async fn create_run(&self, thread: &ThreadId) -> Result<RunInfo, AgentError> {
        let builder = self
            .client
            .post(self.url(&format!("threads/{}/runs", thread.as_str())))
            .json(&json!({ "assistant_id": self.agent_id }));
        let run: RunResponse = self.execute("create_run", builder).await?;
        debug!(run = %run.id, status = %run.status, "run created");
        Ok(RunInfo {
            id: RunId::new(run.id),
            thread_id: ThreadId::new(run.thread_id),
            status: RunStatus::parse(&run.status),
        })
    }

    async fn get_run(&self, thread: &ThreadId, run: &RunId) -> Result<RunStatus, AgentError> {
        let builder = self.client.get(self.url(&format!(
            "threads/{}/runs/{}",
            thread.as_str(),
            run.as_str()
        )));
        let run: RunResponse = self.execute("get_run", builder).await?;
        Ok(RunStatus::parse(&run.status))
    }

    async fn list_messages(
        &self,
        thread: &ThreadId,
        order: MessageOrder,
    ) -> Result<Vec<AgentMessage>, AgentError> {
        let builder = self
            .client
            .get(self.url(&format!("threads/{}/messages", thread.as_str())))
            .query(&[("order", order.as_query_value())]);
        let list: MessageListResponse = self.execute("list_messages", builder).await?;
        Ok(list
            .data
            .into_iter()
            .map(|message| AgentMessage {
                text: message.text(),
                role: message.role,
            })
            .collect())
    }
}
