//! Remote Memory Gateway
//!
//! Best-effort client for the external memory service. Every failure
//! (transport error, non-success status, malformed or empty body) comes back
//! as `Outcome::Degraded`; nothing here returns an error or retries.
//!
//! # Wire format
//!
//! - `POST {base}/mirix/add` with `{"repo", "text"}`
//! - `POST {base}/mirix/system_prompt` with `{"repo", "conversation"}`,
//!   answering `{"memory_context": "..."}`

use async_trait::async_trait;
use sdk::errors::EngineError;
use sdk::types::RepoId;
use sdk::Outcome;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Remote memory service consulted before and updated after each run
#[async_trait]
pub trait RemoteMemory: Send + Sync {
    /// Recall context relevant to `conversation`
    ///
    /// An empty or whitespace-only context is reported as `Degraded`, the
    /// same as a failed call.
    async fn fetch_context(&self, repo: &RepoId, conversation: &str) -> Outcome<String>;

    /// Append `text` to the repository's long-term memory
    async fn push_memory(&self, repo: &RepoId, text: &str) -> Outcome<()>;
}

#[derive(Debug, Serialize)]
struct AddMemoryRequest<'a> {
    repo: String,
    text: &'a str,
}

#[derive(Debug, Serialize)]
struct SystemPromptRequest<'a> {
    repo: String,
    conversation: &'a str,
}

#[derive(Debug, Deserialize)]
struct SystemPromptResponse {
    #[serde(default)]
    memory_context: Option<String>,
}

fn degraded<T>(reason: String) -> Outcome<T> {
    Outcome::degraded_by(EngineError::MemoryService(reason))
}

/// HTTP client for the memory service
pub struct HttpMemoryGateway {
    base_url: String,
    client: reqwest::Client,
}

impl HttpMemoryGateway {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, reqwest::Client::new())
    }

    pub fn with_client(base_url: impl Into<String>, client: reqwest::Client) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        }
    }
}

#[async_trait]
impl RemoteMemory for HttpMemoryGateway {
    async fn fetch_context(&self, repo: &RepoId, conversation: &str) -> Outcome<String> {
        let url = format!("{}/mirix/system_prompt", self.base_url);
        let body = SystemPromptRequest {
            repo: repo.to_string(),
            conversation,
        };

        let response = match self.client.post(&url).json(&body).send().await {
            Ok(response) => response,
            Err(e) => return degraded(format!("memory service unreachable: {}", e)),
        };

        let status = response.status();
        if !status.is_success() {
            return degraded(format!("memory service returned {}", status));
        }

        let parsed: SystemPromptResponse = match response.json().await {
            Ok(parsed) => parsed,
            Err(e) => {
                return degraded(format!("malformed memory service response: {}", e))
            }
        };

        match parsed.memory_context {
            Some(context) if !context.trim().is_empty() => {
                debug!(repo = %repo, chars = context.len(), "Fetched remote memory context");
                Outcome::Ok(context.trim().to_string())
            }
            _ => degraded("memory service returned no context".to_string()),
        }
    }

    async fn push_memory(&self, repo: &RepoId, text: &str) -> Outcome<()> {
        let url = format!("{}/mirix/add", self.base_url);
        let body = AddMemoryRequest {
            repo: repo.to_string(),
            text,
        };

        match self.client.post(&url).json(&body).send().await {
            Ok(response) if response.status().is_success() => {
                debug!(repo = %repo, "Pushed memory to remote service");
                Outcome::Ok(())
            }
            Ok(response) => {
                degraded(format!("memory service returned {}", response.status()))
            }
            Err(e) => degraded(format!("memory service unreachable: {}", e)),
        }
    }
}
