//! Chat provider trait and the OpenAI-compatible implementation
//!
//! The provider seam keeps the HTTP server testable without a live
//! model endpoint. The real implementation speaks the OpenAI chat
//! completions wire format, which most hosted providers accept.

use crate::config::ChatConfig;
use crate::error::{Result, ScoutError};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

/// Environment variable holding the model provider API key
pub const ENV_CHAT_API_KEY: &str = "CAMPUS_SCOUT_CHAT_API_KEY";

/// A source of single-turn chat completions.
#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// Produce a reply to `user` under the given system prompt.
    async fn reply(&self, system: &str, user: &str) -> Result<String>;
}

/// Provider speaking the OpenAI chat completions API.
pub struct OpenAiChatProvider {
    client: Client,
    api_base: String,
    model: String,
    api_key: String,
}

/// Request body for the chat completions endpoint
#[derive(Debug, Serialize)]
struct CompletionRequest {
    model: String,
    messages: Vec<WireMessage>,
}

/// A single message on the wire
#[derive(Debug, Serialize, Deserialize)]
struct WireMessage {
    role: String,
    content: String,
}

/// Response body from the chat completions endpoint
#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: WireMessage,
}

impl OpenAiChatProvider {
    /// Create a provider from configuration. The API key comes from the
    /// `CAMPUS_SCOUT_CHAT_API_KEY` environment variable.
    ///
    /// # Errors
    ///
    /// Returns [`ScoutError::Config`] when the key is unset or empty.
    pub fn new(config: &ChatConfig) -> Result<Self> {
        let api_key = std::env::var(ENV_CHAT_API_KEY)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| {
                ScoutError::Config(format!("{} environment variable not set", ENV_CHAT_API_KEY))
            })?;
        Ok(Self {
            client: Client::new(),
            api_base: config.api_base.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key,
        })
    }

    /// Create a provider with an explicit key and endpoint. Used by
    /// tests that point at a local mock server.
    pub fn with_key(api_base: impl Into<String>, model: impl Into<String>, api_key: impl Into<String>) -> Self {
        let api_base = api_base.into();
        Self {
            client: Client::new(),
            api_base: api_base.trim_end_matches('/').to_string(),
            model: model.into(),
            api_key: api_key.into(),
        }
    }
}

#[async_trait]
impl ChatProvider for OpenAiChatProvider {
    async fn reply(&self, system: &str, user: &str) -> Result<String> {
        let request = CompletionRequest {
            model: self.model.clone(),
            messages: vec![
                WireMessage {
                    role: "system".to_string(),
                    content: system.to_string(),
                },
                WireMessage {
                    role: "user".to_string(),
                    content: user.to_string(),
                },
            ],
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.api_base))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ScoutError::Provider(format!(
                "chat completions request failed with {}: {}",
                status, body
            ))
            .into());
        }

        let completion: CompletionResponse = response.json().await?;
        let choice = completion.choices.into_iter().next().ok_or_else(|| {
            ScoutError::Provider("chat completions response had no choices".to_string())
        })?;
        Ok(choice.message.content)
    }
}
