use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::LlmError;

/// Configuration for the chat/classification capability
#[derive(Debug, Clone)]
pub struct ChatConfig {
    /// Base URL of an OpenAI-compatible chat completions endpoint
    pub base_url: String,
    /// API key (from CHAT_API_KEY env var)
    pub api_key: String,
    pub model: String,
    /// Temperature (0-1, lower = more deterministic)
    pub temperature: f64,
    /// Maximum tokens in response
    pub max_tokens: u32,
    /// Per-call deadline in seconds; a breach maps to LlmError::Timeout
    pub timeout_secs: u64,
}

impl ChatConfig {
    /// Create config from environment variables
    pub fn from_env() -> Result<Self> {
        let base_url = std::env::var("CHAT_BASE_URL")
            .context("CHAT_BASE_URL environment variable not set")?;
        let api_key = std::env::var("CHAT_API_KEY")
            .context("CHAT_API_KEY environment variable not set")?;

        Ok(Self {
            base_url,
            api_key,
            model: std::env::var("CHAT_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string()),
            temperature: 0.1,
            max_tokens: 4096,
            timeout_secs: 60,
        })
    }
}

/// The classification capability consumed by every pipeline stage.
///
/// The HTTP client implements this; tests inject scripted fakes.
#[async_trait]
pub trait ChatCompletion: Send + Sync {
    async fn complete(&self, system: &str, user: &str) -> Result<String, LlmError>;
}

/// HTTP client for an OpenAI-compatible chat completions endpoint
pub struct ChatClient {
    client: Client,
    config: ChatConfig,
}

impl ChatClient {
    pub fn new(config: ChatConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    async fn send(&self, system: &str, user: &str) -> Result<String, LlmError> {
        let request = ChatRequest {
            model: self.config.model.clone(),
            max_tokens: self.config.max_tokens,
            temperature: Some(self.config.temperature),
            messages: vec![
                Message {
                    role: "system".to_string(),
                    content: system.to_string(),
                },
                Message {
                    role: "user".to_string(),
                    content: user.to_string(),
                },
            ],
        };

        let url = format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'));
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| LlmError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Status { status, body });
        }

        let response: ChatResponse = response
            .json()
            .await
            .map_err(|e| LlmError::Parse(e.to_string()))?;

        response
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .filter(|c| !c.is_empty())
            .ok_or(LlmError::Empty)
    }
}

#[async_trait]
impl ChatCompletion for ChatClient {
    /// Send one classification request, bounded by the configured deadline
    async fn complete(&self, system: &str, user: &str) -> Result<String, LlmError> {
        let deadline = Duration::from_secs(self.config.timeout_secs);
        match tokio::time::timeout(deadline, self.send(system, user)).await {
            Ok(result) => result,
            Err(_) => {
                debug!("chat call exceeded {}s deadline", self.config.timeout_secs);
                Err(LlmError::Timeout(self.config.timeout_secs))
            }
        }
    }
}

/// Tagged per-call result: either the parsed value, or a documented
/// fallback value together with the failure that caused it.
#[derive(Debug, Clone)]
pub enum CallOutcome<T> {
    Success(T),
    Fallback { value: T, cause: LlmError },
}

impl<T> CallOutcome<T> {
    pub fn into_value(self) -> T {
        match self {
            CallOutcome::Success(v) => v,
            CallOutcome::Fallback { value, .. } => value,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, CallOutcome::Fallback { .. })
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
    messages: Vec<Message>,
}

#[derive(Debug, Serialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: String,
}
