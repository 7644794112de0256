//! OpenAI-compatible completion client
//!
//! The wire format is always chat-completions, whatever model sits behind the
//! proxy, so no provider auto-detection ever kicks in.

use crate::{LlmError, LlmResult};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use wfsync_core::SyncSettings;
use wfsync_utils::LlmCredentials;

/// Token counts reported by the service
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Usage {
    pub input_tokens: u64,
    pub output_tokens: u64,
}

impl Usage {
    pub const fn total(&self) -> u64 {
        self.input_tokens + self.output_tokens
    }
}

/// Text of one completion plus its usage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub text: String,
    pub usage: Usage,
}

/// A service that answers a single-message prompt
#[async_trait]
pub trait CompletionService: Send + Sync {
    async fn complete(&self, prompt: &str) -> LlmResult<Completion>;

    /// Model name, for logging
    fn model(&self) -> &str;
}

/// Linear cost estimate in USD
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CostModel {
    pub input_per_million: f64,
    pub output_per_million: f64,
}

impl Default for CostModel {
    fn default() -> Self {
        Self {
            input_per_million: 15.0,
            output_per_million: 75.0,
        }
    }
}

impl CostModel {
    pub const fn from_settings(settings: &SyncSettings) -> Self {
        Self {
            input_per_million: settings.input_cost_per_million,
            output_per_million: settings.output_cost_per_million,
        }
    }

    #[allow(clippy::cast_precision_loss)]
    pub fn estimate(&self, usage: &Usage) -> f64 {
        (usage.input_tokens as f64 * self.input_per_million
            + usage.output_tokens as f64 * self.output_per_million)
            / 1_000_000.0
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    usage: Option<ApiUsage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiUsage {
    #[serde(default)]
    prompt_tokens: u64,
    #[serde(default)]
    completion_tokens: u64,
}

/// Client for any endpoint speaking the chat-completions format
pub struct OpenAiCompatibleClient {
    client: Client,
    endpoint: String,
    api_key: String,
    model: String,
}

impl OpenAiCompatibleClient {
    pub fn new(credentials: &LlmCredentials, timeout: Duration) -> LlmResult<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: format!(
                "{}/chat/completions",
                credentials.base_url.trim_end_matches('/')
            ),
            api_key: credentials.api_key.clone(),
            model: credentials.model.clone(),
        })
    }
}

#[async_trait]
impl CompletionService for OpenAiCompatibleClient {
    async fn complete(&self, prompt: &str) -> LlmResult<Completion> {
        tracing::debug!("Calling LLM: {}", self.model);
        let request_body = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(LlmError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let chat: ChatResponse = response.json().await?;
        let usage = chat.usage.map_or_else(Usage::default, |u| Usage {
            input_tokens: u.prompt_tokens,
            output_tokens: u.completion_tokens,
        });

        chat.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|text| !text.trim().is_empty())
            .map(|text| Completion { text, usage })
            .ok_or(LlmError::EmptyResponse)
    }

    fn model(&self) -> &str {
        &self.model
    }
}
