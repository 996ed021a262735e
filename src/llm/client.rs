//! OpenAI-compatible chat completions client.
//!
//! Together, Perplexity, xAI and Gemini all accept the same request shape,
//! so one client covers every model role; the endpoint config decides the
//! URL, model, credentials and provider-specific extras.

use crate::config::EndpointConfig;
use crate::error::LlmError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, info};

/// A model that turns a system and user prompt into text.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Model identifier, for logs and report metadata.
    fn model(&self) -> &str;

    async fn complete(&self, system: &str, user: &str) -> Result<String, LlmError>;
}

/// Message in the chat history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    fn new(role: &str, content: &str) -> Self {
        Self {
            role: role.to_string(),
            content: content.to_string(),
        }
    }
}

/// Chat completions request.
#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    temperature: f32,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    search_parameters: Option<Value>,
}

/// Chat completions response.
#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

/// HTTP client for one configured endpoint.
pub struct ChatClient {
    config: EndpointConfig,
    api_key: Option<String>,
    http_client: reqwest::Client,
}

impl ChatClient {
    /// Create a client, reading the API key from the configured variable.
    pub fn new(config: EndpointConfig) -> Result<Self, LlmError> {
        let api_key = config.api_key();
        Self::with_api_key(config, api_key)
    }

    /// Create a client with an explicit API key.
    pub fn with_api_key(config: EndpointConfig, api_key: Option<String>) -> Result<Self, LlmError> {
        info!(
            "Configuring model {} at {}",
            config.model, config.base_url
        );

        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| LlmError::Transport(e.to_string()))?;

        Ok(Self {
            config,
            api_key,
            http_client,
        })
    }

    fn url(&self) -> String {
        format!(
            "{}/chat/completions",
            self.config.base_url.trim_end_matches('/')
        )
    }

    fn build_request<'a>(&'a self, system: &str, user: &str) -> ChatRequest<'a> {
        ChatRequest {
            model: &self.config.model,
            messages: vec![
                ChatMessage::new("system", system),
                ChatMessage::new("user", user),
            ],
            temperature: self.config.temperature,
            stream: false,
            response_format: self
                .config
                .json_mode
                .then(|| json!({ "type": "json_object" })),
            search_parameters: self
                .config
                .live_search
                .then(|| json!({ "mode": "on", "sources": [{ "type": "x" }] })),
        }
    }
}

#[async_trait]
impl ChatModel for ChatClient {
    fn model(&self) -> &str {
        &self.config.model
    }

    async fn complete(&self, system: &str, user: &str) -> Result<String, LlmError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| LlmError::MissingApiKey(self.config.api_key_env.clone()))?;

        let request = self.build_request(system, user);
        debug!(
            "Sending request to {} ({} prompt chars)",
            self.config.model,
            system.len() + user.len()
        );

        let response = self
            .http_client
            .post(self.url())
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LlmError::Timeout(self.config.timeout_seconds)
                } else if e.is_connect() {
                    LlmError::Connect(self.config.base_url.clone())
                } else {
                    LlmError::Transport(e.to_string())
                }
            })?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Status { status, body });
        }

        let chat_response: ChatResponse = response
            .json()
            .await
            .map_err(|e| LlmError::Decode(e.to_string()))?;

        let content = chat_response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|c| !c.trim().is_empty())
            .ok_or(LlmError::EmptyContent)?;

        debug!(
            "Received {} chars from {}",
            content.len(),
            self.config.model
        );
        Ok(content)
    }
}
