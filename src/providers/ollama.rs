use async_trait::async_trait;
use log::{debug, error, info, warn};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

use crate::app_config::ChatConfig;
use crate::chat::reply::extract_reply;
use crate::errors::ProviderError;
use crate::providers::Provider;

/// Ollama client for the chat-completions route and model management
#[derive(Debug, Clone)]
pub struct Ollama {
    /// Base URL of the Ollama API
    base_url: String,
    /// Full URL of the chat-completions route
    chat_url: String,
    /// HTTP client for making requests
    client: Client,
    /// Request timeout in seconds
    timeout_secs: u64,
}

/// Chat message object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Role of the message sender (system, user or assistant)
    pub role: String,
    /// Content of the message
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
        }
    }
}

/// Chat-completions request body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatCompletionRequest {
    /// Model name to use for generation
    pub model: String,
    /// Messages of the conversation
    pub messages: Vec<ChatMessage>,
    /// Sampling temperature
    pub temperature: f32,
    /// Maximum number of tokens to generate
    pub max_tokens: u32,
}

impl ChatCompletionRequest {
    /// Create a new chat request
    pub fn new(model: impl Into<String>, messages: Vec<ChatMessage>) -> Self {
        Self {
            model: model.into(),
            messages,
            temperature: 0.2,
            max_tokens: 1024,
        }
    }

    /// Set the temperature
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Set the completion token cap
    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }
}

/// Model management request (`/api/show`, `/api/pull`)
#[derive(Debug, Serialize)]
struct ModelRequest<'a> {
    model: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    stream: Option<bool>,
}

impl Ollama {
    /// Create a new Ollama client from a base URL and chat route
    pub fn new(base_url: impl Into<String>, chat_path: impl Into<String>, timeout_secs: u64) -> Self {
        Self::from_config(&ChatConfig {
            endpoint: base_url.into(),
            chat_path: chat_path.into(),
            timeout_secs,
            ..ChatConfig::default()
        })
    }

    /// Create a client from the chat configuration
    pub fn from_config(config: &ChatConfig) -> Self {
        Self {
            base_url: config.endpoint.trim_end_matches('/').to_string(),
            chat_url: config.chat_url(),
            client: Client::builder()
                .timeout(Duration::from_secs(config.timeout_secs))
                // Ollama speaks HTTP/1.1
                .http1_only()
                .pool_idle_timeout(Duration::from_secs(90))
                .tcp_keepalive(Duration::from_secs(60))
                .build()
                .unwrap_or_default(),
            timeout_secs: config.timeout_secs,
        }
    }

    /// Base URL this client talks to
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn map_send_error(&self, error: reqwest::Error) -> ProviderError {
        if error.is_timeout() {
            ProviderError::Timeout(self.timeout_secs)
        } else {
            ProviderError::from(error)
        }
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn post_json<T: Serialize + ?Sized>(&self, url: &str, body: &T) -> Result<Value, ProviderError> {
        debug!("POST {}", url);

        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to get error response text".to_string());
            error!("Ollama API error ({}): {}", status, error_text);
            return Err(ProviderError::ApiError {
                status_code: status.as_u16(),
                message: error_text,
            });
        }

        let response_text = response.text().await.map_err(|e| self.map_send_error(e))?;
        serde_json::from_str::<Value>(&response_text).map_err(|e| {
            error!(
                "Failed to parse Ollama API response: {}. Raw response (first 500 chars): {}",
                e,
                response_text.chars().take(500).collect::<String>()
            );
            ProviderError::ParseError(e.to_string())
        })
    }

    /// Send a chat-completions request and return the raw payload
    pub async fn chat_completions(&self, request: &ChatCompletionRequest) -> Result<Value, ProviderError> {
        self.post_json(&self.chat_url, request).await
    }

    /// Check that a model is available locally
    pub async fn show_model(&self, model: &str) -> Result<(), ProviderError> {
        self.post_json(&self.api_url("/api/show"), &ModelRequest { model, stream: None })
            .await?;
        Ok(())
    }

    /// Ask Ollama to download a model, waiting for completion
    pub async fn pull_model(&self, model: &str) -> Result<(), ProviderError> {
        self.post_json(
            &self.api_url("/api/pull"),
            &ModelRequest {
                model,
                stream: Some(false),
            },
        )
        .await?;
        Ok(())
    }

    /// Best-effort model preload: show, then pull when the model is missing.
    /// Failures are logged and swallowed.
    pub async fn preload_model(&self, model: &str) {
        info!("Checking chat model {}", model);
        match self.show_model(model).await {
            Ok(()) => info!("Chat model {} already present", model),
            Err(e) => {
                info!("Chat model {} not available ({}), pulling", model, e);
                match self.pull_model(model).await {
                    Ok(()) => info!("Chat model {} pulled", model),
                    Err(e) => warn!("Chat model preload failed (ignored): {}", e),
                }
            }
        }
    }

    /// Get the Ollama API version
    pub async fn version(&self) -> Result<String, ProviderError> {
        let url = self.api_url("/api/version");
        let response: Value = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?
            .json()
            .await?;

        response["version"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| ProviderError::ParseError("Invalid version format in response".to_string()))
    }
}

#[async_trait]
impl Provider for Ollama {
    type Request = ChatCompletionRequest;
    type Response = Value;

    async fn complete(&self, request: Self::Request) -> Result<Self::Response, ProviderError> {
        self.chat_completions(&request).await
    }

    async fn test_connection(&self) -> Result<(), ProviderError> {
        self.version().await.map(|_| ())
    }

    fn extract_text(response: &Self::Response) -> String {
        extract_reply(response)
    }
}
