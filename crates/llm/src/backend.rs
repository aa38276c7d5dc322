//! LLM Backend implementations
//!
//! One backend speaks the OpenAI chat-completions protocol. Any server with
//! the same API works, including keyless ones on localhost.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

use tutor_config::Settings;
use tutor_core::Message;

use crate::LlmError;

/// Per-call overrides of the backend's configured parameters
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenerationOptions {
    pub model: Option<String>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
}

impl GenerationOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }
}

/// LLM generation result
#[derive(Debug, Clone)]
pub struct GenerationResult {
    /// Generated text
    pub text: String,
    /// Prompt tokens reported by the provider
    pub prompt_tokens: usize,
    /// Completion tokens reported by the provider
    pub tokens: usize,
    /// Total request time (ms)
    pub total_time_ms: u64,
    /// Finish reason
    pub finish_reason: FinishReason,
}

/// Finish reason
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinishReason {
    Stop,
    Length,
    ContentFilter,
}

impl FinishReason {
    fn from_api(reason: Option<&str>) -> Self {
        match reason {
            Some("length") => FinishReason::Length,
            Some("content_filter") => FinishReason::ContentFilter,
            _ => FinishReason::Stop,
        }
    }
}

/// LLM Backend trait
#[async_trait]
pub trait LlmBackend: Send + Sync {
    /// Generate a response for the given messages
    async fn generate(
        &self,
        messages: &[Message],
        options: &GenerationOptions,
    ) -> Result<GenerationResult, LlmError>;

    /// Check if model is available
    async fn is_available(&self) -> bool;

    /// Get model name
    fn model_name(&self) -> &str;
}

/// Configuration for OpenAI-compatible backends
#[derive(Debug, Clone)]
pub struct OpenAIConfig {
    /// API endpoint, e.g. https://api.openai.com/v1
    pub endpoint: String,
    /// API key
    pub api_key: String,
    /// Model name (gpt-3.5-turbo, gpt-4o-mini, etc.)
    pub model: String,
    /// Maximum tokens to generate; provider default when unset
    pub max_tokens: Option<u32>,
    /// Temperature (0-2); provider default when unset
    pub temperature: Option<f32>,
    /// Request timeout
    pub timeout: Duration,
    /// Organization ID (OpenAI specific)
    pub organization: Option<String>,
}

impl Default for OpenAIConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.openai.com/v1".to_string(),
            api_key: String::new(),
            model: "gpt-3.5-turbo".to_string(),
            max_tokens: None,
            temperature: None,
            timeout: Duration::from_secs(30),
            organization: None,
        }
    }
}

impl OpenAIConfig {
    /// Create config for OpenAI
    pub fn openai(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
            ..Default::default()
        }
    }

    /// Build from the `openai` and `completion` settings sections
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            endpoint: settings.openai.endpoint.clone(),
            api_key: settings.openai.credential().unwrap_or_default().to_string(),
            model: settings.completion.model.clone(),
            max_tokens: settings.completion.max_tokens,
            temperature: settings.completion.temperature,
            timeout: Duration::from_secs(settings.openai.timeout_seconds),
            organization: settings.openai.organization.clone(),
        }
    }

    fn is_local(&self) -> bool {
        self.endpoint.starts_with("http://localhost") || self.endpoint.starts_with("http://127.0.0.1")
    }
}

/// OpenAI-compatible backend
///
/// Works with OpenAI and with vLLM, Ollama or other local servers that
/// expose the same API.
pub struct OpenAIBackend {
    config: OpenAIConfig,
    client: Client,
}

impl OpenAIBackend {
    /// Create new OpenAI backend
    pub fn new(config: OpenAIConfig) -> Result<Self, LlmError> {
        if config.api_key.trim().is_empty() && !config.is_local() {
            return Err(LlmError::Configuration(
                "API key required for remote endpoints".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| LlmError::Configuration(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    pub fn config(&self) -> &OpenAIConfig {
        &self.config
    }

    /// Get the full API URL for chat completions
    fn chat_url(&self) -> String {
        format!("{}/chat/completions", self.config.endpoint.trim_end_matches('/'))
    }

    /// Build request headers
    fn build_headers(&self) -> reqwest::header::HeaderMap {
        use reqwest::header::HeaderValue;

        let mut headers = reqwest::header::HeaderMap::new();

        if !self.config.api_key.is_empty() {
            let auth_value = format!("Bearer {}", self.config.api_key);
            if let Ok(val) = HeaderValue::from_str(&auth_value) {
                headers.insert(reqwest::header::AUTHORIZATION, val);
            }
        }

        if let Some(ref org) = self.config.organization {
            if let Ok(val) = HeaderValue::from_str(org) {
                headers.insert("OpenAI-Organization", val);
            }
        }

        headers.insert(
            reqwest::header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );

        headers
    }

    fn build_request(&self, messages: &[Message], options: &GenerationOptions) -> OpenAIChatRequest {
        OpenAIChatRequest {
            model: options
                .model
                .clone()
                .unwrap_or_else(|| self.config.model.clone()),
            messages: messages
                .iter()
                .map(|m| OpenAIMessage {
                    role: m.role.as_str().to_string(),
                    content: m.content.clone(),
                })
                .collect(),
            max_tokens: options.max_tokens.or(self.config.max_tokens),
            temperature: options.temperature.or(self.config.temperature),
        }
    }
}

#[async_trait]
impl LlmBackend for OpenAIBackend {
    async fn generate(
        &self,
        messages: &[Message],
        options: &GenerationOptions,
    ) -> Result<GenerationResult, LlmError> {
        let start = Instant::now();
        let request = self.build_request(messages, options);

        tracing::debug!(
            model = %request.model,
            messages = request.messages.len(),
            max_tokens = ?request.max_tokens,
            "Sending chat completion request"
        );

        let response = self
            .client
            .post(self.chat_url())
            .headers(self.build_headers())
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(LlmError::Api(format!("HTTP {}: {}", status, error_text)));
        }

        let response: OpenAIChatResponse = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(e.to_string()))?;

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| LlmError::InvalidResponse("No choices in response".to_string()))?;

        let content = choice
            .message
            .content
            .ok_or_else(|| LlmError::InvalidResponse("Empty message content".to_string()))?;

        let (prompt_tokens, tokens) = response
            .usage
            .map(|u| (u.prompt_tokens, u.completion_tokens))
            .unwrap_or((0, 0));

        Ok(GenerationResult {
            text: content,
            prompt_tokens,
            tokens,
            total_time_ms: start.elapsed().as_millis() as u64,
            finish_reason: FinishReason::from_api(choice.finish_reason.as_deref()),
        })
    }

    async fn is_available(&self) -> bool {
        let url = format!("{}/models", self.config.endpoint.trim_end_matches('/'));
        self.client
            .get(&url)
            .headers(self.build_headers())
            .timeout(Duration::from_secs(5))
            .send()
            .await
            .map(|r| r.status().is_success())
            .unwrap_or(false)
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}

// OpenAI API types
#[derive(Debug, Serialize)]
struct OpenAIChatRequest {
    model: String,
    messages: Vec<OpenAIMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Serialize)]
struct OpenAIMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct OpenAIChatResponse {
    choices: Vec<OpenAIChoice>,
    usage: Option<OpenAIUsage>,
}

#[derive(Debug, Deserialize)]
struct OpenAIChoice {
    message: OpenAIResponseMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAIUsage {
    prompt_tokens: usize,
    completion_tokens: usize,
}
