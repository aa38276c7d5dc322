//! Language Model adapter
//!
//! Bridges the LlmBackend trait to the core LanguageModel trait,
//! allowing LLM backends to be used where LanguageModel is expected.

use async_trait::async_trait;
use std::sync::Arc;

use tutor_core::{
    llm_types::{FinishReason as CoreFinishReason, TokenUsage},
    Error, GenerateRequest, GenerateResponse, LanguageModel, Result,
};

use crate::backend::{FinishReason as BackendFinishReason, GenerationOptions, LlmBackend};

/// Adapter that wraps an LlmBackend to implement the core LanguageModel trait.
///
/// # Example
///
/// ```ignore
/// let backend = OpenAIBackend::new(OpenAIConfig::from_settings(&settings))?;
/// let language_model: Arc<dyn LanguageModel> = Arc::new(LanguageModelAdapter::new(backend));
/// ```
pub struct LanguageModelAdapter {
    backend: Arc<dyn LlmBackend>,
    model_name: String,
}

impl LanguageModelAdapter {
    /// Create a new adapter wrapping an LlmBackend
    pub fn new<B: LlmBackend + 'static>(backend: B) -> Self {
        let model_name = backend.model_name().to_string();
        Self {
            backend: Arc::new(backend),
            model_name,
        }
    }

    /// Create from an Arc'd backend
    pub fn from_arc(backend: Arc<dyn LlmBackend>) -> Self {
        let model_name = backend.model_name().to_string();
        Self { backend, model_name }
    }

    fn options(request: &GenerateRequest) -> GenerationOptions {
        GenerationOptions {
            model: request.model.clone(),
            max_tokens: request.max_tokens,
            temperature: request.temperature,
        }
    }

    /// Convert backend finish reason to core finish reason
    fn convert_finish_reason(reason: BackendFinishReason) -> CoreFinishReason {
        match reason {
            BackendFinishReason::Stop => CoreFinishReason::Stop,
            BackendFinishReason::Length => CoreFinishReason::Length,
            BackendFinishReason::ContentFilter => CoreFinishReason::ContentFilter,
        }
    }
}

#[async_trait]
impl LanguageModel for LanguageModelAdapter {
    async fn generate(&self, request: GenerateRequest) -> Result<GenerateResponse> {
        let options = Self::options(&request);

        match self.backend.generate(&request.messages, &options).await {
            Ok(result) => {
                tracing::debug!(
                    model = %self.model_name,
                    tokens = result.tokens,
                    total_time_ms = result.total_time_ms,
                    "Completion finished"
                );
                Ok(GenerateResponse {
                    text: result.text,
                    finish_reason: Self::convert_finish_reason(result.finish_reason),
                    usage: Some(TokenUsage::new(
                        result.prompt_tokens as u32,
                        result.tokens as u32,
                    )),
                })
            }
            Err(e) => Err(Error::Llm(e.to_string())),
        }
    }

    async fn is_available(&self) -> bool {
        self.backend.is_available().await
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::GenerationResult;
    use crate::LlmError;
    use std::sync::Mutex;
    use tutor_core::Message;

    // Mock backend for testing
    struct MockBackend {
        response: std::result::Result<String, String>,
        seen: Mutex<Vec<GenerationOptions>>,
    }

    impl MockBackend {
        fn new(response: &str) -> Self {
            Self {
                response: Ok(response.to_string()),
                seen: Mutex::new(Vec::new()),
            }
        }

        fn failing(message: &str) -> Self {
            Self {
                response: Err(message.to_string()),
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl LlmBackend for MockBackend {
        async fn generate(
            &self,
            _messages: &[Message],
            options: &GenerationOptions,
        ) -> std::result::Result<GenerationResult, LlmError> {
            self.seen.lock().unwrap().push(options.clone());
            match &self.response {
                Ok(text) => Ok(GenerationResult {
                    text: text.clone(),
                    prompt_tokens: 20,
                    tokens: 10,
                    total_time_ms: 100,
                    finish_reason: BackendFinishReason::Length,
                }),
                Err(message) => Err(LlmError::Api(message.clone())),
            }
        }

        async fn is_available(&self) -> bool {
            true
        }

        fn model_name(&self) -> &str {
            "mock-model"
        }
    }

    #[tokio::test]
    async fn test_adapter_generate() {
        let adapter = LanguageModelAdapter::new(MockBackend::new("你好！"));

        let request = GenerateRequest::new("You are Serena").with_user_message("Hi");
        let response = adapter.generate(request).await.unwrap();
        assert_eq!(response.text, "你好！");
        assert_eq!(response.finish_reason, CoreFinishReason::Length);
        assert_eq!(response.usage, Some(TokenUsage::new(20, 10)));
    }

    #[tokio::test]
    async fn test_adapter_forwards_options() {
        let backend = Arc::new(MockBackend::new("ok"));
        let adapter = LanguageModelAdapter::from_arc(backend.clone());

        let request = GenerateRequest::from_messages(vec![Message::user("test")])
            .with_max_tokens(5)
            .with_temperature(0.2);
        adapter.generate(request).await.unwrap();

        let seen = backend.seen.lock().unwrap();
        assert_eq!(seen[0].max_tokens, Some(5));
        assert_eq!(seen[0].temperature, Some(0.2));
        assert_eq!(seen[0].model, None);
    }

    #[tokio::test]
    async fn test_adapter_maps_errors() {
        let adapter = LanguageModelAdapter::new(MockBackend::failing("HTTP 500: boom"));
        let err = adapter
            .generate(GenerateRequest::new("P"))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "LLM error: API error: HTTP 500: boom");
    }

    #[tokio::test]
    async fn test_adapter_is_available() {
        let adapter = LanguageModelAdapter::new(MockBackend::new("test"));
        assert!(adapter.is_available().await);
        assert_eq!(adapter.model_name(), "mock-model");
    }
}
