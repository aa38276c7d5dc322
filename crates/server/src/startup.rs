//! Startup checks
//!
//! The server refuses to start without an API credential or when the
//! completion backend does not answer a tiny probe request. Both failures
//! are fatal and happen before any socket is bound.

use std::sync::Arc;
use thiserror::Error;

use tutor_agent::DialogueOrchestrator;
use tutor_config::{Settings, StartupConfig};
use tutor_core::{GenerateRequest, LanguageModel, Message, TextToSpeech};
use tutor_llm::{LanguageModelAdapter, OpenAIBackend, OpenAIConfig};
use tutor_pipeline::{OpenAiTts, OpenAiTtsConfig, SpeechRenderer};

#[derive(Error, Debug)]
pub enum StartupError {
    #[error("No OpenAI API key found. Please set OPENAI_API_KEY or openai.api_key in the configuration.")]
    MissingCredential,

    #[error("API Error: {0}")]
    Probe(String),

    #[error("Failed to initialize {component}: {message}")]
    Backend { component: &'static str, message: String },
}

impl StartupError {
    /// Line shown to the operator before exiting
    pub fn user_message(&self) -> String {
        format!("❌ {}", self)
    }
}

/// Fail when no credential is configured
pub fn check_credentials(settings: &Settings) -> Result<(), StartupError> {
    match settings.openai.credential() {
        Some(_) => Ok(()),
        None => Err(StartupError::MissingCredential),
    }
}

/// Send the connectivity probe
pub async fn probe_completion(
    llm: &dyn LanguageModel,
    startup: &StartupConfig,
) -> Result<(), StartupError> {
    let request = GenerateRequest::from_messages(vec![Message::user(startup.probe_prompt.clone())])
        .with_max_tokens(startup.probe_max_tokens);

    llm.generate(request)
        .await
        .map(|_| {
            tracing::info!(model = llm.model_name(), "Completion backend reachable");
        })
        .map_err(|e| StartupError::Probe(e.to_string()))
}

/// Wire the OpenAI backends into an orchestrator
pub fn build_orchestrator(settings: &Settings) -> Result<DialogueOrchestrator, StartupError> {
    let backend = OpenAIBackend::new(OpenAIConfig::from_settings(settings)).map_err(|e| {
        StartupError::Backend {
            component: "completion backend",
            message: e.to_string(),
        }
    })?;
    let llm: Arc<dyn LanguageModel> = Arc::new(LanguageModelAdapter::new(backend));

    let tts = OpenAiTts::new(OpenAiTtsConfig::from_settings(settings)).map_err(|e| {
        StartupError::Backend {
            component: "speech backend",
            message: e.to_string(),
        }
    })?;
    let tts: Arc<dyn TextToSpeech> = Arc::new(tts);
    let renderer = Arc::new(SpeechRenderer::from_settings(tts, settings));

    Ok(
        DialogueOrchestrator::new(llm, renderer, settings.persona.clone())
            .with_completion(settings.completion.clone()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use tutor_core::{Error, GenerateResponse, Result};

    #[derive(Default)]
    struct ProbeLlm {
        fail: bool,
        requests: Mutex<Vec<GenerateRequest>>,
    }

    #[async_trait]
    impl LanguageModel for ProbeLlm {
        async fn generate(&self, request: GenerateRequest) -> Result<GenerateResponse> {
            self.requests.lock().push(request);
            if self.fail {
                return Err(Error::Llm("HTTP 401 Unauthorized: bad key".to_string()));
            }
            Ok(GenerateResponse::text("ok"))
        }

        async fn is_available(&self) -> bool {
            !self.fail
        }

        fn model_name(&self) -> &str {
            "probe"
        }
    }

    #[test]
    fn test_missing_credential() {
        let mut settings = Settings::default();
        settings.openai.api_key = Some("  ".to_string());

        let err = check_credentials(&settings).unwrap_err();
        assert!(matches!(err, StartupError::MissingCredential));
        assert!(err.user_message().starts_with("❌ No OpenAI API key found."));

        settings.openai.api_key = Some("sk-test".to_string());
        assert!(check_credentials(&settings).is_ok());
    }

    #[tokio::test]
    async fn test_probe_request_shape() {
        let llm = ProbeLlm::default();
        probe_completion(&llm, &StartupConfig::default()).await.unwrap();

        let requests = llm.requests.lock();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].max_tokens, Some(5));
        assert_eq!(requests[0].messages.len(), 1);
        assert_eq!(requests[0].messages[0].content, "test");
    }

    #[tokio::test]
    async fn test_probe_failure_message() {
        let llm = ProbeLlm {
            fail: true,
            ..Default::default()
        };
        let err = probe_completion(&llm, &StartupConfig::default())
            .await
            .unwrap_err();

        assert_eq!(
            err.user_message(),
            "❌ API Error: LLM error: HTTP 401 Unauthorized: bad key"
        );
    }

    #[test]
    fn test_build_orchestrator_requires_key_for_remote() {
        let mut settings = Settings::default();
        settings.openai.api_key = None;
        assert!(matches!(
            build_orchestrator(&settings),
            Err(StartupError::Backend { .. })
        ));

        settings.openai.api_key = Some("sk-test".to_string());
        let orchestrator = build_orchestrator(&settings).unwrap();
        assert_eq!(orchestrator.persona().tutor_name, "Serena");
    }
}
