//! OpenAI-compatible speech synthesis
//!
//! Calls `POST {endpoint}/audio/speech` and buffers the encoded audio in
//! memory.

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::time::{Duration, Instant};

use tutor_config::Settings;
use tutor_core::{AudioClip, Result, TextToSpeech, VoiceConfig};

use crate::PipelineError;

/// Speech synthesis client configuration
#[derive(Debug, Clone)]
pub struct OpenAiTtsConfig {
    /// API endpoint, e.g. https://api.openai.com/v1
    pub endpoint: String,
    pub api_key: String,
    /// Synthesis model (tts-1, tts-1-hd)
    pub model: String,
    pub organization: Option<String>,
    pub timeout: Duration,
}

impl Default for OpenAiTtsConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.openai.com/v1".to_string(),
            api_key: String::new(),
            model: "tts-1".to_string(),
            organization: None,
            timeout: Duration::from_secs(30),
        }
    }
}

impl OpenAiTtsConfig {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
            ..Default::default()
        }
    }

    /// Build from the `openai` and `speech` settings sections
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            endpoint: settings.openai.endpoint.clone(),
            api_key: settings.openai.credential().unwrap_or_default().to_string(),
            model: settings.speech.model.clone(),
            organization: settings.openai.organization.clone(),
            timeout: Duration::from_secs(settings.openai.timeout_seconds),
        }
    }
}

/// Body sent to `/audio/speech`
#[derive(Debug, Serialize)]
struct SpeechRequest<'a> {
    model: &'a str,
    input: &'a str,
    voice: &'a str,
    response_format: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    speed: Option<f32>,
}

/// OpenAI-compatible TTS client
pub struct OpenAiTts {
    config: OpenAiTtsConfig,
    client: Client,
}

impl OpenAiTts {
    pub fn new(config: OpenAiTtsConfig) -> std::result::Result<Self, PipelineError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| {
                PipelineError::Configuration(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self { config, client })
    }

    fn speech_url(&self) -> String {
        format!("{}/audio/speech", self.config.endpoint.trim_end_matches('/'))
    }

    async fn request_speech(
        &self,
        text: &str,
        voice: &VoiceConfig,
    ) -> std::result::Result<AudioClip, PipelineError> {
        let body = SpeechRequest {
            model: &self.config.model,
            input: text,
            voice: &voice.voice_id,
            response_format: voice.format.as_str(),
            speed: voice.speed,
        };

        let mut request = self
            .client
            .post(self.speech_url())
            .bearer_auth(&self.config.api_key)
            .json(&body);

        if let Some(ref org) = self.config.organization {
            request = request.header("OpenAI-Organization", org);
        }

        let response = request.send().await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(PipelineError::Tts(format!("HTTP {}: {}", status, error_text)));
        }

        let bytes = response.bytes().await?;
        if bytes.is_empty() {
            return Err(PipelineError::Tts("Empty audio response".to_string()));
        }

        Ok(AudioClip::new(bytes.to_vec(), voice.format))
    }
}

#[async_trait]
impl TextToSpeech for OpenAiTts {
    async fn synthesize(&self, text: &str, voice: &VoiceConfig) -> Result<AudioClip> {
        let start = Instant::now();
        let clip = self.request_speech(text, voice).await?;

        tracing::debug!(
            model = %self.config.model,
            voice = %voice.voice_id,
            chars = text.chars().count(),
            bytes = clip.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Synthesized speech"
        );

        Ok(clip)
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}
