//! Speech pipeline for the cafe tutor
//!
//! This crate turns tutor replies into playable audio:
//! - OpenAI-compatible speech synthesis client
//! - Speech renderer (speakable filtering, synthesis, inline embedding)

pub mod renderer;
pub mod tts;

pub use renderer::{SpeechRenderer, AUDIO_ERROR_PREFIX};
pub use tts::{OpenAiTts, OpenAiTtsConfig};

use thiserror::Error;

/// Pipeline errors
#[derive(Error, Debug, Clone)]
pub enum PipelineError {
    #[error("TTS error: {0}")]
    Tts(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Timeout")]
    Timeout,

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl From<reqwest::Error> for PipelineError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            PipelineError::Timeout
        } else {
            PipelineError::Network(err.to_string())
        }
    }
}

impl From<PipelineError> for tutor_core::Error {
    fn from(err: PipelineError) -> Self {
        match err {
            PipelineError::Tts(msg) => tutor_core::Error::Tts(msg),
            other => tutor_core::Error::Tts(other.to_string()),
        }
    }
}
