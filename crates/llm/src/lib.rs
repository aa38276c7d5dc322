//! Chat completion for the cafe tutor
//!
//! Features:
//! - OpenAI-compatible chat completion backend (OpenAI or local servers)
//! - Prompt assembly from persona, learner details and history
//! - Adapter exposing any backend as a core `LanguageModel`

pub mod adapter;
pub mod backend;
pub mod prompt;

pub use adapter::LanguageModelAdapter;
pub use backend::{
    FinishReason, GenerationOptions, GenerationResult, LlmBackend, OpenAIBackend, OpenAIConfig,
};
pub use prompt::PromptBuilder;

use thiserror::Error;

/// LLM errors
#[derive(Error, Debug)]
pub enum LlmError {
    #[error("API error: {0}")]
    Api(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Timeout")]
    Timeout,

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            LlmError::Timeout
        } else {
            LlmError::Network(err.to_string())
        }
    }
}

impl From<LlmError> for tutor_core::Error {
    fn from(err: LlmError) -> Self {
        tutor_core::Error::Llm(err.to_string())
    }
}
