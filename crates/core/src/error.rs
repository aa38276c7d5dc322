//! Error types shared across crates

use thiserror::Error;

/// Core error type
///
/// Crate-specific errors convert into this at crate boundaries.
#[derive(Error, Debug)]
pub enum Error {
    #[error("LLM error: {0}")]
    Llm(String),

    #[error("TTS error: {0}")]
    Tts(String),

    #[error("Text processing error: {0}")]
    TextProcessing(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Conversation error: {0}")]
    Conversation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
