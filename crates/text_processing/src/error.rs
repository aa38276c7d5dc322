//! Text processing errors

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TextProcessingError {
    #[error("Invalid skip marker: {0}")]
    InvalidMarker(String),

    #[error("Invalid name pattern: {0}")]
    InvalidPattern(String),
}

impl From<TextProcessingError> for tutor_core::Error {
    fn from(err: TextProcessingError) -> Self {
        tutor_core::Error::TextProcessing(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, TextProcessingError>;
