//! Configuration management for the cafe tutor
//!
//! Supports loading configuration from:
//! - `config/default.{toml,yaml,json}`
//! - `config/{env}.*` overlays (selected by `CAFE_TUTOR_ENV`)
//! - Environment variables (`CAFE_TUTOR__` prefix, `__` separator)
//! - `OPENAI_API_KEY` as a fallback for the API credential

pub mod prompts;
pub mod settings;

pub use prompts::{fill_name, PersonaConfig, NAME_PLACEHOLDER};
pub use settings::{
    load_settings, load_settings_from, ApiConfig, CompletionConfig, ObservabilityConfig,
    RuntimeEnvironment, ServerConfig, Settings, SpeechConfig, StartupConfig,
};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },
}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}

impl From<ConfigError> for tutor_core::Error {
    fn from(err: ConfigError) -> Self {
        tutor_core::Error::Config(err.to_string())
    }
}
