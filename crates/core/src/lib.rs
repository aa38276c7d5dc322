//! Core traits and types for the cafe tutor
//!
//! This crate provides foundational types used across all other crates:
//! - Conversation log, user info and audio asset types
//! - LLM request/response types
//! - Target script definitions
//! - Core traits for pluggable backends (LLM, TTS)
//! - Error types

pub mod audio;
pub mod conversation;
pub mod error;
pub mod language;
pub mod llm_types;
pub mod traits;
pub mod voice_config;

pub use audio::{AudioAsset, AudioClip, AudioFormat, AudioPayload};
pub use conversation::{ChatMessage, MessageId, MessageLog, TurnRole, UserInfo, NAME_PLACEHOLDER};
pub use error::{Error, Result};
pub use language::{Script, TARGET_PUNCTUATION};
pub use llm_types::{FinishReason, GenerateRequest, GenerateResponse, Message, Role, TokenUsage};
pub use voice_config::VoiceConfig;

pub use traits::{LanguageModel, TextToSpeech};
