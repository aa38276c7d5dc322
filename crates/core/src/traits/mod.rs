//! Core traits for the tutor
//!
//! Backends implement these so they can be swapped or mocked.
//!
//! ```text
//! Language Models:
//!   - LanguageModel: chat completion
//!
//! Speech:
//!   - TextToSpeech: text → encoded audio
//! ```

mod llm;
mod speech;

pub use llm::LanguageModel;
pub use speech::TextToSpeech;
