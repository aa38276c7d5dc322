//! Text-to-Speech backends

mod openai;

pub use openai::{OpenAiTts, OpenAiTtsConfig};
