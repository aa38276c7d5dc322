//! Speech synthesis traits

use async_trait::async_trait;

use crate::{AudioClip, Result, VoiceConfig};

/// Text-to-Speech interface
///
/// Implementations return the whole encoded clip in memory.
///
/// # Example
///
/// ```ignore
/// let tts: Arc<dyn TextToSpeech> = Arc::new(OpenAiTts::new(config)?);
/// let clip = tts.synthesize("你好！", &VoiceConfig::new("nova")).await?;
/// ```
#[async_trait]
pub trait TextToSpeech: Send + Sync + 'static {
    /// Synthesize text to encoded audio
    async fn synthesize(&self, text: &str, voice: &VoiceConfig) -> Result<AudioClip>;

    /// Get model name for logging
    fn model_name(&self) -> &str;
}
