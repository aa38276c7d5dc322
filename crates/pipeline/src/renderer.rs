//! Speech renderer
//!
//! Turns assistant text into an [`AudioAsset`]: filter to the speakable span,
//! synthesize it, and embed the bytes as a base64 data URI. Synthesis failures
//! never propagate; they become an asset carrying a display string instead.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use std::sync::Arc;
use std::time::Instant;

use tutor_config::Settings;
use tutor_core::{AudioAsset, AudioClip, MessageId, TextToSpeech, VoiceConfig};
use tutor_text_processing::SpeakableFilter;

/// Prefix of the display string shown when synthesis fails
pub const AUDIO_ERROR_PREFIX: &str = "Error generating audio";

/// Renders assistant messages to embeddable audio
pub struct SpeechRenderer {
    tts: Arc<dyn TextToSpeech>,
    filter: SpeakableFilter,
    voice: VoiceConfig,
}

impl SpeechRenderer {
    pub fn new(tts: Arc<dyn TextToSpeech>, voice: VoiceConfig) -> Self {
        Self {
            tts,
            filter: SpeakableFilter::default(),
            voice,
        }
    }

    /// Voice from the `speech` settings section
    pub fn from_settings(tts: Arc<dyn TextToSpeech>, settings: &Settings) -> Self {
        let mut voice = VoiceConfig::new(settings.speech.voice.clone())
            .with_format(settings.speech.format);
        if let Some(speed) = settings.speech.speed {
            voice = voice.with_speed(speed);
        }
        Self::new(tts, voice)
    }

    pub fn with_filter(mut self, filter: SpeakableFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn voice(&self) -> &VoiceConfig {
        &self.voice
    }

    /// Speakable span of `text`, `None` when there is nothing to say
    pub fn speakable(&self, text: &str, user_name: Option<&str>) -> Option<String> {
        self.filter.extract(text, user_name)
    }

    /// Synthesize already-filtered text for one message
    pub async fn render(&self, message_id: MessageId, speakable: &str) -> AudioAsset {
        let start = Instant::now();

        match self.tts.synthesize(speakable, &self.voice).await {
            Ok(clip) => {
                let elapsed = start.elapsed();
                metrics::histogram!("tutor_synthesis_duration_seconds").record(elapsed.as_secs_f64());
                tracing::debug!(
                    message_id,
                    bytes = clip.len(),
                    elapsed_ms = elapsed.as_millis() as u64,
                    "Rendered audio"
                );
                embed(message_id, &clip)
            }
            Err(e) => {
                metrics::counter!("tutor_synthesis_failures_total").increment(1);
                tracing::warn!(message_id, error = %e, "Speech synthesis failed");
                AudioAsset::unavailable(message_id, format!("{}: {}", AUDIO_ERROR_PREFIX, e))
            }
        }
    }

    /// Filter `text` and render it; `None` when nothing is speakable
    pub async fn render_text(
        &self,
        message_id: MessageId,
        text: &str,
        user_name: Option<&str>,
    ) -> Option<AudioAsset> {
        let speakable = self.speakable(text, user_name)?;
        Some(self.render(message_id, &speakable).await)
    }
}

fn embed(message_id: MessageId, clip: &AudioClip) -> AudioAsset {
    let mime_type = clip.format.mime_type();
    let data_uri = format!("data:{};base64,{}", mime_type, BASE64.encode(&clip.bytes));
    AudioAsset::playable(message_id, mime_type, data_uri)
}
