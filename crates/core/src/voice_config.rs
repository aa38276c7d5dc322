//! Voice configuration types for TTS

use serde::{Deserialize, Serialize};

use crate::audio::AudioFormat;

/// Voice configuration for TTS
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoiceConfig {
    /// Voice identifier
    pub voice_id: String,
    /// Output encoding
    #[serde(default)]
    pub format: AudioFormat,
    /// Speech speed (0.25 - 4.0); provider default when unset
    #[serde(default)]
    pub speed: Option<f32>,
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            voice_id: "nova".to_string(),
            format: AudioFormat::Mp3,
            speed: None,
        }
    }
}

impl VoiceConfig {
    /// Create a new voice config for the given voice
    pub fn new(voice_id: impl Into<String>) -> Self {
        Self {
            voice_id: voice_id.into(),
            ..Default::default()
        }
    }

    /// Set the output format
    pub fn with_format(mut self, format: AudioFormat) -> Self {
        self.format = format;
        self
    }

    /// Set the speech speed
    pub fn with_speed(mut self, speed: f32) -> Self {
        self.speed = Some(speed.clamp(0.25, 4.0));
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_voice_config_builder() {
        let config = VoiceConfig::new("alloy")
            .with_format(AudioFormat::Opus)
            .with_speed(9.0);
        assert_eq!(config.voice_id, "alloy");
        assert_eq!(config.format, AudioFormat::Opus);
        assert_eq!(config.speed, Some(4.0));
    }
}
