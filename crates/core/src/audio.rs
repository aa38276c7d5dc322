//! Audio types
//!
//! Synthesized speech is kept in memory as an [`AudioClip`] and handed to the
//! presentation layer as an [`AudioAsset`] keyed by message id.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::conversation::MessageId;
use crate::error::Error;

/// Encoded audio formats supported by the synthesis API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AudioFormat {
    #[default]
    Mp3,
    Opus,
    Aac,
    Flac,
    Wav,
    Pcm,
}

impl AudioFormat {
    /// Wire name used by the synthesis API
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mp3 => "mp3",
            Self::Opus => "opus",
            Self::Aac => "aac",
            Self::Flac => "flac",
            Self::Wav => "wav",
            Self::Pcm => "pcm",
        }
    }

    /// MIME type used in data URIs and `<source type=...>`
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Mp3 => "audio/mp3",
            Self::Opus => "audio/opus",
            Self::Aac => "audio/aac",
            Self::Flac => "audio/flac",
            Self::Wav => "audio/wav",
            Self::Pcm => "audio/pcm",
        }
    }
}

impl FromStr for AudioFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mp3" => Ok(Self::Mp3),
            "opus" => Ok(Self::Opus),
            "aac" => Ok(Self::Aac),
            "flac" => Ok(Self::Flac),
            "wav" => Ok(Self::Wav),
            "pcm" => Ok(Self::Pcm),
            other => Err(Error::Config(format!("Unsupported audio format: {}", other))),
        }
    }
}

/// Encoded audio held in memory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioClip {
    pub bytes: Vec<u8>,
    pub format: AudioFormat,
}

impl AudioClip {
    pub fn new(bytes: Vec<u8>, format: AudioFormat) -> Self {
        Self { bytes, format }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// What the presentation layer shows under a message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AudioPayload {
    /// Inline playable audio
    Playable {
        mime_type: String,
        data_uri: String,
    },
    /// Synthesis failed; the display string replaces the player
    Unavailable { message: String },
}

/// Audio for one assistant message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioAsset {
    pub message_id: MessageId,
    pub payload: AudioPayload,
}

impl AudioAsset {
    pub fn playable(
        message_id: MessageId,
        mime_type: impl Into<String>,
        data_uri: impl Into<String>,
    ) -> Self {
        Self {
            message_id,
            payload: AudioPayload::Playable {
                mime_type: mime_type.into(),
                data_uri: data_uri.into(),
            },
        }
    }

    pub fn unavailable(message_id: MessageId, message: impl Into<String>) -> Self {
        Self {
            message_id,
            payload: AudioPayload::Unavailable {
                message: message.into(),
            },
        }
    }

    pub fn is_playable(&self) -> bool {
        matches!(self.payload, AudioPayload::Playable { .. })
    }

    /// Embeddable markup for this asset
    pub fn to_html(&self) -> String {
        match &self.payload {
            AudioPayload::Playable {
                mime_type,
                data_uri,
            } => format!(
                concat!(
                    "<div style=\"margin: 8px 0;\">",
                    "<audio controls style=\"height: 30px; width: 180px;\">",
                    "<source src=\"{}\" type=\"{}\">",
                    "</audio>",
                    "</div>"
                ),
                data_uri, mime_type
            ),
            AudioPayload::Unavailable { message } => message.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_parsing() {
        assert_eq!("MP3".parse::<AudioFormat>().unwrap(), AudioFormat::Mp3);
        assert_eq!("opus".parse::<AudioFormat>().unwrap(), AudioFormat::Opus);
        assert!("ogg".parse::<AudioFormat>().is_err());
        assert_eq!(AudioFormat::Mp3.mime_type(), "audio/mp3");
    }

    #[test]
    fn test_playable_html() {
        let asset = AudioAsset::playable(2, "audio/mp3", "data:audio/mp3;base64,AAAA");
        let html = asset.to_html();
        assert!(asset.is_playable());
        assert!(html.contains("<audio controls"));
        assert!(html.contains("src=\"data:audio/mp3;base64,AAAA\""));
        assert!(html.contains("type=\"audio/mp3\""));
    }

    #[test]
    fn test_unavailable_html_is_message() {
        let asset = AudioAsset::unavailable(4, "Error generating audio: boom");
        assert!(!asset.is_playable());
        assert_eq!(asset.to_html(), "Error generating audio: boom");
    }
}
