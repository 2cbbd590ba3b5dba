use crate::domain::generation::CacheKey;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpeechSpeed {
    Slow,
    Normal,
    Fast,
}

impl SpeechSpeed {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "slow" => Some(SpeechSpeed::Slow),
            "normal" => Some(SpeechSpeed::Normal),
            "fast" => Some(SpeechSpeed::Fast),
            _ => None,
        }
    }

    /// Playback rate relative to the engine's natural speed.
    pub fn rate(&self) -> f32 {
        match self {
            SpeechSpeed::Slow => 0.8,
            SpeechSpeed::Normal => 1.0,
            SpeechSpeed::Fast => 1.2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioFormat {
    Mp3,
    Wav,
}

impl AudioFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            AudioFormat::Mp3 => "mp3",
            AudioFormat::Wav => "wav",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            AudioFormat::Mp3 => "audio/mpeg",
            AudioFormat::Wav => "audio/wav",
        }
    }
}

/// Public address of a cached clip: `<prefix>/<digest>.<ext>`.
pub fn audio_address(prefix: &str, key: &CacheKey, format: AudioFormat) -> String {
    format!(
        "{}/{}.{}",
        prefix.trim_end_matches('/'),
        key.as_str(),
        format.extension()
    )
}
