pub mod language;
pub mod text;
pub mod voice;

pub use language::{LanguageCode, LanguageResolver};
pub use text::{clean_text, split_into_batches};
pub use voice::{audio_address, AudioFormat, SpeechSpeed};

use crate::domain::generation::{GenerationError, GenerationRequest};

/// Resolved input for a speech engine.
#[derive(Debug, Clone, PartialEq)]
pub struct SpeechInput {
    pub text: String,
    pub language: LanguageCode,
    /// `None` lets the engine pick its default voice for the language.
    pub voice: Option<String>,
    pub speed: SpeechSpeed,
}

impl SpeechInput {
    pub fn from_request(
        request: &GenerationRequest,
        resolver: &LanguageResolver,
    ) -> Result<Self, GenerationError> {
        let text = clean_text(&request.text_or_empty("text"));
        if text.is_empty() {
            return Err(GenerationError::UnsupportedRequest(
                "speech text is empty".to_string(),
            ));
        }

        let requested_language = request
            .text("language")
            .unwrap_or_else(|| "en-US".to_string());
        let language = if requested_language.eq_ignore_ascii_case("auto") {
            resolver.detect(&text)
        } else {
            LanguageCode::from_locale(&requested_language).ok_or_else(|| {
                GenerationError::UnsupportedRequest(format!(
                    "unsupported language '{}'",
                    requested_language
                ))
            })?
        };

        let requested_speed = request
            .text("speed")
            .unwrap_or_else(|| "normal".to_string());
        let speed = SpeechSpeed::parse(&requested_speed).ok_or_else(|| {
            GenerationError::UnsupportedRequest(format!("unsupported speed '{}'", requested_speed))
        })?;

        Ok(Self {
            text,
            language,
            voice: request.text("voice").filter(|v| !v.is_empty()),
            speed,
        })
    }
}
