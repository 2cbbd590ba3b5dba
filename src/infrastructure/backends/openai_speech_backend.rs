use super::generation_backend::{with_timeout, BackendError, GenerationBackend, Invocation, RawOutput};
use crate::domain::speech::{split_into_batches, AudioFormat, LanguageCode, SpeechInput};
use async_openai::{
    config::OpenAIConfig,
    types::{CreateSpeechRequest, SpeechModel, SpeechResponseFormat, Voice},
    Client,
};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// OpenAI has a limit of 4096 characters per request
const MAX_BATCH_SIZE: usize = 4096;

const VOICES: &[&str] = &["alloy", "echo", "fable", "onyx", "nova", "shimmer"];

pub struct OpenAiSpeechBackend {
    client: Arc<Client<OpenAIConfig>>,
    model: String,
    default_voice: Option<String>,
}

impl OpenAiSpeechBackend {
    pub fn new(
        client: Arc<Client<OpenAIConfig>>,
        model: String,
        default_voice: Option<String>,
    ) -> Self {
        Self {
            client,
            model,
            default_voice,
        }
    }

    fn voice_for_language(language: LanguageCode) -> &'static str {
        match language {
            LanguageCode::English => "alloy",
            LanguageCode::Spanish => "echo",
            LanguageCode::French => "nova",
            LanguageCode::German => "onyx",
            LanguageCode::Italian => "fable",
            LanguageCode::Portuguese => "shimmer",
        }
    }

    /// Requested voice if the engine knows it, else the configured default, else per language.
    fn select_voice(&self, input: &SpeechInput) -> String {
        input
            .voice
            .as_deref()
            .map(str::to_lowercase)
            .filter(|v| VOICES.contains(&v.as_str()))
            .or_else(|| self.default_voice.clone())
            .unwrap_or_else(|| Self::voice_for_language(input.language).to_string())
    }

    async fn call_openai(&self, text: &str, voice: &str, speed: f32) -> Result<Vec<u8>, BackendError> {
        tracing::info!(
            model = %self.model,
            voice = voice,
            speed = speed,
            text_length = text.len(),
            "Calling OpenAI TTS API"
        );

        let model = match self.model.as_str() {
            "tts-1" => SpeechModel::Tts1,
            "tts-1-hd" => SpeechModel::Tts1Hd,
            other => SpeechModel::Other(other.to_string()),
        };

        let voice_enum = match voice {
            "echo" => Voice::Echo,
            "fable" => Voice::Fable,
            "onyx" => Voice::Onyx,
            "nova" => Voice::Nova,
            "shimmer" => Voice::Shimmer,
            _ => Voice::Alloy,
        };

        let request = CreateSpeechRequest {
            model,
            input: text.to_string(),
            voice: voice_enum,
            response_format: Some(SpeechResponseFormat::Mp3),
            speed: Some(speed),
        };

        let response = self.client.audio().speech(request).await.map_err(|e| {
            tracing::error!(
                error = %e,
                model = %self.model,
                voice = voice,
                text_length = text.len(),
                "OpenAI TTS API call failed"
            );
            BackendError::Request(format!("OpenAI TTS error: {}", e))
        })?;

        Ok(response.bytes.to_vec())
    }

    async fn synthesize(&self, input: &SpeechInput, voice: &str) -> Result<Vec<u8>, BackendError> {
        let batches = split_into_batches(&input.text, MAX_BATCH_SIZE);
        let mut merged_audio = Vec::new();

        for (index, batch) in batches.iter().enumerate() {
            let audio_data = self.call_openai(batch, voice, input.speed.rate()).await?;
            merged_audio.extend(audio_data);

            tracing::debug!(
                batch_index = index,
                total_audio_size = merged_audio.len(),
                "Batch synthesized and merged"
            );
        }

        Ok(merged_audio)
    }
}

#[async_trait]
impl GenerationBackend for OpenAiSpeechBackend {
    fn name(&self) -> &'static str {
        "openai"
    }

    async fn invoke(
        &self,
        invocation: &Invocation,
        timeout: Duration,
    ) -> Result<RawOutput, BackendError> {
        let Invocation::Speech(input) = invocation else {
            return Err(BackendError::Unsupported(format!(
                "{} cannot serve {} invocations",
                self.name(),
                invocation.kind()
            )));
        };

        let start_time = std::time::Instant::now();
        let voice = self.select_voice(input);
        let bytes = with_timeout(timeout, self.synthesize(input, &voice)).await?;

        tracing::info!(
            provider = "openai",
            model = %self.model,
            voice = %voice,
            latency_ms = start_time.elapsed().as_millis(),
            characters_count = input.text.len(),
            audio_size_bytes = bytes.len(),
            "TTS synthesis completed"
        );

        Ok(RawOutput::Audio {
            bytes,
            format: AudioFormat::Mp3,
            voice,
            engine: "openai",
        })
    }
}
