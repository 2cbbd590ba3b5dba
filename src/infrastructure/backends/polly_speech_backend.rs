use super::generation_backend::{with_timeout, BackendError, GenerationBackend, Invocation, RawOutput};
use crate::domain::speech::{split_into_batches, AudioFormat, LanguageCode, SpeechInput, SpeechSpeed};
use async_trait::async_trait;
use aws_sdk_polly::{
    types::{Engine, OutputFormat, TextType, VoiceId},
    Client as PollyClient,
};
use std::sync::Arc;
use std::time::Duration;

/// AWS Polly has a limit of 3000 characters per request; SSML wrapping eats into it.
const MAX_BATCH_SIZE: usize = 2800;

pub struct PollySpeechBackend {
    polly_client: Arc<PollyClient>,
}

impl PollySpeechBackend {
    pub fn new(polly_client: Arc<PollyClient>) -> Self {
        Self { polly_client }
    }

    /// Cheap authenticated call used once, at registry initialization.
    pub async fn probe(&self) -> Result<(), BackendError> {
        self.polly_client
            .describe_voices()
            .send()
            .await
            .map(|_| ())
            .map_err(|e| BackendError::Unavailable(format!("AWS Polly probe failed: {}", e)))
    }

    fn voice_for_language(language: LanguageCode) -> &'static str {
        match language {
            LanguageCode::English => "Joanna",
            LanguageCode::Spanish => "Lupe",
            LanguageCode::French => "Lea",
            LanguageCode::German => "Vicki",
            LanguageCode::Italian => "Bianca",
            LanguageCode::Portuguese => "Camila",
        }
    }

    fn ssml(text: &str, speed: SpeechSpeed) -> String {
        let escaped = text
            .replace('&', "&amp;")
            .replace('<', "&lt;")
            .replace('>', "&gt;");
        format!(
            "<speak><prosody rate=\"{}%\">{}</prosody></speak>",
            (speed.rate() * 100.0).round() as u32,
            escaped
        )
    }

    async fn call_polly(
        &self,
        text: &str,
        voice_name: &str,
        speed: SpeechSpeed,
    ) -> Result<Vec<u8>, BackendError> {
        let voice_id = VoiceId::from(voice_name);
        let engine = Engine::Neural;

        tracing::info!(
            voice = voice_name,
            engine = ?engine,
            output_format = "Mp3",
            text_length = text.len(),
            "Calling AWS Polly synthesize_speech"
        );

        let result = self
            .polly_client
            .synthesize_speech()
            .text(Self::ssml(text, speed))
            .text_type(TextType::Ssml)
            .voice_id(voice_id)
            .output_format(OutputFormat::Mp3)
            .engine(engine.clone())
            .send()
            .await
            .map_err(|e| {
                tracing::error!(
                    error = ?e,
                    error_display = %e,
                    voice = voice_name,
                    engine = ?engine,
                    text_length = text.len(),
                    "AWS Polly synthesize_speech failed"
                );
                BackendError::Request(format!("AWS Polly error: {}", e))
            })?;

        let audio_stream = result.audio_stream.collect().await.map_err(|e| {
            tracing::error!(error = %e, "Failed to collect audio stream from Polly response");
            BackendError::Request(format!("Failed to read audio stream: {}", e))
        })?;

        Ok(audio_stream.into_bytes().to_vec())
    }

    async fn synthesize(&self, input: &SpeechInput, voice: &str) -> Result<Vec<u8>, BackendError> {
        let batches = split_into_batches(&input.text, MAX_BATCH_SIZE);
        tracing::info!(
            batch_count = batches.len(),
            text_length = input.text.len(),
            "Text split into batches"
        );

        let mut merged_audio = Vec::new();
        for (index, batch) in batches.iter().enumerate() {
            let audio_data = self.call_polly(batch, voice, input.speed).await?;
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
impl GenerationBackend for PollySpeechBackend {
    fn name(&self) -> &'static str {
        "polly"
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
        // Polly voice ids are case-sensitive names like "Camila".
        let voice = input
            .voice
            .clone()
            .unwrap_or_else(|| Self::voice_for_language(input.language).to_string());
        let bytes = with_timeout(timeout, self.synthesize(input, &voice)).await?;

        let duration = start_time.elapsed();
        let throughput_chars_per_sec = if duration.as_secs_f64() > 0.0 {
            input.text.len() as f64 / duration.as_secs_f64()
        } else {
            0.0
        };

        tracing::info!(
            provider = "polly",
            latency_ms = duration.as_millis(),
            characters_count = input.text.len(),
            audio_size_bytes = bytes.len(),
            throughput_chars_per_sec = format!("{:.2}", throughput_chars_per_sec),
            "TTS synthesis completed"
        );

        Ok(RawOutput::Audio {
            bytes,
            format: AudioFormat::Mp3,
            voice,
            engine: "polly",
        })
    }
}
