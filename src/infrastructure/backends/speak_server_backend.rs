use super::generation_backend::{with_timeout, BackendError, GenerationBackend, Invocation, RawOutput};
use crate::domain::speech::{AudioFormat, SpeechInput};
use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;

const PROBE_TIMEOUT: Duration = Duration::from_secs(3);

#[derive(Debug, Serialize)]
struct SpeakBody<'a> {
    text: &'a str,
}

/// Local text-to-speech server exposing `POST /speak`; answers with an MP3 body.
pub struct SpeakServerBackend {
    base_url: String,
    http_client: reqwest::Client,
}

impl SpeakServerBackend {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http_client: reqwest::Client::new(),
        }
    }

    fn speak_url(&self) -> String {
        format!("{}/speak", self.base_url)
    }

    /// Any HTTP answer counts as reachable; only connection failures do not.
    pub async fn probe(&self) -> Result<(), BackendError> {
        self.http_client
            .get(&self.base_url)
            .timeout(PROBE_TIMEOUT)
            .send()
            .await
            .map(|_| ())
            .map_err(|e| {
                BackendError::Unavailable(format!(
                    "speak server at {} unreachable: {}",
                    self.base_url, e
                ))
            })
    }

    async fn speak(&self, text: &str) -> Result<Vec<u8>, BackendError> {
        let response = self
            .http_client
            .post(self.speak_url())
            .json(&SpeakBody { text })
            .send()
            .await
            .map_err(|e| BackendError::Request(format!("speak server request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            tracing::error!(status = %status, error = %error_text, "Speak server returned an error");
            return Err(BackendError::Request(format!(
                "speak server returned {}: {}",
                status, error_text
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| BackendError::Request(format!("Failed to read speak server audio: {}", e)))?;
        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl GenerationBackend for SpeakServerBackend {
    fn name(&self) -> &'static str {
        "speak_server"
    }

    async fn invoke(
        &self,
        invocation: &Invocation,
        timeout: Duration,
    ) -> Result<RawOutput, BackendError> {
        let Invocation::Speech(SpeechInput { text, voice, .. }) = invocation else {
            return Err(BackendError::Unsupported(format!(
                "{} cannot serve {} invocations",
                self.name(),
                invocation.kind()
            )));
        };

        let start_time = std::time::Instant::now();
        let bytes = with_timeout(timeout, self.speak(text)).await?;
        if bytes.is_empty() {
            return Err(BackendError::EmptyOutput);
        }

        tracing::info!(
            provider = "speak_server",
            latency_ms = start_time.elapsed().as_millis(),
            characters_count = text.len(),
            audio_size_bytes = bytes.len(),
            "TTS synthesis completed"
        );

        Ok(RawOutput::Audio {
            bytes,
            format: AudioFormat::Mp3,
            // The server has a single fixed voice.
            voice: voice.clone().unwrap_or_else(|| "default".to_string()),
            engine: "speak_server",
        })
    }
}
