use super::generation_backend::{with_timeout, BackendError, GenerationBackend, Invocation, RawOutput};
use crate::domain::speech::{AudioFormat, SpeechInput};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Local Piper executable; one voice model per backend.
pub struct PiperSpeechBackend {
    executable: PathBuf,
    model: PathBuf,
    scratch_dir: PathBuf,
}

impl PiperSpeechBackend {
    pub fn new(executable: PathBuf, model: PathBuf, scratch_dir: PathBuf) -> Self {
        Self {
            executable,
            model,
            scratch_dir,
        }
    }

    /// The model file must exist and the executable must run.
    pub async fn probe(&self) -> Result<(), BackendError> {
        tokio::fs::metadata(&self.model).await.map_err(|e| {
            BackendError::Unavailable(format!(
                "Piper model {} not readable: {}",
                self.model.display(),
                e
            ))
        })?;

        let status = with_timeout(PROBE_TIMEOUT, async {
            Command::new(&self.executable)
                .arg("--help")
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .kill_on_drop(true)
                .status()
                .await
                .map_err(|e| BackendError::Unavailable(format!("Piper not runnable: {}", e)))
        })
        .await?;

        if !status.success() {
            return Err(BackendError::Unavailable(format!(
                "Piper exited with {}",
                status
            )));
        }
        Ok(())
    }

    fn voice_name(&self) -> String {
        self.model
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "piper".to_string())
    }

    /// Piper's length scale is the inverse of playback speed.
    fn length_scale(input: &SpeechInput) -> String {
        format!("{:.2}", 1.0 / input.speed.rate())
    }

    async fn synthesize(&self, input: &SpeechInput, output: &Path) -> Result<Vec<u8>, BackendError> {
        let mut child = Command::new(&self.executable)
            .arg("--model")
            .arg(&self.model)
            .arg("--output_file")
            .arg(output)
            .arg("--length_scale")
            .arg(Self::length_scale(input))
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| BackendError::Request(format!("Failed to start Piper: {}", e)))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(input.text.as_bytes())
                .await
                .map_err(|e| BackendError::Request(format!("Failed to feed Piper: {}", e)))?;
        }

        let result = child
            .wait_with_output()
            .await
            .map_err(|e| BackendError::Request(format!("Piper failed: {}", e)))?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            tracing::error!(status = %result.status, stderr = %stderr, "Piper synthesis failed");
            return Err(BackendError::Request(format!(
                "Piper exited with {}",
                result.status
            )));
        }

        tokio::fs::read(output)
            .await
            .map_err(|e| BackendError::Request(format!("Piper output unreadable: {}", e)))
    }
}

#[async_trait]
impl GenerationBackend for PiperSpeechBackend {
    fn name(&self) -> &'static str {
        "piper"
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
        let output = self
            .scratch_dir
            .join(format!("piper_{}.wav", uuid::Uuid::new_v4().simple()));

        let result = with_timeout(timeout, self.synthesize(input, &output)).await;
        if let Err(e) = tokio::fs::remove_file(&output).await {
            tracing::debug!(error = %e, path = %output.display(), "Piper scratch file not removed");
        }
        let bytes = result?;
        if bytes.is_empty() {
            return Err(BackendError::EmptyOutput);
        }

        tracing::info!(
            provider = "piper",
            latency_ms = start_time.elapsed().as_millis(),
            characters_count = input.text.len(),
            audio_size_bytes = bytes.len(),
            "TTS synthesis completed"
        );

        Ok(RawOutput::Audio {
            bytes,
            format: AudioFormat::Wav,
            voice: self.voice_name(),
            engine: "piper",
        })
    }
}
