use crate::domain::generation::{GenerationError, Prompt};
use crate::domain::speech::{AudioFormat, SpeechInput};
use async_trait::async_trait;
use std::time::Duration;

/// What a backend is asked to do.
#[derive(Debug, Clone, PartialEq)]
pub enum Invocation {
    Completion(Prompt),
    Speech(SpeechInput),
}

impl Invocation {
    pub fn kind(&self) -> &'static str {
        match self {
            Invocation::Completion(_) => "completion",
            Invocation::Speech(_) => "speech",
        }
    }
}

/// Raw backend output, before sanitizing.
#[derive(Debug, Clone, PartialEq)]
pub enum RawOutput {
    Text(String),
    Audio {
        bytes: Vec<u8>,
        format: AudioFormat,
        /// Voice the engine actually used.
        voice: String,
        engine: &'static str,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("backend unavailable: {0}")]
    Unavailable(String),
    #[error("timed out after {0:?}")]
    Timeout(Duration),
    #[error("request failed: {0}")]
    Request(String),
    #[error("backend returned no output")]
    EmptyOutput,
    #[error("unsupported invocation: {0}")]
    Unsupported(String),
}

impl From<BackendError> for GenerationError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::Unavailable(msg) => GenerationError::BackendUnavailable(msg),
            BackendError::Timeout(limit) => GenerationError::InvocationTimeout(limit),
            BackendError::Request(msg) => GenerationError::Invocation(msg),
            BackendError::EmptyOutput => {
                GenerationError::MalformedOutput("backend returned no output".to_string())
            }
            BackendError::Unsupported(msg) => GenerationError::UnsupportedRequest(msg),
        }
    }
}

/// Uniform contract over every generation engine (text model or speech engine).
///
/// Implementations are responsible for:
/// - Engine-specific request limits (batching long text)
/// - Honoring `timeout` for their own I/O; callers also bound the whole call
/// - Rejecting invocations of the wrong kind with `Unsupported`
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    fn name(&self) -> &'static str;

    async fn invoke(
        &self,
        invocation: &Invocation,
        timeout: Duration,
    ) -> Result<RawOutput, BackendError>;
}

/// Run `future` with a deadline, mapping expiry to `BackendError::Timeout`.
pub async fn with_timeout<T, F>(timeout: Duration, future: F) -> Result<T, BackendError>
where
    F: std::future::Future<Output = Result<T, BackendError>>,
{
    tokio::time::timeout(timeout, future)
        .await
        .map_err(|_| BackendError::Timeout(timeout))?
}
