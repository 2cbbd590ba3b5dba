pub mod generation_backend;
pub mod openai_speech_backend;
pub mod openai_text_backend;
pub mod piper_speech_backend;
pub mod polly_speech_backend;
pub mod speak_server_backend;

pub use generation_backend::{BackendError, GenerationBackend, Invocation, RawOutput};
pub use openai_speech_backend::OpenAiSpeechBackend;
pub use openai_text_backend::OpenAiTextBackend;
pub use piper_speech_backend::PiperSpeechBackend;
pub use polly_speech_backend::PollySpeechBackend;
pub use speak_server_backend::SpeakServerBackend;

use crate::infrastructure::config::Config;
use async_openai::{config::OpenAIConfig, Client};
use async_trait::async_trait;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Every engine the registry can hold a singleton for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Engine {
    OpenAiChat,
    Polly,
    OpenAiSpeech,
    Piper,
    SpeakServer,
}

impl Engine {
    pub const ALL: [Engine; 5] = [
        Engine::OpenAiChat,
        Engine::Polly,
        Engine::OpenAiSpeech,
        Engine::Piper,
        Engine::SpeakServer,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Engine::OpenAiChat => "openai-chat",
            Engine::Polly => "polly",
            Engine::OpenAiSpeech => "openai",
            Engine::Piper => "piper",
            Engine::SpeakServer => "speak_server",
        }
    }

    pub fn is_speech(&self) -> bool {
        !matches!(self, Engine::OpenAiChat)
    }
}

impl fmt::Display for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parses speech engine names as they appear in `SPEECH_ENGINES`.
impl FromStr for Engine {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "polly" => Ok(Engine::Polly),
            "openai" | "openai-speech" => Ok(Engine::OpenAiSpeech),
            "piper" => Ok(Engine::Piper),
            "speak_server" | "speak-server" => Ok(Engine::SpeakServer),
            other => Err(format!("unknown speech engine '{}'", other)),
        }
    }
}

/// Builds and probes one engine. Called at most once per engine per process by the registry.
#[async_trait]
pub trait BackendFactory: Send + Sync {
    async fn create(&self, engine: Engine) -> Result<Arc<dyn GenerationBackend>, BackendError>;
}

/// Production factory: constructs engine clients from configuration.
pub struct EngineFactory {
    config: Arc<Config>,
}

impl EngineFactory {
    pub fn new(config: Arc<Config>) -> Self {
        Self { config }
    }

    fn openai_client(&self) -> Result<Arc<Client<OpenAIConfig>>, BackendError> {
        let api_key = self
            .config
            .openai_api_key
            .as_deref()
            .ok_or_else(|| BackendError::Unavailable("OPENAI_API_KEY is not set".to_string()))?;
        Ok(Arc::new(Client::with_config(
            OpenAIConfig::new().with_api_key(api_key),
        )))
    }

    async fn polly(&self) -> Result<Arc<dyn GenerationBackend>, BackendError> {
        tracing::info!("Initializing AWS Polly client with region: {}", self.config.aws_region);

        let has_access_key = std::env::var("AWS_ACCESS_KEY_ID").is_ok();
        let has_secret_key = std::env::var("AWS_SECRET_ACCESS_KEY").is_ok();
        if !has_access_key || !has_secret_key {
            tracing::warn!("AWS credentials not found in environment variables. Will attempt to use other credential providers (instance metadata, etc.)");
        }

        let aws_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(aws_config::Region::new(self.config.aws_region.clone()))
            .load()
            .await;
        tracing::info!(region = ?aws_config.region(), "AWS configuration loaded");

        let backend = PollySpeechBackend::new(Arc::new(aws_sdk_polly::Client::new(&aws_config)));
        backend.probe().await?;
        Ok(Arc::new(backend))
    }

    async fn piper(&self) -> Result<Arc<dyn GenerationBackend>, BackendError> {
        let executable = self
            .config
            .piper_executable
            .clone()
            .ok_or_else(|| BackendError::Unavailable("PIPER_EXECUTABLE is not set".to_string()))?;
        let model = self
            .config
            .piper_model
            .clone()
            .ok_or_else(|| BackendError::Unavailable("PIPER_MODEL is not set".to_string()))?;

        let backend = PiperSpeechBackend::new(executable, model, std::env::temp_dir());
        backend.probe().await?;
        Ok(Arc::new(backend))
    }

    async fn speak_server(&self) -> Result<Arc<dyn GenerationBackend>, BackendError> {
        let url = self
            .config
            .speak_server_url
            .as_deref()
            .ok_or_else(|| BackendError::Unavailable("SPEAK_SERVER_URL is not set".to_string()))?;

        let backend = SpeakServerBackend::new(url);
        backend.probe().await?;
        Ok(Arc::new(backend))
    }
}

#[async_trait]
impl BackendFactory for EngineFactory {
    async fn create(&self, engine: Engine) -> Result<Arc<dyn GenerationBackend>, BackendError> {
        match engine {
            Engine::OpenAiChat => Ok(Arc::new(OpenAiTextBackend::new(
                self.openai_client()?,
                self.config.openai_chat_model.clone(),
            ))),
            Engine::OpenAiSpeech => Ok(Arc::new(OpenAiSpeechBackend::new(
                self.openai_client()?,
                self.config.openai_tts_model.clone(),
                self.config.openai_tts_voice.clone(),
            ))),
            Engine::Polly => self.polly().await,
            Engine::Piper => self.piper().await,
            Engine::SpeakServer => self.speak_server().await,
        }
    }
}
