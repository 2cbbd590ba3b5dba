use super::capability::Capability;
use super::content::{Artifact, SpeechContent};
use super::dto::{
    ChatRequest, FunFactsRequest, GameRequest, GenerationResponse, IntroRequest, PhrasesRequest,
    QuizRequest, SpeechRequest, WordBreakdownRequest,
};
use super::error::GenerationError;
use super::key::CacheKey;
use super::prompt::Prompt;
use super::request::GenerationRequest;
use crate::domain::fallback::FallbackLibrary;
use crate::domain::sanitizer::ResponseSanitizer;
use crate::domain::speech::{audio_address, LanguageResolver, SpeechInput};
use crate::infrastructure::backends::{Invocation, RawOutput};
use crate::infrastructure::config::Config;
use crate::infrastructure::registry::{BackendDescriptor, BackendRegistry};
use crate::infrastructure::repositories::{CacheStats, CacheStore, ClearReport};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::Instrument;
use uuid::Uuid;

/// Longest slice of a rejected backend payload that reaches the debug log.
const RAW_PREVIEW_CHARS: usize = 200;

#[derive(Debug, Clone, PartialEq)]
pub struct GenerationResult {
    pub artifact: Artifact,
    pub from_cache: bool,
    pub generation_time_ms: u64,
    /// The artifact came from the fallback library.
    pub degraded: bool,
}

impl GenerationResult {
    pub fn into_response(self) -> GenerationResponse {
        GenerationResponse {
            content: self.artifact.content,
            from_cache: self.from_cache,
            generation_time_ms: self.generation_time_ms,
        }
    }
}

#[derive(Debug, Clone)]
pub struct OrchestratorSettings {
    pub audio_url_prefix: String,
    /// Bound on one backend invocation.
    pub backend_timeout: Duration,
    /// Bound on each cache read or write.
    pub cache_timeout: Duration,
}

impl From<&Config> for OrchestratorSettings {
    fn from(config: &Config) -> Self {
        Self {
            audio_url_prefix: config.audio_url_prefix.clone(),
            backend_timeout: config.backend_timeout,
            cache_timeout: config.cache_timeout,
        }
    }
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

pub struct Orchestrator {
    store: Arc<dyn CacheStore>,
    registry: Arc<BackendRegistry>,
    sanitizer: ResponseSanitizer,
    fallback: FallbackLibrary,
    languages: LanguageResolver,
    settings: OrchestratorSettings,
}

impl Orchestrator {
    pub fn new(
        store: Arc<dyn CacheStore>,
        registry: Arc<BackendRegistry>,
        sanitizer: ResponseSanitizer,
        fallback: FallbackLibrary,
        settings: OrchestratorSettings,
    ) -> Self {
        Self {
            store,
            registry,
            sanitizer,
            fallback,
            languages: LanguageResolver::new(),
            settings,
        }
    }

    async fn generate_in_span(&self, request: &GenerationRequest) -> GenerationResult {
        let start_time = Instant::now();
        let capability = request.capability();
        let key = CacheKey::for_request(request);

        if let Some(artifact) = self.cached(&key, capability).await {
            let generation_time_ms = start_time.elapsed().as_millis() as u64;
            tracing::info!(key = %key, latency_ms = generation_time_ms, "Cache hit");
            return GenerationResult {
                artifact,
                from_cache: true,
                generation_time_ms,
                degraded: false,
            };
        }

        match self.produce(request, &key).await {
            Ok(artifact) => {
                self.store_best_effort(&key, &artifact).await;
                let generation_time_ms = start_time.elapsed().as_millis() as u64;
                tracing::info!(
                    key = %key,
                    latency_ms = generation_time_ms,
                    size_bytes = artifact.size_bytes(),
                    "Artifact generated"
                );
                GenerationResult {
                    artifact,
                    from_cache: false,
                    generation_time_ms,
                    degraded: false,
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Generation degraded to fallback content");
                let artifact = self.fallback.fallback(request);
                GenerationResult {
                    artifact,
                    from_cache: false,
                    generation_time_ms: start_time.elapsed().as_millis() as u64,
                    degraded: true,
                }
            }
        }
    }

    /// Lookup with the cache bound. Read failures and stale shapes count as misses.
    async fn cached(&self, key: &CacheKey, capability: Capability) -> Option<Artifact> {
        let lookup = tokio::time::timeout(self.settings.cache_timeout, self.store.lookup(key))
            .await
            .map_err(|_| {
                GenerationError::CacheReadFailure(format!(
                    "lookup timed out after {:?}",
                    self.settings.cache_timeout
                ))
            })
            .and_then(|result| {
                result.map_err(|e| GenerationError::CacheReadFailure(e.to_string()))
            });

        match lookup {
            Ok(Some(entry)) if entry.capability == capability => {
                self.record_hit(key).await;
                Some(entry.artifact)
            }
            Ok(Some(entry)) => {
                tracing::warn!(
                    key = %key,
                    stored = %entry.capability,
                    "Cached entry has a different capability; treating as miss"
                );
                None
            }
            Ok(None) => {
                tracing::debug!(key = %key, store = self.store.name(), "Cache miss");
                None
            }
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Treating cache read failure as miss");
                None
            }
        }
    }

    async fn record_hit(&self, key: &CacheKey) {
        match tokio::time::timeout(self.settings.cache_timeout, self.store.record_hit(key)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::warn!(key = %key, error = %e, "Failed to record cache hit"),
            Err(_) => tracing::warn!(key = %key, "Recording cache hit timed out"),
        }
    }

    async fn store_best_effort(&self, key: &CacheKey, artifact: &Artifact) {
        let result = tokio::time::timeout(self.settings.cache_timeout, self.store.put(key, artifact))
            .await
            .map_err(|_| {
                GenerationError::CacheWriteFailure(format!(
                    "put timed out after {:?}",
                    self.settings.cache_timeout
                ))
            })
            .and_then(|result| {
                result.map_err(|e| GenerationError::CacheWriteFailure(e.to_string()))
            });

        if let Err(e) = result {
            tracing::error!(key = %key, store = self.store.name(), error = %e, "Cache write failed");
        }
    }

    /// Live generation: resolve, invoke, sanitize. Any error means fallback.
    async fn produce(
        &self,
        request: &GenerationRequest,
        key: &CacheKey,
    ) -> Result<Artifact, GenerationError> {
        let capability = request.capability();
        let speech_input = match capability {
            Capability::Speech => Some(SpeechInput::from_request(request, &self.languages)?),
            _ => None,
        };
        let invocation = match &speech_input {
            Some(input) => Invocation::Speech(input.clone()),
            None => Invocation::Completion(Prompt::for_request(request)?),
        };

        let backend = self.registry.resolve(capability).await.ok_or_else(|| {
            GenerationError::BackendUnavailable(format!("no backend available for {}", capability))
        })?;

        let timeout = self.settings.backend_timeout;
        tracing::debug!(backend = backend.name(), timeout_ms = timeout.as_millis(), "Invoking backend");
        let raw = tokio::time::timeout(timeout, backend.invoke(&invocation, timeout))
            .await
            .map_err(|_| GenerationError::InvocationTimeout(timeout))??;

        match (raw, speech_input) {
            (
                RawOutput::Audio {
                    bytes,
                    format,
                    voice,
                    engine,
                },
                Some(input),
            ) => {
                if bytes.is_empty() {
                    return Err(GenerationError::MalformedOutput(format!(
                        "{} returned no audio",
                        engine
                    )));
                }
                let content = SpeechContent {
                    audio_url: audio_address(&self.settings.audio_url_prefix, key, format),
                    text: input.text,
                    language: input.language.locale().to_string(),
                    voice,
                    method: engine.to_string(),
                    format,
                    file_size: bytes.len() as u64,
                };
                Ok(Artifact::audio(content, bytes))
            }
            (RawOutput::Text(text), None) => match self.sanitizer.sanitize(&text, request) {
                Ok(content) => Ok(Artifact::document(content)),
                Err(e) => {
                    tracing::debug!(
                        backend = backend.name(),
                        raw_length = text.len(),
                        raw_preview = %text.chars().take(RAW_PREVIEW_CHARS).collect::<String>(),
                        "Rejected backend output"
                    );
                    Err(e)
                }
            },
            (_, _) => Err(GenerationError::MalformedOutput(format!(
                "{} returned output of the wrong kind for {}",
                backend.name(),
                capability
            ))),
        }
    }
}

#[async_trait]
pub trait OrchestratorApi: Send + Sync {
    /// Serve a request from cache, from a live backend, or from fallback content.
    ///
    /// Never fails: backend problems surface only as `degraded = true`, and degraded
    /// artifacts are not cached.
    async fn generate(&self, request: GenerationRequest) -> GenerationResult;

    async fn cache_stats(&self) -> Result<CacheStats, GenerationError>;

    /// Invalidate the cached artifact for `request`. Returns whether one existed.
    async fn invalidate(&self, request: &GenerationRequest) -> Result<bool, GenerationError>;

    async fn clear_cache(&self) -> Result<ClearReport, GenerationError>;

    fn backend_status(&self) -> Vec<BackendDescriptor>;

    async fn generate_intro(&self, request: IntroRequest) -> GenerationResponse {
        self.generate(request.into()).await.into_response()
    }

    async fn generate_phrases(&self, request: PhrasesRequest) -> GenerationResponse {
        self.generate(request.into()).await.into_response()
    }

    async fn generate_word_breakdown(&self, request: WordBreakdownRequest) -> GenerationResponse {
        self.generate(request.into()).await.into_response()
    }

    async fn generate_fun_facts(&self, request: FunFactsRequest) -> GenerationResponse {
        self.generate(request.into()).await.into_response()
    }

    async fn generate_quiz(&self, request: QuizRequest) -> GenerationResponse {
        self.generate(request.into()).await.into_response()
    }

    async fn generate_chat(&self, request: ChatRequest) -> GenerationResponse {
        self.generate(request.into()).await.into_response()
    }

    async fn generate_game(&self, request: GameRequest) -> GenerationResponse {
        self.generate(request.into()).await.into_response()
    }

    async fn generate_speech(&self, request: SpeechRequest) -> GenerationResponse {
        self.generate(request.into()).await.into_response()
    }
}

#[async_trait]
impl OrchestratorApi for Orchestrator {
    async fn generate(&self, request: GenerationRequest) -> GenerationResult {
        let span = tracing::info_span!(
            "generate",
            request_id = %Uuid::new_v4(),
            capability = %request.capability()
        );
        self.generate_in_span(&request).instrument(span).await
    }

    async fn cache_stats(&self) -> Result<CacheStats, GenerationError> {
        self.store
            .stats()
            .await
            .map_err(|e| GenerationError::CacheReadFailure(e.to_string()))
    }

    async fn invalidate(&self, request: &GenerationRequest) -> Result<bool, GenerationError> {
        let key = CacheKey::for_request(request);
        let existed = self
            .store
            .invalidate(&key)
            .await
            .map_err(|e| GenerationError::CacheWriteFailure(e.to_string()))?;
        tracing::info!(key = %key, existed = existed, "Cache entry invalidated");
        Ok(existed)
    }

    async fn clear_cache(&self) -> Result<ClearReport, GenerationError> {
        let report = self
            .store
            .clear()
            .await
            .map_err(|e| GenerationError::CacheWriteFailure(e.to_string()))?;
        tracing::info!(
            entries_deleted = report.entries_deleted,
            bytes_freed = report.bytes_freed,
            "Cache cleared"
        );
        Ok(report)
    }

    fn backend_status(&self) -> Vec<BackendDescriptor> {
        self.registry.status()
    }
}
