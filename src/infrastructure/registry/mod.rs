use crate::domain::generation::Capability;
use crate::infrastructure::backends::{BackendFactory, Engine, GenerationBackend};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::OnceCell;

/// `None` once initialization has failed; it is not attempted again in this process.
type Slot = OnceCell<Option<Arc<dyn GenerationBackend>>>;

/// Snapshot of one engine slot, for status reporting.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BackendDescriptor {
    pub engine: &'static str,
    pub capabilities: Vec<Capability>,
    pub initialized: bool,
    pub available: bool,
}

/// Owns every backend handle. Each engine is built lazily on first use, at most once,
/// through the injected factory.
pub struct BackendRegistry {
    factory: Arc<dyn BackendFactory>,
    text_slot: Slot,
    /// Speech engines in preference order.
    speech_slots: Vec<(Engine, Slot)>,
}

impl BackendRegistry {
    pub fn new(factory: Arc<dyn BackendFactory>, speech_engines: &[Engine]) -> Self {
        let mut speech_slots: Vec<(Engine, Slot)> = Vec::new();
        for engine in speech_engines.iter().copied().filter(Engine::is_speech) {
            if !speech_slots.iter().any(|(e, _)| *e == engine) {
                speech_slots.push((engine, OnceCell::new()));
            }
        }

        Self {
            factory,
            text_slot: OnceCell::new(),
            speech_slots,
        }
    }

    /// Backend serving `capability`, or `None` when no engine for it could be initialized.
    pub async fn resolve(&self, capability: Capability) -> Option<Arc<dyn GenerationBackend>> {
        if capability.is_text() {
            return self.initialize(Engine::OpenAiChat, &self.text_slot).await;
        }

        for (engine, slot) in &self.speech_slots {
            if let Some(backend) = self.initialize(*engine, slot).await {
                return Some(backend);
            }
        }
        tracing::warn!(
            engines = ?self.speech_slots.iter().map(|(e, _)| e.as_str()).collect::<Vec<_>>(),
            "No speech engine available"
        );
        None
    }

    async fn initialize(&self, engine: Engine, slot: &Slot) -> Option<Arc<dyn GenerationBackend>> {
        slot.get_or_init(|| async {
            let start_time = std::time::Instant::now();
            match self.factory.create(engine).await {
                Ok(backend) => {
                    tracing::info!(
                        engine = engine.as_str(),
                        latency_ms = start_time.elapsed().as_millis(),
                        "Backend initialized"
                    );
                    Some(backend)
                }
                Err(e) => {
                    tracing::warn!(
                        engine = engine.as_str(),
                        error = %e,
                        "Backend initialization failed; unavailable until restart"
                    );
                    None
                }
            }
        })
        .await
        .clone()
    }

    pub fn status(&self) -> Vec<BackendDescriptor> {
        let text_capabilities: Vec<Capability> = Capability::ALL
            .into_iter()
            .filter(Capability::is_text)
            .collect();

        std::iter::once((Engine::OpenAiChat, &self.text_slot, text_capabilities))
            .chain(
                self.speech_slots
                    .iter()
                    .map(|(engine, slot)| (*engine, slot, vec![Capability::Speech])),
            )
            .map(|(engine, slot, capabilities)| BackendDescriptor {
                engine: engine.as_str(),
                capabilities,
                initialized: slot.initialized(),
                available: matches!(slot.get(), Some(Some(_))),
            })
            .collect()
    }
}
