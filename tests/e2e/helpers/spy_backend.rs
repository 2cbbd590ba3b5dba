use async_trait::async_trait;
use lingo_cache::domain::speech::AudioFormat;
use lingo_cache::infrastructure::backends::{
    BackendError, BackendFactory, Engine, GenerationBackend, Invocation, RawOutput,
};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// What a spy answers with.
#[derive(Debug, Clone)]
pub enum Reply {
    Text(String),
    Audio(Vec<u8>, AudioFormat),
    Fail(String),
    /// Sleeps past any reasonable timeout.
    Hang,
}

/// Backend that records every invocation and answers with a fixed reply.
pub struct SpyBackend {
    name: &'static str,
    reply: Reply,
    calls: AtomicUsize,
    invocations: Mutex<Vec<Invocation>>,
}

impl SpyBackend {
    pub fn new(name: &'static str, reply: Reply) -> Arc<Self> {
        Arc::new(Self {
            name,
            reply,
            calls: AtomicUsize::new(0),
            invocations: Mutex::new(Vec::new()),
        })
    }

    pub fn text(reply: &str) -> Arc<Self> {
        Self::new("spy-text", Reply::Text(reply.to_string()))
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_invocation(&self) -> Option<Invocation> {
        self.invocations.lock().last().cloned()
    }
}

#[async_trait]
impl GenerationBackend for SpyBackend {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn invoke(
        &self,
        invocation: &Invocation,
        _timeout: Duration,
    ) -> Result<RawOutput, BackendError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.invocations.lock().push(invocation.clone());

        match &self.reply {
            Reply::Text(text) => Ok(RawOutput::Text(text.clone())),
            Reply::Audio(bytes, format) => Ok(RawOutput::Audio {
                bytes: bytes.clone(),
                format: *format,
                voice: match invocation {
                    Invocation::Speech(input) => {
                        input.voice.clone().unwrap_or_else(|| "spy".to_string())
                    }
                    Invocation::Completion(_) => "spy".to_string(),
                },
                engine: self.name,
            }),
            Reply::Fail(message) => Err(BackendError::Request(message.clone())),
            Reply::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Err(BackendError::EmptyOutput)
            }
        }
    }
}

/// Factory handing out pre-built spies per engine; engines without one fail to initialize.
#[derive(Default)]
pub struct SpyFactory {
    backends: HashMap<Engine, Arc<dyn GenerationBackend>>,
    creations: Mutex<HashMap<Engine, usize>>,
}

impl SpyFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, engine: Engine, backend: Arc<dyn GenerationBackend>) -> Self {
        self.backends.insert(engine, backend);
        self
    }

    pub fn creations(&self, engine: Engine) -> usize {
        self.creations.lock().get(&engine).copied().unwrap_or(0)
    }
}

#[async_trait]
impl BackendFactory for SpyFactory {
    async fn create(&self, engine: Engine) -> Result<Arc<dyn GenerationBackend>, BackendError> {
        *self.creations.lock().entry(engine).or_default() += 1;
        self.backends
            .get(&engine)
            .cloned()
            .ok_or_else(|| BackendError::Unavailable(format!("{} not configured", engine)))
    }
}
