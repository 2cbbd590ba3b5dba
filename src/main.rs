use lingo_cache::domain::fallback::FallbackLibrary;
use lingo_cache::domain::generation::dto::{
    ChatRequest, FunFactsRequest, GameRequest, IntroRequest, PhrasesRequest, QuizRequest,
    SpeechRequest, WordBreakdownRequest,
};
use lingo_cache::domain::generation::service::OrchestratorSettings;
use lingo_cache::domain::generation::{GenerationRequest, Orchestrator, OrchestratorApi};
use lingo_cache::domain::sanitizer::{AgreementTable, GrammarCorrector, ResponseSanitizer};
use lingo_cache::infrastructure::backends::EngineFactory;
use lingo_cache::infrastructure::config::{CacheBackend, Config, LogFormat};
use lingo_cache::infrastructure::db::{check_connection, create_pool, run_migrations};
use lingo_cache::infrastructure::registry::BackendRegistry;
use lingo_cache::infrastructure::repositories::{
    CacheStore, FileCacheStore, MemoryCacheStore, PostgresCacheStore,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// One line of input. Generation lines carry the capability's own fields.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum Command {
    Intro(IntroRequest),
    ContextualPhrases(PhrasesRequest),
    WordBreakdown(WordBreakdownRequest),
    FunFacts(FunFactsRequest),
    Quiz(QuizRequest),
    Chat(ChatRequest),
    Game(GameRequest),
    Speech(SpeechRequest),
    CacheStats,
    ClearCache,
    BackendStatus,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = Arc::new(Config::from_env()?);

    // Initialize logging
    init_logging(&config);

    tracing::info!(
        cache_backend = ?config.cache_backend,
        speech_engines = ?config.speech_engines,
        "Starting lingo-cache"
    );

    let store = create_store(&config).await?;
    tracing::info!(store = store.name(), "Cache store ready");

    let registry = Arc::new(BackendRegistry::new(
        Arc::new(EngineFactory::new(config.clone())),
        &config.speech_engines,
    ));

    let agreement = match &config.grammar_rules_file {
        Some(path) => {
            tracing::info!(path = %path.display(), "Loading grammar rule table");
            AgreementTable::from_file(path)?
        }
        None => AgreementTable::default(),
    };

    let orchestrator = Orchestrator::new(
        store,
        registry,
        ResponseSanitizer::new(GrammarCorrector::new(agreement.clone())),
        FallbackLibrary::new(agreement),
        OrchestratorSettings::from(config.as_ref()),
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }

        let output = match serde_json::from_str::<Command>(&line) {
            Ok(command) => handle(&orchestrator, command).await,
            Err(e) => {
                tracing::warn!(error = %e, "Rejected input line");
                json!({ "error": format!("invalid request: {}", e) })
            }
        };

        stdout.write_all(output.to_string().as_bytes()).await?;
        stdout.write_all(b"\n").await?;
        stdout.flush().await?;
    }

    tracing::info!("Input closed, shutting down");
    Ok(())
}

async fn handle(orchestrator: &Orchestrator, command: Command) -> Value {
    let request: GenerationRequest = match command {
        Command::Intro(dto) => dto.into(),
        Command::ContextualPhrases(dto) => dto.into(),
        Command::WordBreakdown(dto) => dto.into(),
        Command::FunFacts(dto) => dto.into(),
        Command::Quiz(dto) => dto.into(),
        Command::Chat(dto) => dto.into(),
        Command::Game(dto) => dto.into(),
        Command::Speech(dto) => dto.into(),
        Command::CacheStats => {
            return match orchestrator.cache_stats().await {
                Ok(stats) => json!(stats),
                Err(e) => json!({ "error": e.to_string() }),
            }
        }
        Command::ClearCache => {
            return match orchestrator.clear_cache().await {
                Ok(report) => json!(report),
                Err(e) => json!({ "error": e.to_string() }),
            }
        }
        Command::BackendStatus => return json!(orchestrator.backend_status()),
    };

    let result = orchestrator.generate(request).await;
    if result.degraded {
        tracing::warn!(capability = %result.artifact.capability(), "Served fallback content");
    }
    serde_json::to_value(result.into_response())
        .unwrap_or_else(|e| json!({ "error": format!("failed to encode response: {}", e) }))
}

async fn create_store(config: &Config) -> anyhow::Result<Arc<dyn CacheStore>> {
    let store: Arc<dyn CacheStore> = match config.cache_backend {
        CacheBackend::Memory => Arc::new(MemoryCacheStore::new(config.cache_memory_max_entries)),
        CacheBackend::Filesystem => Arc::new(FileCacheStore::new(&config.cache_dir).await?),
        CacheBackend::Postgres => {
            let database_url = config
                .database_url
                .as_deref()
                .ok_or_else(|| anyhow::anyhow!("DATABASE_URL is required for the postgres cache"))?;

            // Create database connection pool
            let pool = create_pool(database_url).await?;
            tracing::info!("Database connection pool created");

            // Verify database connection
            check_connection(&pool).await?;
            tracing::info!("Database connection verified");

            run_migrations(&pool).await?;
            tracing::info!("Database migrations applied");

            Arc::new(PostgresCacheStore::new(Arc::new(pool)))
        }
    };
    Ok(store)
}

/// Logs go to stderr; stdout carries responses.
fn init_logging(config: &Config) {
    if config.log_format == LogFormat::Json {
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "lingo_cache=debug".into()),
            )
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "lingo_cache=debug".into()),
            )
            .with(tracing_subscriber::fmt::layer().pretty().with_writer(std::io::stderr))
            .init();
    }
}
