use crate::error::{AppError, AppResult};
use crate::infrastructure::backends::Engine;
use serde::Deserialize;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub environment: Environment,
    pub log_format: LogFormat,
    // Cache
    pub cache_backend: CacheBackend,
    pub database_url: Option<String>,
    pub cache_dir: PathBuf,
    pub audio_url_prefix: String,
    pub cache_memory_max_entries: Option<u64>,
    pub cache_timeout: Duration,
    // Backends
    pub backend_timeout: Duration,
    pub openai_api_key: Option<String>,
    pub openai_chat_model: String,
    pub openai_tts_model: String,
    pub openai_tts_voice: Option<String>,
    pub aws_region: String,
    pub speech_engines: Vec<Engine>,
    pub piper_executable: Option<PathBuf>,
    pub piper_model: Option<PathBuf>,
    pub speak_server_url: Option<String>,
    // Post-generation corrections
    pub grammar_rules_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    Production,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
    Memory,
    Postgres,
    Filesystem,
}

impl Config {
    pub fn from_env() -> AppResult<Self> {
        dotenvy::dotenv().ok();

        let cache_backend = match env::var("CACHE_BACKEND")
            .unwrap_or_else(|_| "memory".to_string())
            .to_lowercase()
            .as_str()
        {
            "postgres" => CacheBackend::Postgres,
            "filesystem" | "fs" => CacheBackend::Filesystem,
            _ => CacheBackend::Memory,
        };

        let database_url = optional("DATABASE_URL");
        if cache_backend == CacheBackend::Postgres && database_url.is_none() {
            return Err(AppError::Config(
                "DATABASE_URL is required when CACHE_BACKEND=postgres".to_string(),
            ));
        }

        let config = Config {
            environment: match env::var("ENVIRONMENT")
                .unwrap_or_else(|_| "development".to_string())
                .as_str()
            {
                "production" => Environment::Production,
                _ => Environment::Development,
            },
            log_format: match env::var("LOG_FORMAT")
                .unwrap_or_else(|_| "pretty".to_string())
                .as_str()
            {
                "json" => LogFormat::Json,
                _ => LogFormat::Pretty,
            },
            cache_backend,
            database_url,
            cache_dir: env::var("CACHE_DIR")
                .unwrap_or_else(|_| "./audio_cache".to_string())
                .into(),
            audio_url_prefix: env::var("AUDIO_URL_PREFIX")
                .unwrap_or_else(|_| "/audio_cache".to_string()),
            cache_memory_max_entries: optional("CACHE_MEMORY_MAX_ENTRIES")
                .map(|v| parse_number("CACHE_MEMORY_MAX_ENTRIES", &v))
                .transpose()?,
            cache_timeout: Duration::from_millis(parse_number(
                "CACHE_TIMEOUT_MS",
                &env::var("CACHE_TIMEOUT_MS").unwrap_or_else(|_| "3000".to_string()),
            )?),
            backend_timeout: Duration::from_millis(parse_number(
                "BACKEND_TIMEOUT_MS",
                &env::var("BACKEND_TIMEOUT_MS").unwrap_or_else(|_| "30000".to_string()),
            )?),
            openai_api_key: optional("OPENAI_API_KEY"),
            openai_chat_model: env::var("OPENAI_CHAT_MODEL")
                .unwrap_or_else(|_| "gpt-4o-mini".to_string()),
            openai_tts_model: env::var("OPENAI_TTS_MODEL")
                .unwrap_or_else(|_| "tts-1".to_string()),
            openai_tts_voice: optional("OPENAI_TTS_VOICE"),
            aws_region: env::var("AWS_REGION").unwrap_or_else(|_| "eu-west-1".to_string()),
            speech_engines: parse_engines(
                &env::var("SPEECH_ENGINES").unwrap_or_else(|_| "polly,openai".to_string()),
            )?,
            piper_executable: optional("PIPER_EXECUTABLE").map(PathBuf::from),
            piper_model: optional("PIPER_MODEL").map(PathBuf::from),
            speak_server_url: optional("SPEAK_SERVER_URL"),
            grammar_rules_file: optional("GRAMMAR_RULES_FILE").map(PathBuf::from),
        };

        Ok(config)
    }

    pub fn is_development(&self) -> bool {
        self.environment == Environment::Development
    }
}

impl Default for Config {
    /// In-memory cache, no credentials, default engine order. Used by tests and tools.
    fn default() -> Self {
        Self {
            environment: Environment::Development,
            log_format: LogFormat::Pretty,
            cache_backend: CacheBackend::Memory,
            database_url: None,
            cache_dir: PathBuf::from("./audio_cache"),
            audio_url_prefix: "/audio_cache".to_string(),
            cache_memory_max_entries: None,
            cache_timeout: Duration::from_millis(3000),
            backend_timeout: Duration::from_millis(30000),
            openai_api_key: None,
            openai_chat_model: "gpt-4o-mini".to_string(),
            openai_tts_model: "tts-1".to_string(),
            openai_tts_voice: None,
            aws_region: "eu-west-1".to_string(),
            speech_engines: vec![Engine::Polly, Engine::OpenAiSpeech],
            piper_executable: None,
            piper_model: None,
            speak_server_url: None,
            grammar_rules_file: None,
        }
    }
}

fn optional(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn parse_number(name: &str, value: &str) -> AppResult<u64> {
    value
        .trim()
        .parse()
        .map_err(|e| AppError::Config(format!("{} must be a number: {}", name, e)))
}

fn parse_engines(value: &str) -> AppResult<Vec<Engine>> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<Engine>()
                .map_err(|e| AppError::Config(format!("SPEECH_ENGINES: {}", e)))
        })
        .collect()
}
