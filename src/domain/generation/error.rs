use std::time::Duration;

/// Why a generation could not be served by a live backend.
///
/// Only the first three trigger degradation; cache failures are logged and swallowed.
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("backend unavailable: {0}")]
    BackendUnavailable(String),
    #[error("backend invocation timed out after {0:?}")]
    InvocationTimeout(Duration),
    #[error("malformed backend output: {0}")]
    MalformedOutput(String),
    #[error("backend invocation failed: {0}")]
    Invocation(String),
    #[error("unsupported request: {0}")]
    UnsupportedRequest(String),
    #[error("cache write failed: {0}")]
    CacheWriteFailure(String),
    #[error("cache read failed: {0}")]
    CacheReadFailure(String),
}

impl From<serde_json::Error> for GenerationError {
    fn from(err: serde_json::Error) -> Self {
        GenerationError::MalformedOutput(err.to_string())
    }
}
