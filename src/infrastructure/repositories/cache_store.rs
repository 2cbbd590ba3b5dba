use crate::domain::generation::{Artifact, CacheKey, Capability};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("corrupt cache entry {key}: {reason}")]
    Corrupt { key: String, reason: String },
}

/// One cached artifact with its bookkeeping.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    pub key: CacheKey,
    pub capability: Capability,
    pub artifact: Artifact,
    pub produced_at: DateTime<Utc>,
    pub hit_count: u64,
    pub size_bytes: u64,
    pub valid: bool,
}

impl CacheEntry {
    pub fn new(key: CacheKey, artifact: Artifact) -> Self {
        Self {
            key,
            capability: artifact.capability(),
            size_bytes: artifact.size_bytes(),
            artifact,
            produced_at: Utc::now(),
            hit_count: 0,
            valid: true,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub count: u64,
    pub total_bytes: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ClearReport {
    pub entries_deleted: u64,
    pub bytes_freed: u64,
}

/// Content-addressed persistence for generated artifacts.
///
/// Implementations must tolerate concurrent calls. `put` on an existing key overwrites it
/// (last write wins) and makes it valid again with a fresh hit count.
#[async_trait]
pub trait CacheStore: Send + Sync {
    fn name(&self) -> &'static str;

    /// Valid entry for `key`; invalidated entries read as absent.
    async fn lookup(&self, key: &CacheKey) -> Result<Option<CacheEntry>, CacheError>;

    async fn put(&self, key: &CacheKey, artifact: &Artifact) -> Result<(), CacheError>;

    async fn record_hit(&self, key: &CacheKey) -> Result<(), CacheError>;

    /// Marks the entry invalid. Returns whether a valid entry existed.
    async fn invalidate(&self, key: &CacheKey) -> Result<bool, CacheError>;

    /// Count and size of valid entries.
    async fn stats(&self) -> Result<CacheStats, CacheError>;

    /// Deletes every entry, valid or not.
    async fn clear(&self) -> Result<ClearReport, CacheError>;
}
