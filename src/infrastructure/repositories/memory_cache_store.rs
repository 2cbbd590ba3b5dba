use super::cache_store::{CacheEntry, CacheError, CacheStats, CacheStore, ClearReport};
use crate::domain::generation::{Artifact, CacheKey};
use async_trait::async_trait;
use moka::future::Cache;
use moka::ops::compute::{CompResult, Op};

/// In-process store; contents are lost on restart.
pub struct MemoryCacheStore {
    cache: Cache<CacheKey, CacheEntry>,
}

impl MemoryCacheStore {
    pub fn new(max_entries: Option<u64>) -> Self {
        let mut builder = Cache::builder();
        if let Some(max_entries) = max_entries {
            builder = builder.max_capacity(max_entries);
        }
        Self {
            cache: builder.build(),
        }
    }

    fn fold_valid(&self) -> CacheStats {
        self.cache
            .iter()
            .filter(|(_, entry)| entry.valid)
            .fold(CacheStats::default(), |stats, (_, entry)| CacheStats {
                count: stats.count + 1,
                total_bytes: stats.total_bytes + entry.size_bytes,
            })
    }
}

impl Default for MemoryCacheStore {
    fn default() -> Self {
        Self::new(None)
    }
}

#[async_trait]
impl CacheStore for MemoryCacheStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn lookup(&self, key: &CacheKey) -> Result<Option<CacheEntry>, CacheError> {
        Ok(self.cache.get(key).await.filter(|entry| entry.valid))
    }

    /// Writes go through `and_compute_with` so they are serialized per key.
    async fn put(&self, key: &CacheKey, artifact: &Artifact) -> Result<(), CacheError> {
        let entry = CacheEntry::new(key.clone(), artifact.clone());
        self.cache
            .entry_by_ref(key)
            .and_compute_with(|_| async move { Op::Put(entry) })
            .await;
        Ok(())
    }

    async fn record_hit(&self, key: &CacheKey) -> Result<(), CacheError> {
        self.cache
            .entry_by_ref(key)
            .and_compute_with(|current| async move {
                match current.map(|e| e.into_value()) {
                    Some(mut entry) if entry.valid => {
                        entry.hit_count += 1;
                        Op::Put(entry)
                    }
                    _ => Op::Nop,
                }
            })
            .await;
        Ok(())
    }

    async fn invalidate(&self, key: &CacheKey) -> Result<bool, CacheError> {
        let result = self
            .cache
            .entry_by_ref(key)
            .and_compute_with(|current| async move {
                match current.map(|e| e.into_value()) {
                    Some(mut entry) if entry.valid => {
                        entry.valid = false;
                        Op::Put(entry)
                    }
                    _ => Op::Nop,
                }
            })
            .await;
        Ok(matches!(result, CompResult::ReplacedWith(_)))
    }

    async fn stats(&self) -> Result<CacheStats, CacheError> {
        Ok(self.fold_valid())
    }

    async fn clear(&self) -> Result<ClearReport, CacheError> {
        let report = self
            .cache
            .iter()
            .fold(ClearReport::default(), |report, (_, entry)| ClearReport {
                entries_deleted: report.entries_deleted + 1,
                bytes_freed: report.bytes_freed + entry.size_bytes,
            });
        self.cache.invalidate_all();
        self.cache.run_pending_tasks().await;
        Ok(report)
    }
}
