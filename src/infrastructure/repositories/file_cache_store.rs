use super::cache_store::{CacheEntry, CacheError, CacheStats, CacheStore, ClearReport};
use crate::domain::generation::{Artifact, CacheKey, Capability, Content};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use moka::future::Cache;
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;

/// On-disk metadata, one `<digest>.json` per entry.
#[derive(Debug, Serialize, Deserialize)]
struct EntryRecord {
    key: String,
    capability: Capability,
    content: serde_json::Value,
    /// File name of the audio payload next to the record, if any.
    audio_file: Option<String>,
    size_bytes: u64,
    hit_count: u64,
    valid: bool,
    produced_at: DateTime<Utc>,
}

/// Directory of `<digest>.json` records plus `<digest>.<ext>` audio files, so the
/// directory can be served as-is under the audio address prefix.
pub struct FileCacheStore {
    dir: PathBuf,
    /// One lock per digest; every record rewrite holds it.
    key_locks: Cache<String, Arc<Mutex<()>>>,
}

impl FileCacheStore {
    pub async fn new(dir: impl Into<PathBuf>) -> Result<Self, CacheError> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir).await?;
        Ok(Self {
            dir,
            key_locks: Cache::builder().build(),
        })
    }

    async fn key_lock(&self, key: &CacheKey) -> Arc<Mutex<()>> {
        self.key_locks
            .get_with_by_ref(key.as_str(), async { Arc::new(Mutex::new(())) })
            .await
    }

    fn record_path(&self, key: &CacheKey) -> PathBuf {
        self.dir.join(format!("{}.json", key.as_str()))
    }

    /// Write to a sibling temp file and rename over the target.
    async fn write_atomic(&self, target: &Path, bytes: &[u8]) -> Result<(), CacheError> {
        let tmp = target.with_extension(format!("{}.tmp", uuid::Uuid::new_v4().simple()));
        tokio::fs::write(&tmp, bytes).await?;
        if let Err(e) = tokio::fs::rename(&tmp, target).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(e.into());
        }
        Ok(())
    }

    async fn read_record(&self, path: &Path) -> Result<Option<EntryRecord>, CacheError> {
        match tokio::fs::read(path).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn write_record(&self, key: &CacheKey, record: &EntryRecord) -> Result<(), CacheError> {
        let bytes = serde_json::to_vec_pretty(record)?;
        self.write_atomic(&self.record_path(key), &bytes).await
    }

    async fn into_entry(&self, record: EntryRecord) -> Result<CacheEntry, CacheError> {
        let audio = match &record.audio_file {
            Some(file) => Some(tokio::fs::read(self.dir.join(file)).await?),
            None => None,
        };
        let content =
            Content::decode(record.capability, record.content).map_err(|e| CacheError::Corrupt {
                key: record.key.clone(),
                reason: e.to_string(),
            })?;

        Ok(CacheEntry {
            key: CacheKey::from_digest(record.key),
            capability: record.capability,
            artifact: Artifact { content, audio },
            produced_at: record.produced_at,
            hit_count: record.hit_count,
            size_bytes: record.size_bytes,
            valid: record.valid,
        })
    }

    async fn records(&self) -> Result<Vec<EntryRecord>, CacheError> {
        let mut records = Vec::new();
        let mut dir = tokio::fs::read_dir(&self.dir).await?;
        while let Some(item) = dir.next_entry().await? {
            let path = item.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            match self.read_record(&path).await {
                Ok(Some(record)) => records.push(record),
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Skipping unreadable cache record")
                }
            }
        }
        Ok(records)
    }
}

#[async_trait]
impl CacheStore for FileCacheStore {
    fn name(&self) -> &'static str {
        "filesystem"
    }

    async fn lookup(&self, key: &CacheKey) -> Result<Option<CacheEntry>, CacheError> {
        match self.read_record(&self.record_path(key)).await? {
            Some(record) if record.valid => Ok(Some(self.into_entry(record).await?)),
            _ => Ok(None),
        }
    }

    async fn put(&self, key: &CacheKey, artifact: &Artifact) -> Result<(), CacheError> {
        let lock = self.key_lock(key).await;
        let _guard = lock.lock().await;

        let audio_file = match (&artifact.content, &artifact.audio) {
            (Content::Speech(speech), Some(bytes)) => {
                let file = format!("{}.{}", key.as_str(), speech.format.extension());
                self.write_atomic(&self.dir.join(&file), bytes).await?;
                Some(file)
            }
            _ => None,
        };

        // The record is written last; readers never see it before its audio.
        let record = EntryRecord {
            key: key.as_str().to_string(),
            capability: artifact.capability(),
            content: artifact.content.to_value()?,
            audio_file,
            size_bytes: artifact.size_bytes(),
            hit_count: 0,
            valid: true,
            produced_at: Utc::now(),
        };
        self.write_record(key, &record).await
    }

    async fn record_hit(&self, key: &CacheKey) -> Result<(), CacheError> {
        let lock = self.key_lock(key).await;
        let _guard = lock.lock().await;

        match self.read_record(&self.record_path(key)).await? {
            Some(mut record) if record.valid => {
                record.hit_count += 1;
                self.write_record(key, &record).await
            }
            _ => Ok(()),
        }
    }

    async fn invalidate(&self, key: &CacheKey) -> Result<bool, CacheError> {
        let lock = self.key_lock(key).await;
        let _guard = lock.lock().await;

        match self.read_record(&self.record_path(key)).await? {
            Some(mut record) if record.valid => {
                record.valid = false;
                self.write_record(key, &record).await?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn stats(&self) -> Result<CacheStats, CacheError> {
        Ok(self
            .records()
            .await?
            .iter()
            .filter(|record| record.valid)
            .fold(CacheStats::default(), |stats, record| CacheStats {
                count: stats.count + 1,
                total_bytes: stats.total_bytes + record.size_bytes,
            }))
    }

    async fn clear(&self) -> Result<ClearReport, CacheError> {
        let mut report = ClearReport::default();
        let mut dir = tokio::fs::read_dir(&self.dir).await?;

        while let Some(item) = dir.next_entry().await? {
            let path = item.path();
            // Files renamed or removed since the listing are already gone.
            let metadata = match item.metadata().await {
                Ok(metadata) => metadata,
                Err(e) if e.kind() == ErrorKind::NotFound => continue,
                Err(e) => return Err(e.into()),
            };
            if !metadata.is_file() {
                continue;
            }
            match tokio::fs::remove_file(&path).await {
                Ok(()) => {}
                Err(e) if e.kind() == ErrorKind::NotFound => continue,
                Err(e) => return Err(e.into()),
            }

            if path.extension().and_then(|e| e.to_str()) == Some("json") {
                report.entries_deleted += 1;
            }
            report.bytes_freed += metadata.len();
        }

        tracing::info!(
            dir = %self.dir.display(),
            entries_deleted = report.entries_deleted,
            bytes_freed = report.bytes_freed,
            "File cache cleared"
        );
        Ok(report)
    }
}
