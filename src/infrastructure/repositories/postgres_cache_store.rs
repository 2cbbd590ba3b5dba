use super::cache_store::{CacheEntry, CacheError, CacheStats, CacheStore, ClearReport};
use crate::domain::generation::{Artifact, CacheKey, Capability, Content};
use crate::infrastructure::db::DbPool;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use std::sync::Arc;

#[derive(Debug, FromRow)]
struct CacheRow {
    key: String,
    capability: String,
    content: serde_json::Value,
    audio: Option<Vec<u8>>,
    size_bytes: i64,
    hit_count: i64,
    is_valid: bool,
    produced_at: DateTime<Utc>,
}

impl TryFrom<CacheRow> for CacheEntry {
    type Error = CacheError;

    fn try_from(row: CacheRow) -> Result<Self, Self::Error> {
        let capability =
            Capability::from_str_opt(&row.capability).ok_or_else(|| CacheError::Corrupt {
                key: row.key.clone(),
                reason: format!("unknown capability '{}'", row.capability),
            })?;
        let content = Content::decode(capability, row.content).map_err(|e| CacheError::Corrupt {
            key: row.key.clone(),
            reason: e.to_string(),
        })?;

        Ok(CacheEntry {
            key: CacheKey::from_digest(row.key),
            capability,
            artifact: Artifact {
                content,
                audio: row.audio,
            },
            produced_at: row.produced_at,
            hit_count: row.hit_count.max(0) as u64,
            size_bytes: row.size_bytes.max(0) as u64,
            valid: row.is_valid,
        })
    }
}

#[derive(Debug, FromRow)]
struct Totals {
    count: i64,
    total_bytes: i64,
}

/// Rows in `generation_cache`, keyed by digest.
pub struct PostgresCacheStore {
    pool: Arc<DbPool>,
}

impl PostgresCacheStore {
    pub fn new(pool: Arc<DbPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CacheStore for PostgresCacheStore {
    fn name(&self) -> &'static str {
        "postgres"
    }

    async fn lookup(&self, key: &CacheKey) -> Result<Option<CacheEntry>, CacheError> {
        let pool = self.pool.as_ref();

        let row = sqlx::query_as::<_, CacheRow>(
            r#"
            SELECT key, capability, content, audio, size_bytes, hit_count, is_valid, produced_at
            FROM generation_cache
            WHERE key = $1 AND is_valid
            "#,
        )
        .bind(key.as_str())
        .fetch_optional(pool)
        .await?;

        row.map(CacheEntry::try_from).transpose()
    }

    async fn put(&self, key: &CacheKey, artifact: &Artifact) -> Result<(), CacheError> {
        let pool = self.pool.as_ref();
        let content = artifact.content.to_value()?;

        sqlx::query(
            r#"
            INSERT INTO generation_cache (key, capability, content, audio, size_bytes, hit_count, is_valid, produced_at)
            VALUES ($1, $2, $3, $4, $5, 0, TRUE, $6)
            ON CONFLICT (key)
            DO UPDATE SET
                capability = EXCLUDED.capability,
                content = EXCLUDED.content,
                audio = EXCLUDED.audio,
                size_bytes = EXCLUDED.size_bytes,
                hit_count = 0,
                is_valid = TRUE,
                produced_at = EXCLUDED.produced_at
            "#,
        )
        .bind(key.as_str())
        .bind(artifact.capability().as_str())
        .bind(content)
        .bind(artifact.audio.as_deref())
        .bind(artifact.size_bytes() as i64)
        .bind(Utc::now())
        .execute(pool)
        .await?;

        Ok(())
    }

    async fn record_hit(&self, key: &CacheKey) -> Result<(), CacheError> {
        let pool = self.pool.as_ref();

        sqlx::query("UPDATE generation_cache SET hit_count = hit_count + 1 WHERE key = $1")
            .bind(key.as_str())
            .execute(pool)
            .await?;

        Ok(())
    }

    async fn invalidate(&self, key: &CacheKey) -> Result<bool, CacheError> {
        let pool = self.pool.as_ref();

        let result =
            sqlx::query("UPDATE generation_cache SET is_valid = FALSE WHERE key = $1 AND is_valid")
                .bind(key.as_str())
                .execute(pool)
                .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn stats(&self) -> Result<CacheStats, CacheError> {
        let pool = self.pool.as_ref();

        let totals = sqlx::query_as::<_, Totals>(
            r#"
            SELECT COUNT(*) AS count, COALESCE(SUM(size_bytes), 0)::BIGINT AS total_bytes
            FROM generation_cache
            WHERE is_valid
            "#,
        )
        .fetch_one(pool)
        .await?;

        Ok(CacheStats {
            count: totals.count as u64,
            total_bytes: totals.total_bytes as u64,
        })
    }

    async fn clear(&self) -> Result<ClearReport, CacheError> {
        let pool = self.pool.as_ref();

        let totals = sqlx::query_as::<_, Totals>(
            r#"
            WITH deleted AS (
                DELETE FROM generation_cache RETURNING size_bytes
            )
            SELECT COUNT(*) AS count, COALESCE(SUM(size_bytes), 0)::BIGINT AS total_bytes
            FROM deleted
            "#,
        )
        .fetch_one(pool)
        .await?;

        tracing::info!(
            entries_deleted = totals.count,
            bytes_freed = totals.total_bytes,
            "Postgres cache cleared"
        );

        Ok(ClearReport {
            entries_deleted: totals.count as u64,
            bytes_freed: totals.total_bytes as u64,
        })
    }
}
