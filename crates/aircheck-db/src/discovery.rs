//! Discovery queue repository implementation.

use async_trait::async_trait;
use sqlx::{Pool, Postgres};

use aircheck_core::{DiscoveryEntry, DiscoveryFilter, DiscoveryRepository, Error, Result};

/// PostgreSQL implementation of DiscoveryRepository.
pub struct PgDiscoveryRepository {
    pool: Pool<Postgres>,
}

impl PgDiscoveryRepository {
    /// Create a new PgDiscoveryRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DiscoveryRepository for PgDiscoveryRepository {
    async fn record_unmatched(
        &self,
        signature: &str,
        raw_artist: &str,
        raw_title: &str,
        suggested_recording_id: Option<i64>,
    ) -> Result<DiscoveryEntry> {
        // Insert-or-increment in one statement; a fresh suggestion
        // overwrites the previous one, absence preserves it.
        sqlx::query_as::<_, DiscoveryEntry>(
            r#"
            INSERT INTO discovery_queue (signature, raw_artist, raw_title, suggested_recording_id)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (signature) DO UPDATE SET
                occurrence_count = discovery_queue.occurrence_count + 1,
                last_seen_utc = now(),
                suggested_recording_id =
                    COALESCE(EXCLUDED.suggested_recording_id, discovery_queue.suggested_recording_id)
            RETURNING *
            "#,
        )
        .bind(signature)
        .bind(raw_artist)
        .bind(raw_title)
        .bind(suggested_recording_id)
        .fetch_one(&self.pool)
        .await
        .map_err(Error::StorageUnavailable)
    }

    async fn get(&self, signature: &str) -> Result<Option<DiscoveryEntry>> {
        sqlx::query_as::<_, DiscoveryEntry>(
            "SELECT * FROM discovery_queue WHERE signature = $1",
        )
        .bind(signature)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::StorageUnavailable)
    }

    async fn resolve(&self, signature: &str, recording_id: i64) -> Result<DiscoveryEntry> {
        sqlx::query_as::<_, DiscoveryEntry>(
            r#"
            UPDATE discovery_queue
            SET resolved = true, suggested_recording_id = $2, last_seen_utc = now()
            WHERE signature = $1
            RETURNING *
            "#,
        )
        .bind(signature)
        .bind(recording_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::StorageUnavailable)?
        .ok_or_else(|| Error::NotFound(format!("discovery entry: {signature}")))
    }

    async fn list(
        &self,
        filter: DiscoveryFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<DiscoveryEntry>> {
        sqlx::query_as::<_, DiscoveryEntry>(
            r#"
            SELECT * FROM discovery_queue
            WHERE ($1::bool OR NOT resolved)
            ORDER BY last_seen_utc DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(filter == DiscoveryFilter::All)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::StorageUnavailable)
    }

    async fn sample_unresolved(&self, n: i64) -> Result<Vec<DiscoveryEntry>> {
        sqlx::query_as::<_, DiscoveryEntry>(
            r#"
            SELECT * FROM discovery_queue
            WHERE NOT resolved
            ORDER BY random()
            LIMIT $1
            "#,
        )
        .bind(n)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::StorageUnavailable)
    }
}
