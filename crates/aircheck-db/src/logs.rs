//! Broadcast log repository implementation.

use async_trait::async_trait;
use sqlx::{Pool, Postgres};

use aircheck_core::{BroadcastLog, Error, LogEvent, LogRepository, Result};

/// PostgreSQL implementation of LogRepository.
pub struct PgLogRepository {
    pool: Pool<Postgres>,
}

impl PgLogRepository {
    /// Create a new PgLogRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LogRepository for PgLogRepository {
    async fn insert(&self, event: LogEvent, signature: &str) -> Result<BroadcastLog> {
        sqlx::query_as::<_, BroadcastLog>(
            r#"
            INSERT INTO broadcast_log (raw_artist, raw_title, signature, station_id, played_at_utc)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(&event.raw_artist)
        .bind(&event.raw_title)
        .bind(signature)
        .bind(&event.station_id)
        .bind(event.played_at_utc)
        .fetch_one(&self.pool)
        .await
        .map_err(Error::StorageUnavailable)
    }

    async fn stamp_matches(&self, signature: &str, recording_id: i64) -> Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE broadcast_log
            SET recording_id = $2
            WHERE signature = $1 AND recording_id IS NULL
            "#,
        )
        .bind(signature)
        .bind(recording_id)
        .execute(&self.pool)
        .await
        .map_err(Error::StorageUnavailable)?;
        Ok(result.rows_affected())
    }

    async fn for_signature(&self, signature: &str) -> Result<Vec<BroadcastLog>> {
        sqlx::query_as::<_, BroadcastLog>(
            "SELECT * FROM broadcast_log WHERE signature = $1 ORDER BY played_at_utc, id",
        )
        .bind(signature)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::StorageUnavailable)
    }

    async fn unresolved_count(&self) -> Result<i64> {
        let row: (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM broadcast_log WHERE recording_id IS NULL")
                .fetch_one(&self.pool)
                .await
                .map_err(Error::StorageUnavailable)?;
        Ok(row.0)
    }
}
