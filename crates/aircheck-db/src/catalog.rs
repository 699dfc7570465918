//! Catalog repository implementation.
//!
//! Inserts are plain INSERTs with no ON CONFLICT clause: the uniqueness
//! indexes raise, the violation maps to `Error::Conflict`, and the caller
//! (the grouper) retries as a lookup. The one exception is
//! `attach_file`, whose contract is idempotent-on-path, so it upserts.

use async_trait::async_trait;
use sqlx::{postgres::PgRow, Pool, Postgres, Row};

use aircheck_core::{
    normalize, Artist, CatalogRepository, CreateArtistRequest, CreateRecordingRequest,
    CreateWorkRequest, Error, LibraryFile, Recording, RecordingWithContext, Result, VersionType,
    Work,
};

/// Map an insert error: uniqueness violation becomes `Conflict` (the
/// retry-as-lookup signal), anything else means storage trouble.
pub(crate) fn map_insert_err(e: sqlx::Error, what: impl Into<String>) -> Error {
    if let sqlx::Error::Database(db) = &e {
        if db.code().as_deref() == Some("23505") {
            return Error::Conflict(what.into());
        }
    }
    Error::StorageUnavailable(e)
}

/// PostgreSQL implementation of CatalogRepository.
pub struct PgCatalogRepository {
    pool: Pool<Postgres>,
}

impl PgCatalogRepository {
    /// Create a new PgCatalogRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

fn map_recording_row(row: PgRow) -> Recording {
    let version: String = row.get("version_type");
    Recording {
        id: row.get("id"),
        work_id: row.get("work_id"),
        title: row.get("title"),
        normalized_title: row.get("normalized_title"),
        version_type: version.parse().unwrap_or(VersionType::Unknown),
        duration_secs: row.get("duration_secs"),
        external_id: row.get("external_id"),
        created_at_utc: row.get("created_at_utc"),
    }
}

fn map_context_row(row: PgRow) -> RecordingWithContext {
    let version: String = row.get("version_type");
    RecordingWithContext {
        recording_id: row.get("recording_id"),
        work_id: row.get("work_id"),
        artist_id: row.get("artist_id"),
        title: row.get("title"),
        normalized_title: row.get("normalized_title"),
        version_type: version.parse().unwrap_or(VersionType::Unknown),
        artist_name: row.get("artist_name"),
        normalized_artist: row.get("normalized_artist"),
        has_file: row.get("has_file"),
    }
}

/// Shared SELECT head for context queries.
const CONTEXT_SELECT: &str = r#"
    SELECT
        r.id AS recording_id,
        r.work_id,
        w.artist_id,
        r.title,
        r.normalized_title,
        r.version_type,
        a.name AS artist_name,
        a.normalized_name AS normalized_artist,
        EXISTS (SELECT 1 FROM library_file lf WHERE lf.recording_id = r.id) AS has_file
    FROM recording r
    JOIN work w ON w.id = r.work_id
    JOIN artist a ON a.id = w.artist_id
"#;

#[async_trait]
impl CatalogRepository for PgCatalogRepository {
    async fn artist_by_normalized_name(&self, normalized_name: &str) -> Result<Option<Artist>> {
        sqlx::query_as::<_, Artist>("SELECT * FROM artist WHERE normalized_name = $1")
            .bind(normalized_name)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::StorageUnavailable)
    }

    async fn insert_artist(&self, req: CreateArtistRequest) -> Result<Artist> {
        let normalized_name = normalize(&req.name);
        sqlx::query_as::<_, Artist>(
            r#"
            INSERT INTO artist (name, normalized_name, external_id, display_name)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(&req.name)
        .bind(&normalized_name)
        .bind(&req.external_id)
        .bind(&req.display_name)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_insert_err(e, format!("artist exists: {normalized_name}")))
    }

    async fn work_by_title(&self, artist_id: i64, normalized_title: &str) -> Result<Option<Work>> {
        sqlx::query_as::<_, Work>(
            "SELECT * FROM work WHERE artist_id = $1 AND normalized_title = $2",
        )
        .bind(artist_id)
        .bind(normalized_title)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::StorageUnavailable)
    }

    async fn works_for_artist(&self, artist_id: i64, limit: i64) -> Result<Vec<Work>> {
        sqlx::query_as::<_, Work>(
            "SELECT * FROM work WHERE artist_id = $1 ORDER BY id LIMIT $2",
        )
        .bind(artist_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::StorageUnavailable)
    }

    async fn count_works_for_artist(&self, artist_id: i64) -> Result<i64> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM work WHERE artist_id = $1")
            .bind(artist_id)
            .fetch_one(&self.pool)
            .await
            .map_err(Error::StorageUnavailable)?;
        Ok(row.0)
    }

    async fn insert_work(&self, req: CreateWorkRequest) -> Result<Work> {
        let normalized_title = normalize(&req.title);
        sqlx::query_as::<_, Work>(
            r#"
            INSERT INTO work (artist_id, title, normalized_title, instrumental)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(req.artist_id)
        .bind(&req.title)
        .bind(&normalized_title)
        .bind(req.instrumental)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            map_insert_err(
                e,
                format!("work exists for artist {}: {normalized_title}", req.artist_id),
            )
        })
    }

    async fn recording_by_title_version(
        &self,
        work_id: i64,
        normalized_title: &str,
        version_type: VersionType,
    ) -> Result<Option<Recording>> {
        let row = sqlx::query(
            r#"
            SELECT * FROM recording
            WHERE work_id = $1 AND normalized_title = $2 AND version_type = $3
            "#,
        )
        .bind(work_id)
        .bind(normalized_title)
        .bind(version_type.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::StorageUnavailable)?;
        Ok(row.map(map_recording_row))
    }

    async fn insert_recording(&self, req: CreateRecordingRequest) -> Result<Recording> {
        let normalized_title = normalize(&req.title);
        let row = sqlx::query(
            r#"
            INSERT INTO recording (work_id, title, normalized_title, version_type, duration_secs, external_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(req.work_id)
        .bind(&req.title)
        .bind(&normalized_title)
        .bind(req.version_type.as_str())
        .bind(req.duration_secs)
        .bind(&req.external_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            map_insert_err(
                e,
                format!(
                    "recording exists for work {}: {normalized_title} ({})",
                    req.work_id, req.version_type
                ),
            )
        })?;
        Ok(map_recording_row(row))
    }

    async fn recording(&self, id: i64) -> Result<Recording> {
        let row = sqlx::query("SELECT * FROM recording WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::StorageUnavailable)?;
        row.map(map_recording_row).ok_or(Error::RecordingNotFound(id))
    }

    async fn attach_file(&self, recording_id: i64, path: &str) -> Result<LibraryFile> {
        sqlx::query_as::<_, LibraryFile>(
            r#"
            INSERT INTO library_file (recording_id, path)
            VALUES ($1, $2)
            ON CONFLICT (path) DO UPDATE SET recording_id = EXCLUDED.recording_id
            RETURNING *
            "#,
        )
        .bind(recording_id)
        .bind(path)
        .fetch_one(&self.pool)
        .await
        .map_err(Error::StorageUnavailable)
    }

    async fn search_recordings(
        &self,
        normalized_artist: &str,
        normalized_title: &str,
        limit: i64,
    ) -> Result<Vec<RecordingWithContext>> {
        // Normalized text contains no LIKE metacharacters (the normalizer
        // strips %, _ and \), so the patterns bind directly.
        let query = format!(
            r#"{CONTEXT_SELECT}
            WHERE (a.normalized_name LIKE '%' || $1 || '%' OR $1 LIKE '%' || a.normalized_name || '%')
              AND (r.normalized_title LIKE '%' || $2 || '%'
                   OR $2 LIKE '%' || r.normalized_title || '%'
                   OR w.normalized_title LIKE '%' || $2 || '%')
            ORDER BY r.id
            LIMIT $3
            "#
        );
        let rows = sqlx::query(&query)
            .bind(normalized_artist)
            .bind(normalized_title)
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .map_err(Error::StorageUnavailable)?;
        Ok(rows.into_iter().map(map_context_row).collect())
    }

    async fn recordings_for_artist(
        &self,
        normalized_artist: &str,
        limit: i64,
    ) -> Result<Vec<RecordingWithContext>> {
        let query = format!(
            r#"{CONTEXT_SELECT}
            WHERE a.normalized_name = $1
            ORDER BY r.id
            LIMIT $2
            "#
        );
        let rows = sqlx::query(&query)
            .bind(normalized_artist)
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .map_err(Error::StorageUnavailable)?;
        Ok(rows.into_iter().map(map_context_row).collect())
    }

    async fn recordings_pool(&self, limit: i64) -> Result<Vec<RecordingWithContext>> {
        let query = format!(
            r#"{CONTEXT_SELECT}
            ORDER BY r.id DESC
            LIMIT $1
            "#
        );
        let rows = sqlx::query(&query)
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .map_err(Error::StorageUnavailable)?;
        Ok(rows.into_iter().map(map_context_row).collect())
    }

    async fn recordings_by_external_ids(
        &self,
        external_ids: &[String],
    ) -> Result<Vec<(String, RecordingWithContext)>> {
        if external_ids.is_empty() {
            return Ok(Vec::new());
        }
        let query = r#"
            SELECT
                r.id AS recording_id,
                r.work_id,
                w.artist_id,
                r.title,
                r.normalized_title,
                r.version_type,
                r.external_id,
                a.name AS artist_name,
                a.normalized_name AS normalized_artist,
                EXISTS (SELECT 1 FROM library_file lf WHERE lf.recording_id = r.id) AS has_file
            FROM recording r
            JOIN work w ON w.id = r.work_id
            JOIN artist a ON a.id = w.artist_id
            WHERE r.external_id = ANY($1)
            "#;
        let rows = sqlx::query(query)
            .bind(external_ids)
            .fetch_all(&self.pool)
            .await
            .map_err(Error::StorageUnavailable)?;
        Ok(rows
            .into_iter()
            .map(|row| {
                let ext: String = row.get("external_id");
                (ext, map_context_row(row))
            })
            .collect())
    }
}
