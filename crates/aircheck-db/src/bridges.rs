//! Identity bridge repository implementation.
//!
//! The partial unique index on (signature) WHERE NOT revoked is the
//! single source of truth for "already bridged": `create` inserts
//! unconditionally and maps the violation to `Conflict` instead of
//! pre-checking, so concurrent confirmations cannot slip past each other.

use async_trait::async_trait;
use sqlx::{Pool, Postgres};

use aircheck_core::{
    BridgeRepository, CreateBridgeRequest, Error, IdentityBridge, Result,
};

use crate::catalog::map_insert_err;
use crate::escape_like;

/// PostgreSQL implementation of BridgeRepository.
pub struct PgBridgeRepository {
    pool: Pool<Postgres>,
}

impl PgBridgeRepository {
    /// Create a new PgBridgeRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BridgeRepository for PgBridgeRepository {
    async fn lookup(&self, signature: &str) -> Result<Option<IdentityBridge>> {
        sqlx::query_as::<_, IdentityBridge>(
            "SELECT * FROM identity_bridge WHERE signature = $1 AND NOT revoked",
        )
        .bind(signature)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::StorageUnavailable)
    }

    async fn create(&self, req: CreateBridgeRequest) -> Result<IdentityBridge> {
        sqlx::query_as::<_, IdentityBridge>(
            r#"
            INSERT INTO identity_bridge (signature, raw_artist, raw_title, recording_id)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(&req.signature)
        .bind(&req.raw_artist)
        .bind(&req.raw_title)
        .bind(req.recording_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_insert_err(e, format!("signature already bridged: {}", req.signature)))
    }

    async fn get(&self, id: i64) -> Result<IdentityBridge> {
        sqlx::query_as::<_, IdentityBridge>("SELECT * FROM identity_bridge WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::StorageUnavailable)?
            .ok_or(Error::BridgeNotFound(id))
    }

    async fn revoke(&self, id: i64) -> Result<IdentityBridge> {
        let updated = sqlx::query_as::<_, IdentityBridge>(
            r#"
            UPDATE identity_bridge
            SET revoked = true, updated_at_utc = now()
            WHERE id = $1 AND NOT revoked
            RETURNING *
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::StorageUnavailable)?;

        match updated {
            Some(bridge) => Ok(bridge),
            // Already revoked is a no-op success; truly absent is an error.
            None => self.get(id).await,
        }
    }

    async fn list(
        &self,
        search: Option<&str>,
        include_revoked: bool,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<IdentityBridge>> {
        let pattern = search.map(|s| format!("%{}%", escape_like(s)));
        sqlx::query_as::<_, IdentityBridge>(
            r#"
            SELECT * FROM identity_bridge
            WHERE ($1::bool OR NOT revoked)
              AND ($2::text IS NULL OR raw_artist ILIKE $2 OR raw_title ILIKE $2)
            ORDER BY created_at_utc DESC, id DESC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(include_revoked)
        .bind(pattern)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::StorageUnavailable)
    }
}
