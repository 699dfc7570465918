//! # aircheck-db
//!
//! PostgreSQL database layer for aircheck.
//!
//! This crate provides:
//! - Connection pool management
//! - Repository implementations for the catalog (artists, works,
//!   recordings, library files)
//! - Identity bridge, discovery queue, and broadcast log repositories
//! - Conflict-aware inserts: uniqueness violations surface as
//!   `Error::Conflict`, distinct from `Error::StorageUnavailable`, so the
//!   grouper's retry-as-lookup discipline has a reliable signal
//!
//! ## Example
//!
//! ```rust,ignore
//! use aircheck_db::Database;
//! use aircheck_core::{CatalogRepository, CreateArtistRequest};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::connect("postgres://localhost/aircheck").await?;
//!
//!     let artist = db.catalog.insert_artist(CreateArtistRequest {
//!         name: "Great White".to_string(),
//!         external_id: None,
//!         display_name: None,
//!     }).await?;
//!
//!     println!("Created artist: {}", artist.id);
//!     Ok(())
//! }
//! ```

pub mod bridges;
pub mod catalog;
pub mod discovery;
pub mod logs;
pub mod pool;

// Re-export core types
pub use aircheck_core::*;

pub use bridges::PgBridgeRepository;
pub use catalog::PgCatalogRepository;
pub use discovery::PgDiscoveryRepository;
pub use logs::PgLogRepository;
pub use pool::{create_pool, create_pool_with_config, log_pool_metrics, PoolConfig};

/// Escape LIKE/ILIKE wildcard characters (`%`, `_`, `\`) in user input.
pub fn escape_like(input: &str) -> String {
    input
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

/// Combined database context with all repositories.
pub struct Database {
    /// The underlying connection pool.
    pub pool: sqlx::Pool<sqlx::Postgres>,
    /// Catalog repository (artists, works, recordings, files).
    pub catalog: PgCatalogRepository,
    /// Identity bridge repository.
    pub bridges: PgBridgeRepository,
    /// Discovery queue repository.
    pub discovery: PgDiscoveryRepository,
    /// Broadcast log repository.
    pub logs: PgLogRepository,
}

impl Database {
    /// Create a new Database instance from a connection pool.
    pub fn new(pool: sqlx::Pool<sqlx::Postgres>) -> Self {
        Self {
            catalog: PgCatalogRepository::new(pool.clone()),
            bridges: PgBridgeRepository::new(pool.clone()),
            discovery: PgDiscoveryRepository::new(pool.clone()),
            logs: PgLogRepository::new(pool.clone()),
            pool,
        }
    }

    /// Create a new Database instance by connecting to the given URL.
    pub async fn connect(url: &str) -> Result<Self> {
        let pool = create_pool(url).await?;
        Ok(Self::new(pool))
    }

    /// Create with custom pool configuration.
    pub async fn connect_with_config(url: &str, config: PoolConfig) -> Result<Self> {
        let pool = create_pool_with_config(url, config).await?;
        Ok(Self::new(pool))
    }

    /// Run pending migrations.
    #[cfg(feature = "migrations")]
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("../../migrations")
            .run(&self.pool)
            .await
            .map_err(|e| Error::StorageUnavailable(sqlx::Error::Migrate(Box::new(e))))?;
        Ok(())
    }

    /// Get the underlying connection pool.
    pub fn pool(&self) -> &sqlx::Pool<sqlx::Postgres> {
        &self.pool
    }
}
