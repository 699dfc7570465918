//! Core traits for aircheck abstractions.
//!
//! These traits define the interfaces that concrete implementations must
//! satisfy, enabling pluggable backends and testability. The PostgreSQL
//! implementations live in `aircheck-db`; in-memory reference
//! implementations for tests live in [`crate::memory`].

use async_trait::async_trait;

use crate::error::Result;
use crate::models::*;

// =============================================================================
// CATALOG REPOSITORY
// =============================================================================

/// Repository for the canonical catalog (artists, works, recordings,
/// library files).
///
/// Insert operations are conflict-aware: a uniqueness violation surfaces
/// as `Error::Conflict`, distinctly from storage failures, so callers can
/// implement retry-as-lookup under concurrent writers. Inserts never
/// upsert silently.
#[async_trait]
pub trait CatalogRepository: Send + Sync {
    /// Exact artist lookup by normalized name.
    async fn artist_by_normalized_name(&self, normalized_name: &str) -> Result<Option<Artist>>;

    /// Insert a new artist. `Err(Conflict)` if the normalized name exists.
    async fn insert_artist(&self, req: CreateArtistRequest) -> Result<Artist>;

    /// Exact work lookup by (artist id, normalized title).
    async fn work_by_title(&self, artist_id: i64, normalized_title: &str) -> Result<Option<Work>>;

    /// Existing works for an artist, oldest first, capped at `limit`.
    /// The fuzzy comparator's candidate pool.
    async fn works_for_artist(&self, artist_id: i64, limit: i64) -> Result<Vec<Work>>;

    /// Total work count for an artist (fuzzy budget check).
    async fn count_works_for_artist(&self, artist_id: i64) -> Result<i64>;

    /// Insert a new work. `Err(Conflict)` if (artist id, normalized
    /// title) exists.
    async fn insert_work(&self, req: CreateWorkRequest) -> Result<Work>;

    /// Exact recording lookup by (work id, normalized title, version).
    async fn recording_by_title_version(
        &self,
        work_id: i64,
        normalized_title: &str,
        version_type: VersionType,
    ) -> Result<Option<Recording>>;

    /// Insert a new recording. `Err(Conflict)` if (work id, normalized
    /// title, version type) exists.
    async fn insert_recording(&self, req: CreateRecordingRequest) -> Result<Recording>;

    /// Fetch a recording by id. `Err(RecordingNotFound)` when absent.
    async fn recording(&self, id: i64) -> Result<Recording>;

    /// Attach a library file to a recording. Idempotent on path: re-scans
    /// of the same file return the existing row.
    async fn attach_file(&self, recording_id: i64, path: &str) -> Result<LibraryFile>;

    /// Substring/pattern search against recording titles, work titles,
    /// and artist names (case-insensitive, whitespace-tolerant inputs are
    /// expected to be normalized already).
    async fn search_recordings(
        &self,
        normalized_artist: &str,
        normalized_title: &str,
        limit: i64,
    ) -> Result<Vec<RecordingWithContext>>;

    /// All recordings under artists whose normalized name matches
    /// exactly; the fuzzy strategy's same-artist pool.
    async fn recordings_for_artist(
        &self,
        normalized_artist: &str,
        limit: i64,
    ) -> Result<Vec<RecordingWithContext>>;

    /// A bounded global candidate pool, newest catalog entries first.
    async fn recordings_pool(&self, limit: i64) -> Result<Vec<RecordingWithContext>>;

    /// Map vector-index external ids back to recordings. Unknown ids are
    /// omitted from the result.
    async fn recordings_by_external_ids(
        &self,
        external_ids: &[String],
    ) -> Result<Vec<(String, RecordingWithContext)>>;
}

// =============================================================================
// IDENTITY BRIDGE REPOSITORY
// =============================================================================

/// Persistent cache mapping normalized signatures to confirmed
/// recordings.
///
/// The partial uniqueness constraint on (signature, non-revoked) is the
/// single source of truth preventing duplicate bridges; `create` treats
/// the constraint violation as the "already bridged" signal rather than
/// pre-checking.
#[async_trait]
pub trait BridgeRepository: Send + Sync {
    /// Look up the active (non-revoked) bridge for a signature key.
    async fn lookup(&self, signature: &str) -> Result<Option<IdentityBridge>>;

    /// Create a bridge. `Err(Conflict)` if a non-revoked bridge for the
    /// signature already exists.
    async fn create(&self, req: CreateBridgeRequest) -> Result<IdentityBridge>;

    /// Fetch a bridge by id. `Err(BridgeNotFound)` when absent.
    async fn get(&self, id: i64) -> Result<IdentityBridge>;

    /// Soft-delete a bridge. Idempotent: revoking an already-revoked
    /// bridge is a no-op success.
    async fn revoke(&self, id: i64) -> Result<IdentityBridge>;

    /// List bridges, optionally matching raw artist/title against a
    /// search term. Revoked bridges are excluded unless requested.
    async fn list(
        &self,
        search: Option<&str>,
        include_revoked: bool,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<IdentityBridge>>;
}

// =============================================================================
// DISCOVERY QUEUE REPOSITORY
// =============================================================================

/// Aggregated backlog of unresolved signatures pending human review.
#[async_trait]
pub trait DiscoveryRepository: Send + Sync {
    /// Record one unmatched observation: increments the occurrence count
    /// for the signature or creates a new entry. A suggested recording,
    /// when present, overwrites the previous suggestion.
    async fn record_unmatched(
        &self,
        signature: &str,
        raw_artist: &str,
        raw_title: &str,
        suggested_recording_id: Option<i64>,
    ) -> Result<DiscoveryEntry>;

    /// Fetch an entry by signature key.
    async fn get(&self, signature: &str) -> Result<Option<DiscoveryEntry>>;

    /// Mark an entry resolved to the given recording.
    /// `Err(NotFound)` when no entry exists for the signature.
    async fn resolve(&self, signature: &str, recording_id: i64) -> Result<DiscoveryEntry>;

    /// List entries; resolved entries drop out unless `filter` is `All`.
    async fn list(
        &self,
        filter: DiscoveryFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<DiscoveryEntry>>;

    /// Random sample of unresolved entries for threshold simulation.
    async fn sample_unresolved(&self, n: i64) -> Result<Vec<DiscoveryEntry>>;
}

// =============================================================================
// BROADCAST LOG REPOSITORY
// =============================================================================

/// Storage for observed play events.
#[async_trait]
pub trait LogRepository: Send + Sync {
    /// Persist one play event with its precomputed signature key.
    async fn insert(&self, event: LogEvent, signature: &str) -> Result<BroadcastLog>;

    /// Backfill-resolution: stamp every log with this signature and a
    /// null recording id. Returns the number of logs updated.
    async fn stamp_matches(&self, signature: &str, recording_id: i64) -> Result<u64>;

    /// All logs for a signature key, oldest first.
    async fn for_signature(&self, signature: &str) -> Result<Vec<BroadcastLog>>;

    /// Number of logs still lacking a resolved recording.
    async fn unresolved_count(&self) -> Result<i64>;
}

// =============================================================================
// VECTOR INDEX
// =============================================================================

/// External embedding/vector index collaborator.
///
/// Best-effort: implementations must be timeout-safe and surface
/// failures as `Error::SearchDegraded` so the matcher can skip the
/// strategy instead of failing the match.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Nearest-neighbour search for the raw signature text.
    async fn search(&self, text: &str, k: usize) -> Result<Vec<VectorHit>>;
}
