//! In-memory reference implementations of the repository traits.
//!
//! These back the unit and integration tests of every aircheck crate
//! without requiring PostgreSQL, and enforce the same uniqueness
//! constraints the SQL schema does — returning `Error::Conflict` exactly
//! where the database would — so the optimistic-concurrency contract can
//! be exercised in-process.
//!
//! Always compiled (not `#[cfg(test)]`) so downstream crates' tests can
//! use them.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;

use crate::error::{Error, Result};
use crate::models::*;
use crate::traits::*;

// =============================================================================
// CATALOG
// =============================================================================

#[derive(Default)]
struct CatalogState {
    artists: Vec<Artist>,
    works: Vec<Work>,
    recordings: Vec<Recording>,
    files: Vec<LibraryFile>,
    next_id: i64,
}

impl CatalogState {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn context_for(&self, recording: &Recording) -> Option<RecordingWithContext> {
        let work = self.works.iter().find(|w| w.id == recording.work_id)?;
        let artist = self.artists.iter().find(|a| a.id == work.artist_id)?;
        let has_file = self.files.iter().any(|f| f.recording_id == recording.id);
        Some(RecordingWithContext {
            recording_id: recording.id,
            work_id: work.id,
            artist_id: artist.id,
            title: recording.title.clone(),
            normalized_title: recording.normalized_title.clone(),
            version_type: recording.version_type,
            artist_name: artist.name.clone(),
            normalized_artist: artist.normalized_name.clone(),
            has_file,
        })
    }
}

/// In-memory [`CatalogRepository`].
#[derive(Clone, Default)]
pub struct MemoryCatalog {
    state: Arc<Mutex<CatalogState>>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of works currently stored (test assertions).
    pub fn work_count(&self) -> usize {
        self.state.lock().unwrap().works.len()
    }

    /// Number of recordings currently stored (test assertions).
    pub fn recording_count(&self) -> usize {
        self.state.lock().unwrap().recordings.len()
    }

    /// Number of library files currently stored (test assertions).
    pub fn file_count(&self) -> usize {
        self.state.lock().unwrap().files.len()
    }
}

#[async_trait]
impl CatalogRepository for MemoryCatalog {
    async fn artist_by_normalized_name(&self, normalized_name: &str) -> Result<Option<Artist>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .artists
            .iter()
            .find(|a| a.normalized_name == normalized_name)
            .cloned())
    }

    async fn insert_artist(&self, req: CreateArtistRequest) -> Result<Artist> {
        let normalized_name = crate::normalize(&req.name);
        let mut state = self.state.lock().unwrap();
        if state
            .artists
            .iter()
            .any(|a| a.normalized_name == normalized_name)
        {
            return Err(Error::Conflict(format!(
                "artist normalized name already exists: {normalized_name}"
            )));
        }
        let artist = Artist {
            id: state.next_id(),
            name: req.name,
            normalized_name,
            external_id: req.external_id,
            display_name: req.display_name,
            created_at_utc: Utc::now(),
        };
        state.artists.push(artist.clone());
        Ok(artist)
    }

    async fn work_by_title(&self, artist_id: i64, normalized_title: &str) -> Result<Option<Work>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .works
            .iter()
            .find(|w| w.artist_id == artist_id && w.normalized_title == normalized_title)
            .cloned())
    }

    async fn works_for_artist(&self, artist_id: i64, limit: i64) -> Result<Vec<Work>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .works
            .iter()
            .filter(|w| w.artist_id == artist_id)
            .take(limit.max(0) as usize)
            .cloned()
            .collect())
    }

    async fn count_works_for_artist(&self, artist_id: i64) -> Result<i64> {
        let state = self.state.lock().unwrap();
        Ok(state.works.iter().filter(|w| w.artist_id == artist_id).count() as i64)
    }

    async fn insert_work(&self, req: CreateWorkRequest) -> Result<Work> {
        let normalized_title = crate::normalize(&req.title);
        let mut state = self.state.lock().unwrap();
        if state
            .works
            .iter()
            .any(|w| w.artist_id == req.artist_id && w.normalized_title == normalized_title)
        {
            return Err(Error::Conflict(format!(
                "work already exists for artist {}: {normalized_title}",
                req.artist_id
            )));
        }
        let work = Work {
            id: state.next_id(),
            artist_id: req.artist_id,
            title: req.title,
            normalized_title,
            instrumental: req.instrumental,
            created_at_utc: Utc::now(),
        };
        state.works.push(work.clone());
        Ok(work)
    }

    async fn recording_by_title_version(
        &self,
        work_id: i64,
        normalized_title: &str,
        version_type: VersionType,
    ) -> Result<Option<Recording>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .recordings
            .iter()
            .find(|r| {
                r.work_id == work_id
                    && r.normalized_title == normalized_title
                    && r.version_type == version_type
            })
            .cloned())
    }

    async fn insert_recording(&self, req: CreateRecordingRequest) -> Result<Recording> {
        let normalized_title = crate::normalize(&req.title);
        let mut state = self.state.lock().unwrap();
        if state.recordings.iter().any(|r| {
            r.work_id == req.work_id
                && r.normalized_title == normalized_title
                && r.version_type == req.version_type
        }) {
            return Err(Error::Conflict(format!(
                "recording already exists for work {}: {normalized_title} ({})",
                req.work_id, req.version_type
            )));
        }
        let recording = Recording {
            id: state.next_id(),
            work_id: req.work_id,
            title: req.title,
            normalized_title,
            version_type: req.version_type,
            duration_secs: req.duration_secs,
            external_id: req.external_id,
            created_at_utc: Utc::now(),
        };
        state.recordings.push(recording.clone());
        Ok(recording)
    }

    async fn recording(&self, id: i64) -> Result<Recording> {
        let state = self.state.lock().unwrap();
        state
            .recordings
            .iter()
            .find(|r| r.id == id)
            .cloned()
            .ok_or(Error::RecordingNotFound(id))
    }

    async fn attach_file(&self, recording_id: i64, path: &str) -> Result<LibraryFile> {
        let mut state = self.state.lock().unwrap();
        if !state.recordings.iter().any(|r| r.id == recording_id) {
            return Err(Error::RecordingNotFound(recording_id));
        }
        if let Some(existing) = state.files.iter_mut().find(|f| f.path == path) {
            // Re-scan of a known path: re-point if the file was re-tagged.
            existing.recording_id = recording_id;
            return Ok(existing.clone());
        }
        let file = LibraryFile {
            id: state.next_id(),
            recording_id,
            path: path.to_string(),
            created_at_utc: Utc::now(),
        };
        state.files.push(file.clone());
        Ok(file)
    }

    async fn search_recordings(
        &self,
        normalized_artist: &str,
        normalized_title: &str,
        limit: i64,
    ) -> Result<Vec<RecordingWithContext>> {
        let state = self.state.lock().unwrap();
        let mut hits: Vec<RecordingWithContext> = state
            .recordings
            .iter()
            .filter_map(|r| state.context_for(r))
            .filter(|ctx| {
                contains_either(&ctx.normalized_artist, normalized_artist)
                    && contains_either(&ctx.normalized_title, normalized_title)
            })
            .collect();
        hits.sort_by_key(|c| c.recording_id);
        hits.truncate(limit.max(0) as usize);
        Ok(hits)
    }

    async fn recordings_for_artist(
        &self,
        normalized_artist: &str,
        limit: i64,
    ) -> Result<Vec<RecordingWithContext>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .recordings
            .iter()
            .filter_map(|r| state.context_for(r))
            .filter(|ctx| ctx.normalized_artist == normalized_artist)
            .take(limit.max(0) as usize)
            .collect())
    }

    async fn recordings_pool(&self, limit: i64) -> Result<Vec<RecordingWithContext>> {
        let state = self.state.lock().unwrap();
        let mut pool: Vec<RecordingWithContext> = state
            .recordings
            .iter()
            .filter_map(|r| state.context_for(r))
            .collect();
        pool.sort_by_key(|c| std::cmp::Reverse(c.recording_id));
        pool.truncate(limit.max(0) as usize);
        Ok(pool)
    }

    async fn recordings_by_external_ids(
        &self,
        external_ids: &[String],
    ) -> Result<Vec<(String, RecordingWithContext)>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .recordings
            .iter()
            .filter_map(|r| {
                let ext = r.external_id.as_ref()?;
                if !external_ids.contains(ext) {
                    return None;
                }
                Some((ext.clone(), state.context_for(r)?))
            })
            .collect())
    }
}

/// Substring containment in either direction, so a shortened log title
/// still finds the full catalog title and vice versa.
fn contains_either(a: &str, b: &str) -> bool {
    !a.is_empty() && !b.is_empty() && (a.contains(b) || b.contains(a))
}

// =============================================================================
// IDENTITY BRIDGES
// =============================================================================

#[derive(Default)]
struct BridgeState {
    bridges: Vec<IdentityBridge>,
    next_id: i64,
}

/// In-memory [`BridgeRepository`].
#[derive(Clone, Default)]
pub struct MemoryBridges {
    state: Arc<Mutex<BridgeState>>,
}

impl MemoryBridges {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BridgeRepository for MemoryBridges {
    async fn lookup(&self, signature: &str) -> Result<Option<IdentityBridge>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .bridges
            .iter()
            .find(|b| b.signature == signature && !b.revoked)
            .cloned())
    }

    async fn create(&self, req: CreateBridgeRequest) -> Result<IdentityBridge> {
        let mut state = self.state.lock().unwrap();
        if state
            .bridges
            .iter()
            .any(|b| b.signature == req.signature && !b.revoked)
        {
            return Err(Error::Conflict(format!(
                "signature already bridged: {}",
                req.signature
            )));
        }
        state.next_id += 1;
        let now = Utc::now();
        let bridge = IdentityBridge {
            id: state.next_id,
            signature: req.signature,
            raw_artist: req.raw_artist,
            raw_title: req.raw_title,
            recording_id: req.recording_id,
            revoked: false,
            created_at_utc: now,
            updated_at_utc: now,
        };
        state.bridges.push(bridge.clone());
        Ok(bridge)
    }

    async fn get(&self, id: i64) -> Result<IdentityBridge> {
        let state = self.state.lock().unwrap();
        state
            .bridges
            .iter()
            .find(|b| b.id == id)
            .cloned()
            .ok_or(Error::BridgeNotFound(id))
    }

    async fn revoke(&self, id: i64) -> Result<IdentityBridge> {
        let mut state = self.state.lock().unwrap();
        let bridge = state
            .bridges
            .iter_mut()
            .find(|b| b.id == id)
            .ok_or(Error::BridgeNotFound(id))?;
        if !bridge.revoked {
            bridge.revoked = true;
            bridge.updated_at_utc = Utc::now();
        }
        Ok(bridge.clone())
    }

    async fn list(
        &self,
        search: Option<&str>,
        include_revoked: bool,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<IdentityBridge>> {
        let state = self.state.lock().unwrap();
        let needle = search.map(|s| s.to_lowercase());
        Ok(state
            .bridges
            .iter()
            .filter(|b| include_revoked || !b.revoked)
            .filter(|b| match &needle {
                None => true,
                Some(n) => {
                    b.raw_artist.to_lowercase().contains(n)
                        || b.raw_title.to_lowercase().contains(n)
                }
            })
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .cloned()
            .collect())
    }
}

// =============================================================================
// DISCOVERY QUEUE
// =============================================================================

/// In-memory [`DiscoveryRepository`].
#[derive(Clone, Default)]
pub struct MemoryDiscovery {
    state: Arc<Mutex<HashMap<String, DiscoveryEntry>>>,
}

impl MemoryDiscovery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries, resolved included (test assertions).
    pub fn entry_count(&self) -> usize {
        self.state.lock().unwrap().len()
    }
}

#[async_trait]
impl DiscoveryRepository for MemoryDiscovery {
    async fn record_unmatched(
        &self,
        signature: &str,
        raw_artist: &str,
        raw_title: &str,
        suggested_recording_id: Option<i64>,
    ) -> Result<DiscoveryEntry> {
        let mut state = self.state.lock().unwrap();
        let now = Utc::now();
        let entry = state
            .entry(signature.to_string())
            .and_modify(|e| {
                e.occurrence_count += 1;
                e.last_seen_utc = now;
                if suggested_recording_id.is_some() {
                    e.suggested_recording_id = suggested_recording_id;
                }
            })
            .or_insert_with(|| DiscoveryEntry {
                signature: signature.to_string(),
                raw_artist: raw_artist.to_string(),
                raw_title: raw_title.to_string(),
                occurrence_count: 1,
                suggested_recording_id,
                resolved: false,
                first_seen_utc: now,
                last_seen_utc: now,
            });
        Ok(entry.clone())
    }

    async fn get(&self, signature: &str) -> Result<Option<DiscoveryEntry>> {
        Ok(self.state.lock().unwrap().get(signature).cloned())
    }

    async fn resolve(&self, signature: &str, recording_id: i64) -> Result<DiscoveryEntry> {
        let mut state = self.state.lock().unwrap();
        let entry = state
            .get_mut(signature)
            .ok_or_else(|| Error::NotFound(format!("discovery entry: {signature}")))?;
        entry.resolved = true;
        entry.suggested_recording_id = Some(recording_id);
        entry.last_seen_utc = Utc::now();
        Ok(entry.clone())
    }

    async fn list(
        &self,
        filter: DiscoveryFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<DiscoveryEntry>> {
        let state = self.state.lock().unwrap();
        let mut entries: Vec<DiscoveryEntry> = state
            .values()
            .filter(|e| filter == DiscoveryFilter::All || !e.resolved)
            .cloned()
            .collect();
        entries.sort_by(|a, b| b.last_seen_utc.cmp(&a.last_seen_utc));
        Ok(entries
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect())
    }

    async fn sample_unresolved(&self, n: i64) -> Result<Vec<DiscoveryEntry>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .values()
            .filter(|e| !e.resolved)
            .take(n.max(0) as usize)
            .cloned()
            .collect())
    }
}

// =============================================================================
// BROADCAST LOGS
// =============================================================================

#[derive(Default)]
struct LogState {
    logs: Vec<BroadcastLog>,
    next_id: i64,
}

/// In-memory [`LogRepository`].
#[derive(Clone, Default)]
pub struct MemoryLogs {
    state: Arc<Mutex<LogState>>,
}

impl MemoryLogs {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LogRepository for MemoryLogs {
    async fn insert(&self, event: LogEvent, signature: &str) -> Result<BroadcastLog> {
        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        let log = BroadcastLog {
            id: state.next_id,
            raw_artist: event.raw_artist,
            raw_title: event.raw_title,
            signature: signature.to_string(),
            recording_id: None,
            station_id: event.station_id,
            played_at_utc: event.played_at_utc,
            created_at_utc: Utc::now(),
        };
        state.logs.push(log.clone());
        Ok(log)
    }

    async fn stamp_matches(&self, signature: &str, recording_id: i64) -> Result<u64> {
        let mut state = self.state.lock().unwrap();
        let mut stamped = 0;
        for log in state
            .logs
            .iter_mut()
            .filter(|l| l.signature == signature && l.recording_id.is_none())
        {
            log.recording_id = Some(recording_id);
            stamped += 1;
        }
        Ok(stamped)
    }

    async fn for_signature(&self, signature: &str) -> Result<Vec<BroadcastLog>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .logs
            .iter()
            .filter(|l| l.signature == signature)
            .cloned()
            .collect())
    }

    async fn unresolved_count(&self) -> Result<i64> {
        let state = self.state.lock().unwrap();
        Ok(state.logs.iter().filter(|l| l.recording_id.is_none()).count() as i64)
    }
}
