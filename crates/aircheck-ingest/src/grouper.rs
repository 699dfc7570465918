//! Scan-time catalog grouping.
//!
//! Maps one scanned (artist, title, version-hint, duration) tuple to an
//! (Artist, Work, Recording) triple, creating rows only when no
//! acceptable match exists. Resolution is strictly ordered — artist,
//! then work, then recording — and every create is optimistic: a
//! uniqueness conflict means a concurrent scanner already created the
//! equivalent row, so the grouper re-reads and returns the winner
//! instead of surfacing the error. Concurrent scans of overlapping
//! files never produce duplicate works or recordings.

use std::sync::Arc;

use tracing::{debug, info};

use aircheck_core::{
    defaults, normalize, similarity, Artist, CatalogRepository, CreateArtistRequest,
    CreateRecordingRequest, CreateWorkRequest, Error, LibraryFile, Recording, Result,
    ScannedTrack, VersionType, Work,
};

/// Fallback artist name for files with no usable artist tag.
const UNKNOWN_ARTIST: &str = "Unknown Artist";

/// Configuration for the catalog grouper.
#[derive(Debug, Clone)]
pub struct GrouperConfig {
    /// Work-count budget above which fuzzy matching is skipped and an
    /// exact-miss creates a new work.
    pub max_works_for_fuzzy: i64,
    /// Minimum similarity for folding a title into an existing work.
    pub work_fuzzy_threshold: f32,
}

impl Default for GrouperConfig {
    fn default() -> Self {
        Self {
            max_works_for_fuzzy: defaults::MAX_WORKS_FOR_FUZZY,
            work_fuzzy_threshold: defaults::WORK_FUZZY_THRESHOLD,
        }
    }
}

impl GrouperConfig {
    /// Create config from environment variables (with defaults).
    ///
    /// | Variable | Default | Description |
    /// |----------|---------|-------------|
    /// | `AIRCHECK_MAX_WORKS_FOR_FUZZY` | `500` | Fuzzy comparison budget |
    /// | `AIRCHECK_WORK_FUZZY_THRESHOLD` | `0.85` | Work fold threshold |
    pub fn from_env() -> Self {
        let base = Self::default();
        Self {
            max_works_for_fuzzy: std::env::var("AIRCHECK_MAX_WORKS_FOR_FUZZY")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(base.max_works_for_fuzzy),
            work_fuzzy_threshold: std::env::var("AIRCHECK_WORK_FUZZY_THRESHOLD")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(base.work_fuzzy_threshold),
        }
    }
}

/// Result of grouping one scanned track.
#[derive(Debug, Clone)]
pub struct GroupedTrack {
    pub artist: Artist,
    pub work: Work,
    pub recording: Recording,
    /// Present when the scanned tuple carried a file path.
    pub file: Option<LibraryFile>,
    pub created_work: bool,
    pub created_recording: bool,
}

/// Scan-time grouper over a catalog repository.
pub struct CatalogGrouper {
    catalog: Arc<dyn CatalogRepository>,
    config: GrouperConfig,
}

impl CatalogGrouper {
    /// Create a grouper with the given configuration.
    pub fn new(catalog: Arc<dyn CatalogRepository>, config: GrouperConfig) -> Self {
        Self { catalog, config }
    }

    /// Resolve or create the catalog rows for one scanned tuple.
    pub async fn group(&self, track: &ScannedTrack) -> Result<GroupedTrack> {
        if normalize(&track.title).is_empty() {
            return Err(Error::InvalidInput(format!(
                "scanned file has no usable title: {}",
                track.path
            )));
        }

        let artist = self.resolve_artist(&track.artist).await?;
        let (work, created_work) = self.resolve_work(&artist, &track.title).await?;
        let version = VersionType::from_hint(track.version_hint.as_deref());
        let (recording, created_recording) = self
            .resolve_recording(&work, &track.title, version, track.duration_secs)
            .await?;

        let file = if track.path.is_empty() {
            None
        } else {
            Some(self.catalog.attach_file(recording.id, &track.path).await?)
        };

        debug!(
            subsystem = "ingest",
            component = "grouper",
            op = "group",
            artist_id = artist.id,
            work_id = work.id,
            recording_id = recording.id,
            created_work,
            created_recording,
            "Grouped scanned track"
        );

        Ok(GroupedTrack {
            artist,
            work,
            recording,
            file,
            created_work,
            created_recording,
        })
    }

    /// Exact lookup by normalized name, else create. Untagged files land
    /// under a shared fallback artist.
    async fn resolve_artist(&self, name: &str) -> Result<Artist> {
        let name = if normalize(name).is_empty() {
            UNKNOWN_ARTIST
        } else {
            name
        };
        let normalized = normalize(name);

        if let Some(artist) = self.catalog.artist_by_normalized_name(&normalized).await? {
            return Ok(artist);
        }

        match self
            .catalog
            .insert_artist(CreateArtistRequest {
                name: name.to_string(),
                external_id: None,
                display_name: None,
            })
            .await
        {
            Ok(artist) => {
                info!(
                    subsystem = "ingest",
                    component = "grouper",
                    op = "create_artist",
                    artist_id = artist.id,
                    "Created artist"
                );
                Ok(artist)
            }
            Err(e) if e.is_conflict() => self
                .catalog
                .artist_by_normalized_name(&normalized)
                .await?
                .ok_or_else(|| {
                    Error::Internal(format!("artist conflict but no row found: {normalized}"))
                }),
            Err(e) => Err(e),
        }
    }

    /// Exact lookup, then budgeted fuzzy lookup, then create.
    async fn resolve_work(&self, artist: &Artist, title: &str) -> Result<(Work, bool)> {
        let normalized = normalize(title);

        if let Some(work) = self.catalog.work_by_title(artist.id, &normalized).await? {
            return Ok((work, false));
        }

        if let Some(work) = self.fuzzy_work(artist, &normalized).await? {
            return Ok((work, false));
        }

        match self
            .catalog
            .insert_work(CreateWorkRequest {
                artist_id: artist.id,
                title: title.to_string(),
                instrumental: false,
            })
            .await
        {
            Ok(work) => Ok((work, true)),
            Err(e) if e.is_conflict() => {
                // A concurrent scanner created the same work between our
                // lookup and insert; its row wins.
                let work = self
                    .catalog
                    .work_by_title(artist.id, &normalized)
                    .await?
                    .ok_or_else(|| {
                        Error::Internal(format!("work conflict but no row found: {normalized}"))
                    })?;
                Ok((work, false))
            }
            Err(e) => Err(e),
        }
    }

    /// Fuzzy work lookup bounded by the comparison budget. Returns the
    /// highest-scoring work at or above the threshold; equal scores
    /// prefer the lowest id. Skipped entirely for artists whose catalog
    /// exceeds the budget.
    async fn fuzzy_work(&self, artist: &Artist, normalized_title: &str) -> Result<Option<Work>> {
        let count = self.catalog.count_works_for_artist(artist.id).await?;
        if count == 0 {
            return Ok(None);
        }
        if count > self.config.max_works_for_fuzzy {
            debug!(
                subsystem = "ingest",
                component = "grouper",
                op = "fuzzy_work",
                artist_id = artist.id,
                work_count = count,
                budget = self.config.max_works_for_fuzzy,
                "Fuzzy budget exceeded, skipping"
            );
            return Ok(None);
        }

        let works = self
            .catalog
            .works_for_artist(artist.id, self.config.max_works_for_fuzzy)
            .await?;

        let mut best: Option<(f32, Work)> = None;
        for work in works {
            let score = similarity(normalized_title, &work.normalized_title);
            if score < self.config.work_fuzzy_threshold {
                continue;
            }
            let better = match &best {
                None => true,
                Some((best_score, best_work)) => {
                    score > *best_score || (score == *best_score && work.id < best_work.id)
                }
            };
            if better {
                best = Some((score, work));
            }
        }

        Ok(best.map(|(_, work)| work))
    }

    /// Exact lookup by (work, normalized title, version), else create.
    async fn resolve_recording(
        &self,
        work: &Work,
        title: &str,
        version: VersionType,
        duration_secs: Option<i32>,
    ) -> Result<(Recording, bool)> {
        let normalized = normalize(title);

        if let Some(recording) = self
            .catalog
            .recording_by_title_version(work.id, &normalized, version)
            .await?
        {
            return Ok((recording, false));
        }

        match self
            .catalog
            .insert_recording(CreateRecordingRequest {
                work_id: work.id,
                title: title.to_string(),
                version_type: version,
                duration_secs,
                external_id: None,
            })
            .await
        {
            Ok(recording) => Ok((recording, true)),
            Err(e) if e.is_conflict() => {
                let recording = self
                    .catalog
                    .recording_by_title_version(work.id, &normalized, version)
                    .await?
                    .ok_or_else(|| {
                        Error::Internal(format!(
                            "recording conflict but no row found: {normalized}"
                        ))
                    })?;
                Ok((recording, false))
            }
            Err(e) => Err(e),
        }
    }
}
