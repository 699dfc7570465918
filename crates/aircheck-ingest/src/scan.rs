//! Scan runner: drains a scan source through the catalog grouper.
//!
//! The source is any finite iterator of scanned tuples (a directory
//! walk, a CSV export, a test vector). Re-running the same source is
//! idempotent: exact duplicates resolve to their existing rows. One bad
//! tuple does not abort the scan; storage failures do.

use std::time::Instant;

use tracing::{info, warn};

use aircheck_core::{Error, Result, ScannedTrack};

use crate::grouper::CatalogGrouper;

/// Summary of one scan pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanSummary {
    /// Tuples consumed from the source.
    pub scanned: usize,
    /// Tuples grouped into the catalog.
    pub grouped: usize,
    /// Tuples skipped for per-file errors (bad tags).
    pub failed: usize,
    /// New works created this pass.
    pub works_created: usize,
    /// New recordings created this pass.
    pub recordings_created: usize,
}

/// Drives scanned tuples through a [`CatalogGrouper`].
pub struct ScanRunner {
    grouper: CatalogGrouper,
}

impl ScanRunner {
    /// Create a runner over the given grouper.
    pub fn new(grouper: CatalogGrouper) -> Self {
        Self { grouper }
    }

    /// Consume a scan source to completion.
    ///
    /// Per-file failures (unusable tags) are logged and counted;
    /// `StorageUnavailable` aborts the pass and surfaces, since nothing
    /// further can be committed.
    pub async fn run<I>(&self, source: I) -> Result<ScanSummary>
    where
        I: IntoIterator<Item = ScannedTrack>,
    {
        let start = Instant::now();
        let mut summary = ScanSummary::default();

        for track in source {
            summary.scanned += 1;
            match self.grouper.group(&track).await {
                Ok(grouped) => {
                    summary.grouped += 1;
                    if grouped.created_work {
                        summary.works_created += 1;
                    }
                    if grouped.created_recording {
                        summary.recordings_created += 1;
                    }
                }
                Err(e @ Error::StorageUnavailable(_)) => {
                    warn!(
                        subsystem = "ingest",
                        component = "scan",
                        op = "run",
                        error = %e,
                        scanned = summary.scanned,
                        "Storage unavailable, aborting scan"
                    );
                    return Err(e);
                }
                Err(e) => {
                    summary.failed += 1;
                    warn!(
                        subsystem = "ingest",
                        component = "scan",
                        op = "run",
                        error = %e,
                        path = %track.path,
                        "Skipping unusable scanned tuple"
                    );
                }
            }
        }

        info!(
            subsystem = "ingest",
            component = "scan",
            op = "complete",
            scanned = summary.scanned,
            grouped = summary.grouped,
            failed = summary.failed,
            works_created = summary.works_created,
            recordings_created = summary.recordings_created,
            duration_ms = start.elapsed().as_millis() as u64,
            "Scan pass complete"
        );

        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grouper::GrouperConfig;
    use aircheck_core::memory::MemoryCatalog;
    use std::sync::Arc;

    fn track(artist: &str, title: &str, path: &str) -> ScannedTrack {
        ScannedTrack {
            artist: artist.to_string(),
            title: title.to_string(),
            version_hint: None,
            duration_secs: None,
            path: path.to_string(),
        }
    }

    fn runner(catalog: &MemoryCatalog) -> ScanRunner {
        ScanRunner::new(CatalogGrouper::new(
            Arc::new(catalog.clone()),
            GrouperConfig::default(),
        ))
    }

    #[tokio::test]
    async fn test_two_files_one_recording() {
        // Scenario: two files carrying the same (artist, title, version)
        // yield exactly one recording with two library files attached.
        let catalog = MemoryCatalog::new();
        let runner = runner(&catalog);

        let summary = runner
            .run(vec![
                track("Great White", "Once Bitten Twice Shy", "/m/rip1.flac"),
                track("Great White", "Once Bitten Twice Shy", "/m/rip2.mp3"),
            ])
            .await
            .unwrap();

        assert_eq!(summary.scanned, 2);
        assert_eq!(summary.grouped, 2);
        assert_eq!(summary.recordings_created, 1);
        assert_eq!(catalog.recording_count(), 1);
        assert_eq!(catalog.file_count(), 2);
    }

    #[tokio::test]
    async fn test_punctuation_variant_yields_one_work() {
        // Scenario: "Once Bitten Twice Shy" and "Once Bitten, Twice Shy"
        // normalize identically; one work, one recording.
        let catalog = MemoryCatalog::new();
        let runner = runner(&catalog);

        let summary = runner
            .run(vec![
                track("Great White", "Once Bitten Twice Shy", "/m/a.flac"),
                track("Great White", "Once Bitten, Twice Shy", "/m/b.flac"),
            ])
            .await
            .unwrap();

        assert_eq!(summary.works_created, 1);
        assert_eq!(catalog.work_count(), 1);
        assert_eq!(catalog.recording_count(), 1);
    }

    #[tokio::test]
    async fn test_rerun_is_idempotent() {
        let catalog = MemoryCatalog::new();
        let runner = runner(&catalog);
        let source = vec![
            track("Great White", "Once Bitten Twice Shy", "/m/a.flac"),
            track("Metallica", "Enter Sandman", "/m/b.flac"),
        ];

        runner.run(source.clone()).await.unwrap();
        let second = runner.run(source).await.unwrap();

        assert_eq!(second.works_created, 0);
        assert_eq!(second.recordings_created, 0);
        assert_eq!(catalog.work_count(), 2);
        assert_eq!(catalog.file_count(), 2);
    }

    #[tokio::test]
    async fn test_bad_tuple_is_isolated() {
        let catalog = MemoryCatalog::new();
        let runner = runner(&catalog);

        let summary = runner
            .run(vec![
                track("Great White", "Once Bitten Twice Shy", "/m/a.flac"),
                track("Someone", "   ", "/m/broken.flac"),
                track("Metallica", "Enter Sandman", "/m/c.flac"),
            ])
            .await
            .unwrap();

        assert_eq!(summary.scanned, 3);
        assert_eq!(summary.grouped, 2);
        assert_eq!(summary.failed, 1);
        assert_eq!(catalog.work_count(), 2);
    }
}
