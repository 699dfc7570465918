//! Broadcast-log ingestion.
//!
//! Each play event is persisted first, then resolved through the
//! signature resolver; events that resolve to a recording (bridge hit or
//! auto-link) get their log rows stamped immediately. Unresolved events
//! stay stampable: a later bridge confirmation backfills them.

use std::sync::Arc;

use tracing::warn;

use aircheck_core::{BroadcastLog, Error, LogEvent, LogRepository, Resolution, Result, Signature};
use aircheck_match::SignatureResolver;

/// Outcome of ingesting one play event.
#[derive(Debug, Clone)]
pub struct IngestOutcome {
    pub log: BroadcastLog,
    pub resolution: Resolution,
}

/// Summary of one ingest batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestSummary {
    pub ingested: usize,
    pub auto_linked: usize,
    pub queued_for_review: usize,
    pub rejected: usize,
}

/// Ingests broadcast-log events and resolves them against the catalog.
pub struct LogIngestor {
    logs: Arc<dyn LogRepository>,
    resolver: Arc<SignatureResolver>,
}

impl LogIngestor {
    /// Create an ingestor over the given log store and resolver.
    pub fn new(logs: Arc<dyn LogRepository>, resolver: Arc<SignatureResolver>) -> Self {
        Self { logs, resolver }
    }

    /// Ingest one play event: persist, resolve, stamp when resolved.
    pub async fn ingest(&self, event: LogEvent) -> Result<IngestOutcome> {
        let signature = Signature::new(&event.raw_artist, &event.raw_title);
        let log = self.logs.insert(event.clone(), &signature.key()).await?;

        let resolution = self
            .resolver
            .resolve_signature(&event.raw_artist, &event.raw_title)
            .await?;

        // Auto-link stamps inside the resolver; the bridge-hit fast path
        // does not, because the bridge predates this log row.
        let log = if let Some(recording_id) = resolution.recording_id {
            self.logs.stamp_matches(&signature.key(), recording_id).await?;
            BroadcastLog {
                recording_id: Some(recording_id),
                ..log
            }
        } else {
            log
        };

        Ok(IngestOutcome { log, resolution })
    }

    /// Ingest a batch of events, isolating per-event resolution noise.
    /// Storage failures abort the batch.
    pub async fn ingest_batch<I>(&self, events: I) -> Result<IngestSummary>
    where
        I: IntoIterator<Item = LogEvent>,
    {
        let mut summary = IngestSummary::default();
        for event in events {
            match self.ingest(event).await {
                Ok(outcome) => {
                    summary.ingested += 1;
                    match outcome.resolution.decision {
                        aircheck_core::Decision::AutoLink => summary.auto_linked += 1,
                        aircheck_core::Decision::NeedsReview => summary.queued_for_review += 1,
                        aircheck_core::Decision::Reject => summary.rejected += 1,
                    }
                }
                Err(e @ Error::StorageUnavailable(_)) => return Err(e),
                Err(e) => {
                    warn!(
                        subsystem = "ingest",
                        component = "ingestor",
                        op = "ingest_batch",
                        error = %e,
                        "Skipping unresolvable log event"
                    );
                }
            }
        }
        Ok(summary)
    }
}
