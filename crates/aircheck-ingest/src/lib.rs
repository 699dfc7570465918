//! # aircheck-ingest
//!
//! Ingestion workers for aircheck: the scan-time catalog grouper that
//! folds observed (artist, title, version) triples into canonical
//! Artist → Work → Recording rows, the scan runner that drains a scan
//! source through it, and the broadcast-log ingestor that persists play
//! events and resolves them against the catalog.
//!
//! Multiple workers may run concurrently against the same catalog; the
//! grouper's conflict-retry discipline (attempt insert, catch the
//! uniqueness violation, re-read the winner) is the correctness
//! mechanism, not locking.

pub mod grouper;
pub mod ingestor;
pub mod scan;

pub use grouper::{CatalogGrouper, GroupedTrack, GrouperConfig};
pub use ingestor::{IngestOutcome, IngestSummary, LogIngestor};
pub use scan::{ScanRunner, ScanSummary};
