//! Structured logging schema and field name constants for aircheck.
//!
//! All crates use these constants for consistent structured logging
//! fields, so log aggregation tools can query by standardized field names
//! across every subsystem.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Degraded service, requires operator attention |
//! | WARN  | Recoverable issue, automatic fallback applied |
//! | INFO  | Lifecycle events, operation completions |
//! | DEBUG | Decision points, intermediate values, config choices |
//! | TRACE | Per-item iteration, high-volume data (candidates, log lines) |

// ─── Identity fields ───────────────────────────────────────────────────────

/// Subsystem originating the log event.
/// Values: "match", "db", "index", "ingest"
pub const SUBSYSTEM: &str = "subsystem";

/// Component within a subsystem.
/// Examples: "matcher", "grouper", "resolver", "pool", "vector_index"
pub const COMPONENT: &str = "component";

/// Logical operation name.
/// Examples: "resolve", "group", "search", "record_unmatched"
pub const OPERATION: &str = "op";

// ─── Entity fields ─────────────────────────────────────────────────────────

/// Normalized signature key being resolved.
pub const SIGNATURE: &str = "signature";

/// Recording id being operated on.
pub const RECORDING_ID: &str = "recording_id";

/// Artist id being operated on.
pub const ARTIST_ID: &str = "artist_id";

/// Work id being operated on.
pub const WORK_ID: &str = "work_id";

/// Bridge id being operated on.
pub const BRIDGE_ID: &str = "bridge_id";

// ─── Measurement fields ────────────────────────────────────────────────────

/// Wall-clock duration in milliseconds.
pub const DURATION_MS: &str = "duration_ms";

/// Number of candidates returned by a strategy or the merged list.
pub const CANDIDATE_COUNT: &str = "candidate_count";

/// Top candidate confidence after merge.
pub const CONFIDENCE: &str = "confidence";

// ─── Match-specific fields ─────────────────────────────────────────────────

/// Strategy producing a candidate set ("exact", "fuzzy", "vector").
pub const STRATEGY: &str = "strategy";

/// Decision bucket ("auto_link", "needs_review", "reject").
pub const DECISION: &str = "decision";

/// Whether the vector strategy was skipped due to degradation.
pub const DEGRADED: &str = "degraded";

// ─── Database fields ───────────────────────────────────────────────────────

/// Number of active connections in the pool.
pub const POOL_SIZE: &str = "pool_size";

/// Number of idle connections in the pool.
pub const POOL_IDLE: &str = "pool_idle";

// ─── Outcome fields ────────────────────────────────────────────────────────

/// Boolean success/failure indicator.
pub const SUCCESS: &str = "success";

/// Error message when an operation fails.
pub const ERROR_MSG: &str = "error";
