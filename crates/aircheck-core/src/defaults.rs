//! Centralized default constants for the aircheck system.
//!
//! **This module is the single source of truth** for all shared default
//! values. All crates should reference these constants instead of
//! defining their own magic numbers.
//!
//! Organized by domain area. When adding new constants, place them in the
//! appropriate section and document the rationale for the chosen value.

// =============================================================================
// CATALOG GROUPING
// =============================================================================

/// Maximum existing works per artist considered for fuzzy matching.
///
/// The fuzzy comparator is an O(n) scan over the artist's catalog; above
/// this budget the scan is skipped entirely and an exact-miss creates a
/// new work. Bounds worst-case scan latency for very prolific artists.
pub const MAX_WORKS_FOR_FUZZY: i64 = 500;

/// Minimum similarity for folding a scanned title into an existing work.
pub const WORK_FUZZY_THRESHOLD: f32 = 0.85;

// =============================================================================
// CANDIDATE MATCHING
// =============================================================================

/// Minimum candidate count before the next (more expensive) strategy runs.
pub const MIN_MATCH_RESULTS: usize = 5;

/// Floor similarity for fuzzy-strategy candidates.
pub const FUZZY_FLOOR: f32 = 0.60;

/// Confidence assigned to substring (non-equal) containment hits.
pub const SUBSTRING_SCORE: f32 = 0.9;

/// Maximum candidates fetched per strategy before merge.
pub const STRATEGY_POOL_LIMIT: i64 = 50;

/// Bounded global pool size for the fuzzy strategy when the same-artist
/// pool comes up short.
pub const FUZZY_GLOBAL_POOL: i64 = 200;

// =============================================================================
// VECTOR INDEX
// =============================================================================

/// Cosine-distance cutoff beyond which vector hits are discarded.
pub const VECTOR_MAX_DISTANCE: f32 = 0.45;

/// Number of neighbours requested from the vector index.
pub const VECTOR_SEARCH_K: usize = 10;

/// Timeout for a vector index query in seconds. Timeout degrades the
/// match (strategy skipped), it never fails the whole resolution.
pub const VECTOR_TIMEOUT_SECS: u64 = 5;

/// Default vector index endpoint.
pub const VECTOR_INDEX_URL: &str = "http://127.0.0.1:7700";

// =============================================================================
// DECISION POLICY
// =============================================================================

/// Artist-score threshold at or above which a match auto-links.
pub const ARTIST_AUTO_THRESHOLD: f32 = 0.90;

/// Artist-score threshold at or above which a match is reviewable.
pub const ARTIST_REVIEW_THRESHOLD: f32 = 0.75;

/// Title-score threshold at or above which a match auto-links.
pub const TITLE_AUTO_THRESHOLD: f32 = 0.85;

/// Title-score threshold at or above which a match is reviewable.
pub const TITLE_REVIEW_THRESHOLD: f32 = 0.70;

/// Default sample size for threshold impact simulation.
pub const SIMULATION_SAMPLE: i64 = 100;

/// Samples scoring within this margin of a threshold are flagged as edge
/// cases in the impact report.
pub const EDGE_CASE_MARGIN: f32 = 0.05;

// =============================================================================
// RESOLVER
// =============================================================================

/// Capacity of the in-process bridge lookup cache (entries).
pub const BRIDGE_CACHE_CAPACITY: usize = 1024;

// =============================================================================
// DATABASE
// =============================================================================

/// Default maximum number of connections in the pool.
pub const DB_MAX_CONNECTIONS: u32 = 10;

/// Default connection acquire timeout in seconds.
pub const DB_CONNECT_TIMEOUT_SECS: u64 = 30;

/// Default idle connection timeout in seconds.
pub const DB_IDLE_TIMEOUT_SECS: u64 = 600;

// =============================================================================
// LISTING
// =============================================================================

/// Default page size for bridge and discovery queue listings.
pub const PAGE_LIMIT: i64 = 50;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thresholds_ordered() {
        assert!(ARTIST_AUTO_THRESHOLD >= ARTIST_REVIEW_THRESHOLD);
        assert!(TITLE_AUTO_THRESHOLD >= TITLE_REVIEW_THRESHOLD);
        assert!(WORK_FUZZY_THRESHOLD > FUZZY_FLOOR);
    }

    #[test]
    fn test_budget_positive() {
        assert!(MAX_WORKS_FOR_FUZZY > 0);
        assert!(MIN_MATCH_RESULTS > 0);
    }
}
