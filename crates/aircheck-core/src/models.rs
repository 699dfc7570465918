//! Core data models for aircheck.
//!
//! These types are shared across all aircheck crates and represent the
//! catalog entities (artist, work, recording, library file) and the
//! resolution-side entities (broadcast log, identity bridge, discovery
//! queue) plus the request/view types flowing between them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::normalize::Signature;

// =============================================================================
// CATALOG ENTITIES
// =============================================================================

/// A performing entity.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Artist {
    pub id: i64,
    pub name: String,
    /// Unique per artist; all lookups go through this.
    pub normalized_name: String,
    /// Optional MusicBrainz-style external identifier.
    pub external_id: Option<String>,
    pub display_name: Option<String>,
    pub created_at_utc: DateTime<Utc>,
}

impl Artist {
    /// Display name, falling back to the canonical name when absent.
    pub fn display(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.name)
    }
}

/// A composition, owned by one primary artist.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Work {
    pub id: i64,
    pub artist_id: i64,
    pub title: String,
    pub normalized_title: String,
    pub instrumental: bool,
    pub created_at_utc: DateTime<Utc>,
}

/// Rendition/version type of a recording.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VersionType {
    #[default]
    Studio,
    Live,
    Remix,
    Acoustic,
    Demo,
    Unknown,
}

impl VersionType {
    /// Stable storage representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Studio => "studio",
            Self::Live => "live",
            Self::Remix => "remix",
            Self::Acoustic => "acoustic",
            Self::Demo => "demo",
            Self::Unknown => "unknown",
        }
    }

    /// Parse a version hint from scanned metadata. Unrecognized hints map
    /// to [`VersionType::Unknown`], absent hints to [`VersionType::Studio`].
    pub fn from_hint(hint: Option<&str>) -> Self {
        match hint {
            None => Self::Studio,
            Some(h) => h.parse().unwrap_or(Self::Unknown),
        }
    }
}

impl std::fmt::Display for VersionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for VersionType {
    type Err = String;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "studio" | "" => Ok(Self::Studio),
            "live" => Ok(Self::Live),
            "remix" => Ok(Self::Remix),
            "acoustic" | "unplugged" => Ok(Self::Acoustic),
            "demo" => Ok(Self::Demo),
            "unknown" => Ok(Self::Unknown),
            other => Err(format!("Invalid version type: {other}")),
        }
    }
}

/// A specific rendition of a work.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recording {
    pub id: i64,
    pub work_id: i64,
    pub title: String,
    pub normalized_title: String,
    pub version_type: VersionType,
    pub duration_secs: Option<i32>,
    /// Optional external identifier; the vector index addresses
    /// recordings by this.
    pub external_id: Option<String>,
    pub created_at_utc: DateTime<Utc>,
}

/// A physical file realizing a recording.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct LibraryFile {
    pub id: i64,
    pub recording_id: i64,
    pub path: String,
    pub created_at_utc: DateTime<Utc>,
}

// =============================================================================
// RESOLUTION ENTITIES
// =============================================================================

/// One observed play event from a station.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct BroadcastLog {
    pub id: i64,
    pub raw_artist: String,
    pub raw_title: String,
    /// Normalized signature key ([`Signature::key`]).
    pub signature: String,
    /// Null until matched.
    pub recording_id: Option<i64>,
    pub station_id: String,
    pub played_at_utc: DateTime<Utc>,
    pub created_at_utc: DateTime<Utc>,
}

/// A confirmed mapping from a raw signature to a canonical recording.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct IdentityBridge {
    pub id: i64,
    pub signature: String,
    /// Raw spellings retained for display.
    pub raw_artist: String,
    pub raw_title: String,
    pub recording_id: i64,
    /// Soft-delete flag; revoked bridges are excluded from lookup but
    /// retained for audit.
    pub revoked: bool,
    pub created_at_utc: DateTime<Utc>,
    pub updated_at_utc: DateTime<Utc>,
}

/// Aggregation of broadcast logs sharing a normalized signature, pending
/// human resolution.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct DiscoveryEntry {
    pub signature: String,
    pub raw_artist: String,
    pub raw_title: String,
    pub occurrence_count: i64,
    pub suggested_recording_id: Option<i64>,
    pub resolved: bool,
    pub first_seen_utc: DateTime<Utc>,
    pub last_seen_utc: DateTime<Utc>,
}

// =============================================================================
// REQUEST TYPES
// =============================================================================

/// Request to create a new artist.
#[derive(Debug, Clone)]
pub struct CreateArtistRequest {
    pub name: String,
    pub external_id: Option<String>,
    pub display_name: Option<String>,
}

/// Request to create a new work under an artist.
#[derive(Debug, Clone)]
pub struct CreateWorkRequest {
    pub artist_id: i64,
    pub title: String,
    pub instrumental: bool,
}

/// Request to create a new recording under a work.
#[derive(Debug, Clone)]
pub struct CreateRecordingRequest {
    pub work_id: i64,
    pub title: String,
    pub version_type: VersionType,
    pub duration_secs: Option<i32>,
    pub external_id: Option<String>,
}

/// Request to create an identity bridge.
#[derive(Debug, Clone)]
pub struct CreateBridgeRequest {
    pub signature: String,
    pub raw_artist: String,
    pub raw_title: String,
    pub recording_id: i64,
}

/// One scanned-file tuple from a scan source.
#[derive(Debug, Clone)]
pub struct ScannedTrack {
    pub artist: String,
    pub title: String,
    pub version_hint: Option<String>,
    pub duration_secs: Option<i32>,
    pub path: String,
}

/// One observed play event from a log source.
#[derive(Debug, Clone)]
pub struct LogEvent {
    pub raw_artist: String,
    pub raw_title: String,
    pub station_id: String,
    pub played_at_utc: DateTime<Utc>,
}

// =============================================================================
// MATCHING TYPES
// =============================================================================

/// A recording joined with its work and artist context, as returned by
/// catalog search/pool queries. Carries the normalized fields the matcher
/// scores against.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordingWithContext {
    pub recording_id: i64,
    pub work_id: i64,
    pub artist_id: i64,
    pub title: String,
    pub normalized_title: String,
    pub version_type: VersionType,
    pub artist_name: String,
    pub normalized_artist: String,
    pub has_file: bool,
}

/// An independent method for producing match candidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchStrategy {
    Exact,
    Fuzzy,
    Vector,
}

impl std::fmt::Display for MatchStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Exact => write!(f, "exact"),
            Self::Fuzzy => write!(f, "fuzzy"),
            Self::Vector => write!(f, "vector"),
        }
    }
}

/// A ranked candidate recording for a raw signature.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candidate {
    pub recording_id: i64,
    pub title: String,
    pub artist_name: String,
    pub version_type: VersionType,
    /// Confidence that the raw artist matches this candidate's artist.
    pub artist_score: f32,
    /// Confidence that the raw title matches this candidate's title.
    pub title_score: f32,
    /// Overall confidence; the weaker of the two part scores.
    pub confidence: f32,
    /// Strategies that contributed this candidate (diagnostics/explain).
    pub strategies: Vec<MatchStrategy>,
}

impl Candidate {
    /// Build a candidate from part scores; overall confidence is the
    /// weaker of the two.
    pub fn new(
        ctx: &RecordingWithContext,
        artist_score: f32,
        title_score: f32,
        strategy: MatchStrategy,
    ) -> Self {
        Self {
            recording_id: ctx.recording_id,
            title: ctx.title.clone(),
            artist_name: ctx.artist_name.clone(),
            version_type: ctx.version_type,
            artist_score,
            title_score,
            confidence: artist_score.min(title_score),
            strategies: vec![strategy],
        }
    }
}

/// Diagnostic trail for one match operation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MatchTrace {
    /// Signature resolved from the bridge store without any search.
    pub bridge_hit: bool,
    pub strategies_run: Vec<MatchStrategy>,
    pub exact_hits: usize,
    pub fuzzy_hits: usize,
    pub vector_hits: usize,
    /// Present when the vector strategy was skipped (unreachable or
    /// timed out); reviewers can see semantic search did not run.
    pub degraded: Option<String>,
    pub duration_ms: u64,
}

// =============================================================================
// DECISION TYPES
// =============================================================================

/// Outcome bucket for a candidate match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    Reject,
    NeedsReview,
    AutoLink,
}

impl Decision {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AutoLink => "auto_link",
            Self::NeedsReview => "needs_review",
            Self::Reject => "reject",
        }
    }
}

/// Tunable threshold pairs for the decision policy.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ThresholdSet {
    pub artist_auto: f32,
    pub artist_review: f32,
    pub title_auto: f32,
    pub title_review: f32,
}

impl Default for ThresholdSet {
    fn default() -> Self {
        Self {
            artist_auto: crate::defaults::ARTIST_AUTO_THRESHOLD,
            artist_review: crate::defaults::ARTIST_REVIEW_THRESHOLD,
            title_auto: crate::defaults::TITLE_AUTO_THRESHOLD,
            title_review: crate::defaults::TITLE_REVIEW_THRESHOLD,
        }
    }
}

/// Partial threshold overrides for simulation and policy construction.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ThresholdOverrides {
    pub artist_auto: Option<f32>,
    pub artist_review: Option<f32>,
    pub title_auto: Option<f32>,
    pub title_review: Option<f32>,
}

impl ThresholdSet {
    /// Apply partial overrides, returning the merged set.
    pub fn with_overrides(self, overrides: ThresholdOverrides) -> Self {
        Self {
            artist_auto: overrides.artist_auto.unwrap_or(self.artist_auto),
            artist_review: overrides.artist_review.unwrap_or(self.artist_review),
            title_auto: overrides.title_auto.unwrap_or(self.title_auto),
            title_review: overrides.title_review.unwrap_or(self.title_review),
        }
    }
}

/// One already-scored sample fed to the threshold simulation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimSample {
    pub signature: String,
    pub artist_score: f32,
    pub title_score: f32,
}

/// A sample scoring close enough to a threshold that a small adjustment
/// would flip its bucket.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EdgeCase {
    pub signature: String,
    pub artist_score: f32,
    pub title_score: f32,
    pub decision: Decision,
    /// Distance to the nearest threshold.
    pub margin: f32,
}

/// Impact report from replaying thresholds over a sample.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImpactReport {
    pub sample_size: usize,
    pub thresholds: ThresholdSet,
    pub auto_link_count: usize,
    pub needs_review_count: usize,
    pub reject_count: usize,
    pub auto_link_pct: f32,
    pub needs_review_pct: f32,
    pub reject_pct: f32,
    pub edge_cases: Vec<EdgeCase>,
}

// =============================================================================
// RESOLUTION RESULT
// =============================================================================

/// Result of resolving one raw signature — the single value the HTTP/UI
/// layer consumes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Resolution {
    pub signature: Signature,
    pub recording_id: Option<i64>,
    pub confidence: f32,
    pub decision: Decision,
    /// Strategy that produced the winning candidate, if any.
    pub strategy: Option<MatchStrategy>,
    pub trace: MatchTrace,
}

// =============================================================================
// VECTOR INDEX TYPES
// =============================================================================

/// One hit from the vector index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorHit {
    /// External id the catalog maps back to a recording.
    pub external_id: String,
    /// Distance in the index's metric; lower is closer.
    pub distance: f32,
}

// =============================================================================
// LISTING FILTERS
// =============================================================================

/// Filter for discovery queue listings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiscoveryFilter {
    /// Only unresolved entries (the review backlog).
    #[default]
    Unresolved,
    /// Everything, resolved entries included.
    All,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_artist_display_fallback() {
        let artist = Artist {
            id: 1,
            name: "Great White".to_string(),
            normalized_name: "great white".to_string(),
            external_id: None,
            display_name: None,
            created_at_utc: Utc::now(),
        };
        assert_eq!(artist.display(), "Great White");

        let with_display = Artist {
            display_name: Some("GREAT WHITE".to_string()),
            ..artist
        };
        assert_eq!(with_display.display(), "GREAT WHITE");
    }

    #[test]
    fn test_version_type_roundtrip() {
        for vt in [
            VersionType::Studio,
            VersionType::Live,
            VersionType::Remix,
            VersionType::Acoustic,
            VersionType::Demo,
            VersionType::Unknown,
        ] {
            assert_eq!(vt.as_str().parse::<VersionType>().unwrap(), vt);
        }
    }

    #[test]
    fn test_version_type_from_hint() {
        assert_eq!(VersionType::from_hint(None), VersionType::Studio);
        assert_eq!(VersionType::from_hint(Some("Live")), VersionType::Live);
        assert_eq!(VersionType::from_hint(Some("karaoke")), VersionType::Unknown);
    }

    #[test]
    fn test_decision_ordering() {
        assert!(Decision::Reject < Decision::NeedsReview);
        assert!(Decision::NeedsReview < Decision::AutoLink);
    }

    #[test]
    fn test_threshold_overrides_merge() {
        let base = ThresholdSet::default();
        let merged = base.with_overrides(ThresholdOverrides {
            title_auto: Some(0.95),
            ..Default::default()
        });
        assert_eq!(merged.title_auto, 0.95);
        assert_eq!(merged.artist_auto, base.artist_auto);
    }
}
