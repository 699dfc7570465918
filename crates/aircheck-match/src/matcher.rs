//! The candidate matcher pipeline.
//!
//! Bridge short-circuit, then exact → fuzzy → vector, each subsequent
//! strategy running only while the candidate count stays below the
//! configured minimum. Read-only: safe to call repeatedly and
//! concurrently; a degraded vector index lowers recall but never fails
//! the match.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, warn};

use aircheck_core::{
    BridgeRepository, Candidate, CatalogRepository, MatchStrategy, MatchTrace, Result, Signature,
    VectorIndex, defaults,
};

use crate::exact::search_exact;
use crate::fuzzy::search_fuzzy;
use crate::merge::merge_candidates;
use crate::vector::search_vector;

/// Configuration for the candidate matcher.
#[derive(Debug, Clone)]
pub struct MatcherConfig {
    /// Run the next strategy while fewer candidates than this were found.
    pub min_results: usize,
    /// Floor similarity for fuzzy candidates.
    pub fuzzy_floor: f32,
    /// Per-strategy candidate fetch limit.
    pub pool_limit: i64,
    /// Global fuzzy pool size.
    pub global_pool_limit: i64,
    /// Neighbours requested from the vector index.
    pub vector_k: usize,
    /// Distance cutoff for vector hits.
    pub vector_max_distance: f32,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            min_results: defaults::MIN_MATCH_RESULTS,
            fuzzy_floor: defaults::FUZZY_FLOOR,
            pool_limit: defaults::STRATEGY_POOL_LIMIT,
            global_pool_limit: defaults::FUZZY_GLOBAL_POOL,
            vector_k: defaults::VECTOR_SEARCH_K,
            vector_max_distance: defaults::VECTOR_MAX_DISTANCE,
        }
    }
}

impl MatcherConfig {
    /// Create config from environment variables (with defaults).
    ///
    /// | Variable | Default | Description |
    /// |----------|---------|-------------|
    /// | `AIRCHECK_MIN_MATCH_RESULTS` | `5` | Strategy escalation point |
    /// | `AIRCHECK_FUZZY_FLOOR` | `0.60` | Fuzzy acceptance floor |
    /// | `AIRCHECK_VECTOR_K` | `10` | Vector neighbours requested |
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            min_results: env_parse("AIRCHECK_MIN_MATCH_RESULTS", defaults.min_results),
            fuzzy_floor: env_parse("AIRCHECK_FUZZY_FLOOR", defaults.fuzzy_floor),
            vector_k: env_parse("AIRCHECK_VECTOR_K", defaults.vector_k),
            ..defaults
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str, fallback: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(fallback)
}

/// Outcome of one match operation.
#[derive(Debug, Clone)]
pub struct MatchOutcome {
    /// Recording id resolved from the bridge store; when set, no
    /// strategies ran and `candidates` is empty.
    pub bridged: Option<i64>,
    /// Ranked candidate list (confidence descending).
    pub candidates: Vec<Candidate>,
    /// Diagnostic trail.
    pub trace: MatchTrace,
}

impl MatchOutcome {
    /// The winning candidate, if any.
    pub fn top(&self) -> Option<&Candidate> {
        self.candidates.first()
    }
}

/// Multi-strategy candidate matcher.
pub struct CandidateMatcher {
    catalog: Arc<dyn CatalogRepository>,
    bridges: Arc<dyn BridgeRepository>,
    index: Option<Arc<dyn VectorIndex>>,
    config: MatcherConfig,
}

impl CandidateMatcher {
    /// Create a matcher over the given repositories. Pass `None` for the
    /// index to run exact+fuzzy only.
    pub fn new(
        catalog: Arc<dyn CatalogRepository>,
        bridges: Arc<dyn BridgeRepository>,
        index: Option<Arc<dyn VectorIndex>>,
        config: MatcherConfig,
    ) -> Self {
        Self {
            catalog,
            bridges,
            index,
            config,
        }
    }

    /// Match a signature against the catalog.
    ///
    /// Never mutates state. A bridge hit returns immediately with
    /// `bridged` set; otherwise strategies run in order and their
    /// outputs are merged into one ranked list.
    pub async fn match_signature(&self, signature: &Signature) -> Result<MatchOutcome> {
        let start = Instant::now();
        let mut trace = MatchTrace::default();

        if let Some(bridge) = self.bridges.lookup(&signature.key()).await? {
            trace.bridge_hit = true;
            trace.duration_ms = start.elapsed().as_millis() as u64;
            debug!(
                subsystem = "match",
                component = "matcher",
                op = "match",
                signature = %signature,
                recording_id = bridge.recording_id,
                "Bridge hit, skipping search"
            );
            return Ok(MatchOutcome {
                bridged: Some(bridge.recording_id),
                candidates: Vec::new(),
                trace,
            });
        }

        let mut lists: Vec<Vec<Candidate>> = Vec::new();
        let mut found = 0usize;

        let exact = search_exact(self.catalog.as_ref(), signature, self.config.pool_limit).await?;
        trace.strategies_run.push(MatchStrategy::Exact);
        trace.exact_hits = exact.len();
        found += exact.len();
        lists.push(exact);

        if found < self.config.min_results {
            let fuzzy = search_fuzzy(
                self.catalog.as_ref(),
                signature,
                self.config.fuzzy_floor,
                self.config.min_results,
                self.config.pool_limit,
                self.config.global_pool_limit,
            )
            .await?;
            trace.strategies_run.push(MatchStrategy::Fuzzy);
            trace.fuzzy_hits = fuzzy.len();
            found += fuzzy.len();
            lists.push(fuzzy);
        }

        if found < self.config.min_results {
            if let Some(index) = &self.index {
                match search_vector(
                    index.as_ref(),
                    self.catalog.as_ref(),
                    signature,
                    self.config.vector_k,
                    self.config.vector_max_distance,
                )
                .await
                {
                    Ok(vector) => {
                        trace.strategies_run.push(MatchStrategy::Vector);
                        trace.vector_hits = vector.len();
                        lists.push(vector);
                    }
                    Err(e) if e.is_degraded() => {
                        warn!(
                            subsystem = "match",
                            component = "matcher",
                            op = "match",
                            signature = %signature,
                            error = %e,
                            "Vector strategy degraded, continuing with exact+fuzzy"
                        );
                        trace.degraded = Some(e.to_string());
                    }
                    Err(e) => return Err(e),
                }
            }
        }

        let candidates = merge_candidates(lists);
        trace.duration_ms = start.elapsed().as_millis() as u64;

        debug!(
            subsystem = "match",
            component = "matcher",
            op = "match",
            signature = %signature,
            candidate_count = candidates.len(),
            confidence = candidates.first().map(|c| c.confidence).unwrap_or(0.0),
            degraded = trace.degraded.is_some(),
            duration_ms = trace.duration_ms,
            "Match complete"
        );

        Ok(MatchOutcome {
            bridged: None,
            candidates,
            trace,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aircheck_core::memory::{MemoryBridges, MemoryCatalog};
    use aircheck_core::{
        CreateArtistRequest, CreateBridgeRequest, CreateRecordingRequest, CreateWorkRequest,
        VersionType,
    };

    async fn seed(catalog: &MemoryCatalog, artist: &str, title: &str, ext: Option<&str>) -> i64 {
        let artist = match catalog
            .artist_by_normalized_name(&aircheck_core::normalize(artist))
            .await
            .unwrap()
        {
            Some(a) => a,
            None => catalog
                .insert_artist(CreateArtistRequest {
                    name: artist.to_string(),
                    external_id: None,
                    display_name: None,
                })
                .await
                .unwrap(),
        };
        let work = catalog
            .insert_work(CreateWorkRequest {
                artist_id: artist.id,
                title: title.to_string(),
                instrumental: false,
            })
            .await
            .unwrap();
        catalog
            .insert_recording(CreateRecordingRequest {
                work_id: work.id,
                title: title.to_string(),
                version_type: VersionType::Studio,
                duration_secs: None,
                external_id: ext.map(String::from),
            })
            .await
            .unwrap()
            .id
    }

    fn matcher(
        catalog: &MemoryCatalog,
        bridges: &MemoryBridges,
        index: Option<Arc<dyn VectorIndex>>,
    ) -> CandidateMatcher {
        CandidateMatcher::new(
            Arc::new(catalog.clone()),
            Arc::new(bridges.clone()),
            index,
            MatcherConfig::default(),
        )
    }

    #[tokio::test]
    async fn test_exact_match_wins() {
        let catalog = MemoryCatalog::new();
        let bridges = MemoryBridges::new();
        let rec_id = seed(&catalog, "Great White", "Once Bitten Twice Shy", None).await;

        let outcome = matcher(&catalog, &bridges, None)
            .match_signature(&Signature::new("Great White", "Once Bitten Twice Shy"))
            .await
            .unwrap();

        assert!(outcome.bridged.is_none());
        let top = outcome.top().unwrap();
        assert_eq!(top.recording_id, rec_id);
        assert_eq!(top.confidence, 1.0);
        assert!(outcome.trace.strategies_run.contains(&MatchStrategy::Exact));
    }

    #[tokio::test]
    async fn test_bridge_short_circuits_all_strategies() {
        let catalog = MemoryCatalog::new();
        let bridges = MemoryBridges::new();
        let rec_id = seed(&catalog, "Limp Bizkit", "Break Stuff", None).await;

        let sig = Signature::new("LIMP BIZKIT ", "Break Stuff");
        bridges
            .create(CreateBridgeRequest {
                signature: sig.key(),
                raw_artist: "LIMP BIZKIT".to_string(),
                raw_title: "Break Stuff".to_string(),
                recording_id: rec_id,
            })
            .await
            .unwrap();

        let index = aircheck_index::MockVectorIndex::new();
        let outcome = matcher(&catalog, &bridges, Some(Arc::new(index.clone())))
            .match_signature(&sig)
            .await
            .unwrap();

        assert_eq!(outcome.bridged, Some(rec_id));
        assert!(outcome.trace.bridge_hit);
        assert!(outcome.trace.strategies_run.is_empty());
        // The vector index must never have been consulted.
        assert_eq!(index.call_count(), 0);
    }

    #[tokio::test]
    async fn test_vector_fallback_when_sparse() {
        let catalog = MemoryCatalog::new();
        let bridges = MemoryBridges::new();
        let rec_id = seed(&catalog, "Sigur Rós", "Hoppípolla", Some("mb-hoppipolla")).await;

        // A garbled signature neither exact nor fuzzy can reach.
        let sig = Signature::new("sr", "hopp track 4");
        let index = aircheck_index::MockVectorIndex::new()
            .with_default_hits(vec![aircheck_index::mock::hit("mb-hoppipolla", 0.2)]);

        let outcome = matcher(&catalog, &bridges, Some(Arc::new(index)))
            .match_signature(&sig)
            .await
            .unwrap();

        assert!(outcome.trace.strategies_run.contains(&MatchStrategy::Vector));
        let top = outcome.top().unwrap();
        assert_eq!(top.recording_id, rec_id);
        assert_eq!(top.strategies, vec![MatchStrategy::Vector]);
        assert!(top.confidence > 0.0);
    }

    #[tokio::test]
    async fn test_degraded_index_does_not_fail_match() {
        let catalog = MemoryCatalog::new();
        let bridges = MemoryBridges::new();
        seed(&catalog, "Great White", "Once Bitten Twice Shy", None).await;

        let index = aircheck_index::MockVectorIndex::new().with_failure();
        let outcome = matcher(&catalog, &bridges, Some(Arc::new(index)))
            .match_signature(&Signature::new("Nobody", "Nothing At All"))
            .await
            .unwrap();

        assert!(outcome.trace.degraded.is_some());
        assert!(!outcome.trace.strategies_run.contains(&MatchStrategy::Vector));
    }

    #[tokio::test]
    async fn test_strategies_skipped_when_exact_is_plentiful() {
        let catalog = MemoryCatalog::new();
        let bridges = MemoryBridges::new();
        for i in 0..6 {
            seed(&catalog, "Great White", &format!("Once Bitten Part {i}"), None).await;
        }

        let index = aircheck_index::MockVectorIndex::new();
        let outcome = matcher(&catalog, &bridges, Some(Arc::new(index.clone())))
            .match_signature(&Signature::new("Great White", "Once Bitten"))
            .await
            .unwrap();

        assert!(outcome.trace.exact_hits >= 5);
        assert_eq!(outcome.trace.strategies_run, vec![MatchStrategy::Exact]);
        assert_eq!(index.call_count(), 0);
    }
}
