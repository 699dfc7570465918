//! Signature resolution facade.
//!
//! The single entry point the HTTP/UI layer consumes: ties together the
//! bridge store (with its in-process cache), the candidate matcher, the
//! decision policy, and the discovery queue. Decision side effects:
//!
//! - auto-link: create/confirm an identity bridge and backfill logs
//! - needs-review: enqueue into the discovery queue with the suggestion
//! - reject: enqueue into the discovery queue without a suggestion
//!
//! "No match found" is a normal outcome (decision = reject), never an
//! error.

use std::sync::Arc;

use tracing::{debug, info};

use aircheck_core::{
    defaults, BridgeRepository, CatalogRepository, CreateBridgeRequest, Decision, DiscoveryEntry,
    DiscoveryFilter, DiscoveryRepository, Error, IdentityBridge, ImpactReport, LogRepository,
    MatchTrace, Resolution, Result, Signature, SimSample, ThresholdOverrides, VectorIndex,
};

use crate::cache::BridgeCache;
use crate::matcher::{CandidateMatcher, MatcherConfig};
use crate::policy::{simulate, DecisionPolicy};

/// Configuration for the resolver facade.
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// Matcher tuning.
    pub matcher: MatcherConfig,
    /// Capacity of the in-process bridge cache (0 disables).
    pub cache_capacity: usize,
    /// Default sample size for threshold simulation.
    pub sample_size: i64,
    /// Default page size for listings.
    pub list_limit: i64,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            matcher: MatcherConfig::default(),
            cache_capacity: defaults::BRIDGE_CACHE_CAPACITY,
            sample_size: defaults::SIMULATION_SAMPLE,
            list_limit: defaults::PAGE_LIMIT,
        }
    }
}

/// Resolution service tying bridge store, matcher, policy, and
/// discovery queue together.
pub struct SignatureResolver {
    bridges: Arc<dyn BridgeRepository>,
    discovery: Arc<dyn DiscoveryRepository>,
    logs: Arc<dyn LogRepository>,
    catalog: Arc<dyn CatalogRepository>,
    matcher: CandidateMatcher,
    policy: DecisionPolicy,
    cache: BridgeCache,
    config: ResolverConfig,
}

impl SignatureResolver {
    /// Create a resolver over the given repositories. Pass `None` for
    /// the vector index to resolve with exact+fuzzy only.
    pub fn new(
        catalog: Arc<dyn CatalogRepository>,
        bridges: Arc<dyn BridgeRepository>,
        discovery: Arc<dyn DiscoveryRepository>,
        logs: Arc<dyn LogRepository>,
        index: Option<Arc<dyn VectorIndex>>,
        policy: DecisionPolicy,
        config: ResolverConfig,
    ) -> Self {
        let matcher = CandidateMatcher::new(
            catalog.clone(),
            bridges.clone(),
            index,
            config.matcher.clone(),
        );
        let cache = BridgeCache::new(config.cache_capacity);
        Self {
            bridges,
            discovery,
            logs,
            catalog,
            matcher,
            policy,
            cache,
            config,
        }
    }

    /// Resolve one raw (artist, title) signature.
    pub async fn resolve_signature(&self, raw_artist: &str, raw_title: &str) -> Result<Resolution> {
        let signature = Signature::new(raw_artist, raw_title);
        let key = signature.key();

        if signature.is_blank() {
            // Nothing to match against; not worth a discovery entry either.
            return Ok(Resolution {
                signature,
                recording_id: None,
                confidence: 0.0,
                decision: Decision::Reject,
                strategy: None,
                trace: MatchTrace::default(),
            });
        }

        if let Some(recording_id) = self.cache.get(&key) {
            return Ok(Resolution {
                signature,
                recording_id: Some(recording_id),
                confidence: 1.0,
                decision: Decision::AutoLink,
                strategy: None,
                trace: MatchTrace {
                    bridge_hit: true,
                    ..Default::default()
                },
            });
        }

        let outcome = self.matcher.match_signature(&signature).await?;

        if let Some(recording_id) = outcome.bridged {
            self.cache.put(&key, recording_id);
            return Ok(Resolution {
                signature,
                recording_id: Some(recording_id),
                confidence: 1.0,
                decision: Decision::AutoLink,
                strategy: None,
                trace: outcome.trace,
            });
        }

        let Some(top) = outcome.top().cloned() else {
            self.discovery
                .record_unmatched(&key, raw_artist, raw_title, None)
                .await?;
            return Ok(Resolution {
                signature,
                recording_id: None,
                confidence: 0.0,
                decision: Decision::Reject,
                strategy: None,
                trace: outcome.trace,
            });
        };

        let decision = self.policy.classify_candidate(&top);
        let strategy = top.strategies.first().copied();

        debug!(
            subsystem = "match",
            component = "resolver",
            op = "resolve",
            signature = %signature,
            recording_id = top.recording_id,
            confidence = top.confidence,
            decision = decision.as_str(),
            "Classified top candidate"
        );

        let recording_id = match decision {
            Decision::AutoLink => {
                let linked = self
                    .auto_link(&key, raw_artist, raw_title, top.recording_id)
                    .await?;
                Some(linked)
            }
            Decision::NeedsReview => {
                self.discovery
                    .record_unmatched(&key, raw_artist, raw_title, Some(top.recording_id))
                    .await?;
                None
            }
            Decision::Reject => {
                self.discovery
                    .record_unmatched(&key, raw_artist, raw_title, None)
                    .await?;
                None
            }
        };

        Ok(Resolution {
            signature,
            recording_id,
            confidence: top.confidence,
            decision,
            strategy,
            trace: outcome.trace,
        })
    }

    /// Write the bridge for an auto-linked match. A concurrent writer
    /// beating us to it is fine: the conflict is the "already bridged"
    /// signal and the winner's mapping is accepted.
    async fn auto_link(
        &self,
        key: &str,
        raw_artist: &str,
        raw_title: &str,
        recording_id: i64,
    ) -> Result<i64> {
        let created = self
            .bridges
            .create(CreateBridgeRequest {
                signature: key.to_string(),
                raw_artist: raw_artist.to_string(),
                raw_title: raw_title.to_string(),
                recording_id,
            })
            .await;

        let linked = match created {
            Ok(bridge) => {
                info!(
                    subsystem = "match",
                    component = "resolver",
                    op = "auto_link",
                    bridge_id = bridge.id,
                    recording_id = bridge.recording_id,
                    "Bridge created"
                );
                bridge.recording_id
            }
            Err(e) if e.is_conflict() => {
                let existing = self.bridges.lookup(key).await?.ok_or_else(|| {
                    Error::Internal("bridge conflict but no active bridge found".to_string())
                })?;
                existing.recording_id
            }
            Err(e) => return Err(e),
        };

        self.logs.stamp_matches(key, linked).await?;
        self.cache.put(key, linked);
        Ok(linked)
    }

    /// Replay thresholds over a sample of unresolved signatures.
    ///
    /// Read-only: candidates are scored through the (read-only) matcher
    /// and classified by the pure simulation; no bridge or discovery
    /// entry is written.
    pub async fn simulate_thresholds(
        &self,
        sample_size: Option<i64>,
        overrides: ThresholdOverrides,
    ) -> Result<ImpactReport> {
        let n = sample_size.unwrap_or(self.config.sample_size);
        let entries = self.discovery.sample_unresolved(n).await?;

        let mut samples = Vec::with_capacity(entries.len());
        for entry in entries {
            let signature = Signature::from_key(&entry.signature)
                .unwrap_or_else(|| Signature::new(&entry.raw_artist, &entry.raw_title));
            let outcome = self.matcher.match_signature(&signature).await?;
            let (artist_score, title_score) = if outcome.bridged.is_some() {
                (1.0, 1.0)
            } else {
                outcome
                    .top()
                    .map(|c| (c.artist_score, c.title_score))
                    .unwrap_or((0.0, 0.0))
            };
            samples.push(SimSample {
                signature: entry.signature,
                artist_score,
                title_score,
            });
        }

        let thresholds = self.policy.thresholds().with_overrides(overrides);
        // Re-validate: overrides may have inverted a pair.
        DecisionPolicy::new(thresholds)?;

        Ok(simulate(&samples, thresholds, defaults::EDGE_CASE_MARGIN))
    }

    /// Resolve a discovery entry to a recording: marks it resolved,
    /// creates/confirms the identity bridge, and backfills already-
    /// ingested broadcast logs with the recording id.
    pub async fn resolve_discovery_entry(
        &self,
        signature: &str,
        recording_id: i64,
    ) -> Result<DiscoveryEntry> {
        let entry = self
            .discovery
            .get(signature)
            .await?
            .ok_or_else(|| Error::NotFound(format!("discovery entry: {signature}")))?;

        // Validate the target before writing anything.
        self.catalog.recording(recording_id).await?;

        let created = self
            .bridges
            .create(CreateBridgeRequest {
                signature: signature.to_string(),
                raw_artist: entry.raw_artist.clone(),
                raw_title: entry.raw_title.clone(),
                recording_id,
            })
            .await;

        match created {
            Ok(_) => {}
            Err(e) if e.is_conflict() => {
                // An active bridge to the same recording is a confirm;
                // to a different recording it is a genuine conflict the
                // reviewer must see.
                let existing = self.bridges.lookup(signature).await?.ok_or_else(|| {
                    Error::Internal("bridge conflict but no active bridge found".to_string())
                })?;
                if existing.recording_id != recording_id {
                    return Err(e);
                }
            }
            Err(e) => return Err(e),
        }

        let resolved = self.discovery.resolve(signature, recording_id).await?;
        let stamped = self.logs.stamp_matches(signature, recording_id).await?;
        self.cache.put(signature, recording_id);

        info!(
            subsystem = "match",
            component = "resolver",
            op = "resolve_discovery_entry",
            signature = signature,
            recording_id = recording_id,
            stamped_logs = stamped,
            "Discovery entry resolved"
        );

        Ok(resolved)
    }

    /// Revoke a bridge (soft-delete, idempotent) and drop it from the
    /// lookup cache.
    pub async fn revoke_bridge(&self, bridge_id: i64) -> Result<IdentityBridge> {
        let bridge = self.bridges.revoke(bridge_id).await?;
        self.cache.invalidate(&bridge.signature);
        Ok(bridge)
    }

    /// List identity bridges.
    pub async fn list_bridges(
        &self,
        search: Option<&str>,
        include_revoked: bool,
        limit: Option<i64>,
        offset: i64,
    ) -> Result<Vec<IdentityBridge>> {
        self.bridges
            .list(
                search,
                include_revoked,
                limit.unwrap_or(self.config.list_limit),
                offset,
            )
            .await
    }

    /// List the discovery queue.
    pub async fn list_discovery_queue(
        &self,
        filter: DiscoveryFilter,
        limit: Option<i64>,
        offset: i64,
    ) -> Result<Vec<DiscoveryEntry>> {
        self.discovery
            .list(filter, limit.unwrap_or(self.config.list_limit), offset)
            .await
    }
}
