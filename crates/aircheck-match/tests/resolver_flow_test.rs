//! End-to-end resolution flow tests over the in-memory repositories.

use std::sync::Arc;

use aircheck_core::memory::{MemoryBridges, MemoryCatalog, MemoryDiscovery, MemoryLogs};
use aircheck_core::{
    BridgeRepository, CatalogRepository, CreateArtistRequest, CreateRecordingRequest,
    CreateWorkRequest, Decision, DiscoveryFilter, DiscoveryRepository, LogEvent, LogRepository,
    Signature, ThresholdOverrides, ThresholdSet, VectorIndex, VersionType,
};
use aircheck_index::MockVectorIndex;
use aircheck_match::{DecisionPolicy, ResolverConfig, SignatureResolver};
use chrono::Utc;

struct Fixture {
    catalog: MemoryCatalog,
    bridges: MemoryBridges,
    discovery: MemoryDiscovery,
    logs: MemoryLogs,
}

impl Fixture {
    fn new() -> Self {
        Self {
            catalog: MemoryCatalog::new(),
            bridges: MemoryBridges::new(),
            discovery: MemoryDiscovery::new(),
            logs: MemoryLogs::new(),
        }
    }

    /// Thresholds used across these tests: {auto: 0.85, review: 0.70}
    /// for both the artist and title pairs.
    fn policy() -> DecisionPolicy {
        DecisionPolicy::new(ThresholdSet {
            artist_auto: 0.85,
            artist_review: 0.70,
            title_auto: 0.85,
            title_review: 0.70,
        })
        .unwrap()
    }

    fn resolver(&self, index: Option<Arc<dyn VectorIndex>>) -> SignatureResolver {
        self.resolver_with_config(index, ResolverConfig::default())
    }

    fn resolver_with_config(
        &self,
        index: Option<Arc<dyn VectorIndex>>,
        config: ResolverConfig,
    ) -> SignatureResolver {
        SignatureResolver::new(
            Arc::new(self.catalog.clone()),
            Arc::new(self.bridges.clone()),
            Arc::new(self.discovery.clone()),
            Arc::new(self.logs.clone()),
            index,
            Self::policy(),
            config,
        )
    }

    async fn seed_recording(&self, artist: &str, title: &str) -> i64 {
        let artist = match self
            .catalog
            .artist_by_normalized_name(&aircheck_core::normalize(artist))
            .await
            .unwrap()
        {
            Some(a) => a,
            None => self
                .catalog
                .insert_artist(CreateArtistRequest {
                    name: artist.to_string(),
                    external_id: None,
                    display_name: None,
                })
                .await
                .unwrap(),
        };
        let work = self
            .catalog
            .insert_work(CreateWorkRequest {
                artist_id: artist.id,
                title: title.to_string(),
                instrumental: false,
            })
            .await
            .unwrap();
        self.catalog
            .insert_recording(CreateRecordingRequest {
                work_id: work.id,
                title: title.to_string(),
                version_type: VersionType::Studio,
                duration_secs: None,
                external_id: None,
            })
            .await
            .unwrap()
            .id
    }
}

#[tokio::test]
async fn test_exact_match_auto_links_and_bridges() {
    let fx = Fixture::new();
    let rec_id = fx.seed_recording("Great White", "Once Bitten Twice Shy").await;
    let resolver = fx.resolver(None);

    let resolution = resolver
        .resolve_signature("Great White", "Once Bitten, Twice Shy")
        .await
        .unwrap();

    assert_eq!(resolution.decision, Decision::AutoLink);
    assert_eq!(resolution.recording_id, Some(rec_id));
    assert_eq!(resolution.confidence, 1.0);

    let sig = Signature::new("Great White", "Once Bitten, Twice Shy");
    let bridge = fx.bridges.lookup(&sig.key()).await.unwrap().unwrap();
    assert_eq!(bridge.recording_id, rec_id);
}

#[tokio::test]
async fn test_trailing_space_hits_same_bridge() {
    // Scenario: "LIMP BIZKIT " and "LIMP BIZKIT" must normalize
    // identically and share one bridge.
    let fx = Fixture::new();
    let rec_id = fx.seed_recording("Limp Bizkit", "Break Stuff").await;

    // Disable the in-process cache so the second resolve demonstrably
    // goes through the bridge store, not matcher state.
    let config = ResolverConfig {
        cache_capacity: 0,
        ..Default::default()
    };
    let resolver = fx.resolver_with_config(None, config);

    let first = resolver.resolve_signature("LIMP BIZKIT ", "Break Stuff").await.unwrap();
    assert_eq!(first.decision, Decision::AutoLink);

    let second = resolver.resolve_signature("LIMP BIZKIT", "Break Stuff").await.unwrap();
    assert!(second.trace.bridge_hit);
    assert_eq!(second.recording_id, Some(rec_id));
    assert_eq!(second.confidence, 1.0);

    // One bridge, not two.
    let bridges = fx.bridges.list(None, true, 100, 0).await.unwrap();
    assert_eq!(bridges.len(), 1);
}

#[tokio::test]
async fn test_bridged_signature_never_reaches_vector_index() {
    let fx = Fixture::new();
    fx.seed_recording("Limp Bizkit", "Break Stuff").await;
    let index = MockVectorIndex::new();

    let config = ResolverConfig {
        cache_capacity: 0,
        ..Default::default()
    };
    let resolver = fx.resolver_with_config(Some(Arc::new(index.clone())), config);

    // First resolve auto-links; the sparse candidate list lets the
    // vector strategy run once.
    resolver.resolve_signature("Limp Bizkit", "Break Stuff").await.unwrap();
    let calls_after_first = index.call_count();

    // Bridged now: repeat resolutions must not consult the index again.
    for _ in 0..3 {
        let r = resolver.resolve_signature("Limp Bizkit", "Break Stuff").await.unwrap();
        assert!(r.trace.bridge_hit);
    }
    assert_eq!(index.call_count(), calls_after_first);
}

#[tokio::test]
async fn test_mid_confidence_goes_to_review_with_suggestion() {
    // Scenario: a candidate in the [review, auto) band classifies as
    // needs-review and lands in the discovery queue, without a bridge.
    let fx = Fixture::new();
    let rec_id = fx.seed_recording("Great White", "Once Bitten Twice Shy").await;
    let resolver = fx.resolver(None);

    // Misspelled artist: fuzzy scores it between the review and auto bars.
    let resolution = resolver
        .resolve_signature("Grate Whyte", "Once Bitten Twice Shy")
        .await
        .unwrap();

    assert_eq!(resolution.decision, Decision::NeedsReview);
    assert_eq!(resolution.recording_id, None);
    assert!(resolution.confidence >= 0.70 && resolution.confidence < 0.85);

    let sig = Signature::new("Grate Whyte", "Once Bitten Twice Shy");
    assert!(fx.bridges.lookup(&sig.key()).await.unwrap().is_none());

    let entries = fx.discovery.list(DiscoveryFilter::Unresolved, 50, 0).await.unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].suggested_recording_id, Some(rec_id));
    assert_eq!(entries[0].occurrence_count, 1);
}

#[tokio::test]
async fn test_unmatched_signature_aggregates_occurrences() {
    // Scenario: the same unmatched signature from 3 separate log events
    // aggregates into one discovery entry with occurrence count 3.
    let fx = Fixture::new();
    fx.seed_recording("Great White", "Once Bitten Twice Shy").await;
    let resolver = fx.resolver(None);

    for _ in 0..3 {
        let r = resolver.resolve_signature("Zzyzx", "Qwerty Uiop").await.unwrap();
        assert_eq!(r.decision, Decision::Reject);
        assert_eq!(r.recording_id, None);
    }

    let entries = fx.discovery.list(DiscoveryFilter::Unresolved, 50, 0).await.unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].occurrence_count, 3);
    assert_eq!(entries[0].suggested_recording_id, None);
}

#[tokio::test]
async fn test_resolve_discovery_entry_bridges_and_backfills() {
    let fx = Fixture::new();
    let rec_id = fx.seed_recording("Great White", "Once Bitten Twice Shy").await;
    let resolver = fx.resolver(None);

    // Three log events ingested unresolved.
    let sig = Signature::new("G. White", "Once Bitten");
    for _ in 0..3 {
        fx.logs
            .insert(
                LogEvent {
                    raw_artist: "G. White".to_string(),
                    raw_title: "Once Bitten".to_string(),
                    station_id: "kexp".to_string(),
                    played_at_utc: Utc::now(),
                },
                &sig.key(),
            )
            .await
            .unwrap();
        fx.discovery
            .record_unmatched(&sig.key(), "G. White", "Once Bitten", None)
            .await
            .unwrap();
    }
    assert_eq!(fx.logs.unresolved_count().await.unwrap(), 3);

    let entry = resolver.resolve_discovery_entry(&sig.key(), rec_id).await.unwrap();
    assert!(entry.resolved);
    assert_eq!(entry.suggested_recording_id, Some(rec_id));

    // Bridge exists, logs are backfilled, listing no longer shows it.
    assert!(fx.bridges.lookup(&sig.key()).await.unwrap().is_some());
    assert_eq!(fx.logs.unresolved_count().await.unwrap(), 0);
    let unresolved = fx.discovery.list(DiscoveryFilter::Unresolved, 50, 0).await.unwrap();
    assert!(unresolved.is_empty());
}

#[tokio::test]
async fn test_resolve_discovery_entry_conflicting_bridge_surfaces() {
    let fx = Fixture::new();
    let rec_a = fx.seed_recording("Great White", "Once Bitten Twice Shy").await;
    let rec_b = fx.seed_recording("Great White", "Rock Me").await;
    let resolver = fx.resolver(None);

    let sig = Signature::new("G White", "OBTS");
    fx.discovery
        .record_unmatched(&sig.key(), "G White", "OBTS", None)
        .await
        .unwrap();

    resolver.resolve_discovery_entry(&sig.key(), rec_a).await.unwrap();

    // Confirming the same mapping again is fine...
    fx.discovery
        .record_unmatched(&sig.key(), "G White", "OBTS", None)
        .await
        .unwrap();
    resolver.resolve_discovery_entry(&sig.key(), rec_a).await.unwrap();

    // ...but mapping the bridged signature to a different recording is a
    // user-visible conflict.
    let err = resolver
        .resolve_discovery_entry(&sig.key(), rec_b)
        .await
        .unwrap_err();
    assert!(err.is_conflict());
}

#[tokio::test]
async fn test_revocation_is_soft_and_reopens_resolution() {
    let fx = Fixture::new();
    fx.seed_recording("Limp Bizkit", "Break Stuff").await;
    let config = ResolverConfig {
        cache_capacity: 0,
        ..Default::default()
    };
    let resolver = fx.resolver_with_config(None, config);

    resolver.resolve_signature("Limp Bizkit", "Break Stuff").await.unwrap();
    let sig = Signature::new("Limp Bizkit", "Break Stuff");
    let bridge = fx.bridges.lookup(&sig.key()).await.unwrap().unwrap();

    let revoked = resolver.revoke_bridge(bridge.id).await.unwrap();
    assert!(revoked.revoked);

    // Lookup misses, but the record survives for audit.
    assert!(fx.bridges.lookup(&sig.key()).await.unwrap().is_none());
    let all = resolver.list_bridges(None, true, None, 0).await.unwrap();
    assert!(all.iter().any(|b| b.id == bridge.id && b.revoked));
    let active = resolver.list_bridges(None, false, None, 0).await.unwrap();
    assert!(!active.iter().any(|b| b.id == bridge.id));

    // Revoking again is a no-op success.
    resolver.revoke_bridge(bridge.id).await.unwrap();
}

#[tokio::test]
async fn test_cached_bridge_is_invalidated_on_revoke() {
    let fx = Fixture::new();
    fx.seed_recording("Limp Bizkit", "Break Stuff").await;
    let resolver = fx.resolver(None);

    resolver.resolve_signature("Limp Bizkit", "Break Stuff").await.unwrap();
    // Warm the cache.
    let cached = resolver.resolve_signature("Limp Bizkit", "Break Stuff").await.unwrap();
    assert!(cached.trace.bridge_hit);

    let sig = Signature::new("Limp Bizkit", "Break Stuff");
    let bridge = fx.bridges.lookup(&sig.key()).await.unwrap().unwrap();
    resolver.revoke_bridge(bridge.id).await.unwrap();

    // Post-revocation the signature resolves fresh (auto-links again via
    // exact match rather than returning the stale cached bridge).
    let fresh = resolver.resolve_signature("Limp Bizkit", "Break Stuff").await.unwrap();
    assert!(!fresh.trace.bridge_hit);
}

#[tokio::test]
async fn test_simulation_mutates_nothing() {
    let fx = Fixture::new();
    fx.seed_recording("Great White", "Once Bitten Twice Shy").await;
    let resolver = fx.resolver(None);

    // Build a backlog: one reviewable, one hopeless.
    resolver.resolve_signature("Grate Whyte", "Once Bitten Twice Shy").await.unwrap();
    resolver.resolve_signature("Zzyzx", "Qwerty Uiop").await.unwrap();

    let entries_before = fx.discovery.list(DiscoveryFilter::All, 50, 0).await.unwrap();
    let bridges_before = fx.bridges.list(None, true, 100, 0).await.unwrap().len();

    let report = resolver
        .simulate_thresholds(Some(10), ThresholdOverrides::default())
        .await
        .unwrap();

    assert_eq!(report.sample_size, 2);
    assert_eq!(
        report.auto_link_count + report.needs_review_count + report.reject_count,
        2
    );
    assert!(report.needs_review_count >= 1);

    // No writes: same entries, same occurrence counts, same bridges.
    let entries_after = fx.discovery.list(DiscoveryFilter::All, 50, 0).await.unwrap();
    assert_eq!(entries_before.len(), entries_after.len());
    for before in &entries_before {
        let after = entries_after
            .iter()
            .find(|e| e.signature == before.signature)
            .unwrap();
        assert_eq!(before.occurrence_count, after.occurrence_count);
    }
    assert_eq!(fx.bridges.list(None, true, 100, 0).await.unwrap().len(), bridges_before);
}

#[tokio::test]
async fn test_simulation_with_inverted_overrides_fails() {
    let fx = Fixture::new();
    let resolver = fx.resolver(None);

    let err = resolver
        .simulate_thresholds(
            Some(10),
            ThresholdOverrides {
                artist_auto: Some(0.5),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, aircheck_core::Error::InvalidInput(_)));
}

#[tokio::test]
async fn test_blank_signature_rejects_without_queue_entry() {
    let fx = Fixture::new();
    let resolver = fx.resolver(None);

    let resolution = resolver.resolve_signature("   ", "...").await.unwrap();
    assert_eq!(resolution.decision, Decision::Reject);
    assert_eq!(fx.discovery.entry_count(), 0);
}
