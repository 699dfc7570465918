//! Fuzzy match strategy.
//!
//! Runs the similarity scorer over a candidate pool — recordings by the
//! same artist first, widening to a bounded global pool only when the
//! same-artist pool comes up short — and keeps candidates whose combined
//! score clears the floor threshold.

use aircheck_core::{
    similarity, Candidate, CatalogRepository, MatchStrategy, RecordingWithContext, Result,
    Signature,
};

/// Score a pool of recordings against the signature, keeping candidates
/// at or above `floor`.
fn score_pool(pool: &[RecordingWithContext], signature: &Signature, floor: f32) -> Vec<Candidate> {
    let mut candidates: Vec<Candidate> = pool
        .iter()
        .map(|ctx| {
            let artist_score = similarity(&signature.artist, &ctx.normalized_artist);
            let title_score = similarity(&signature.title, &ctx.normalized_title);
            Candidate::new(ctx, artist_score, title_score, MatchStrategy::Fuzzy)
        })
        .filter(|c| c.confidence >= floor)
        .collect();
    candidates.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.recording_id.cmp(&b.recording_id))
    });
    candidates
}

/// Run the fuzzy strategy for a signature.
///
/// `min_results` controls when the global pool is consulted; the merge
/// step downstream dedupes any overlap between the two pools.
pub async fn search_fuzzy(
    catalog: &dyn CatalogRepository,
    signature: &Signature,
    floor: f32,
    min_results: usize,
    artist_pool_limit: i64,
    global_pool_limit: i64,
) -> Result<Vec<Candidate>> {
    let artist_pool = catalog
        .recordings_for_artist(&signature.artist, artist_pool_limit)
        .await?;
    let mut candidates = score_pool(&artist_pool, signature, floor);

    if candidates.len() < min_results {
        let global_pool = catalog.recordings_pool(global_pool_limit).await?;
        candidates.extend(score_pool(&global_pool, signature, floor));
    }

    Ok(candidates)
}
