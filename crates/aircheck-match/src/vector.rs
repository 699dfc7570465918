//! Vector-semantic match strategy.
//!
//! Queries the external embedding index with the signature text and maps
//! returned (external id, distance) pairs back to catalog recordings.
//! Hits beyond the distance cutoff are discarded; external ids the
//! catalog does not know are silently dropped.
//!
//! Index failures and timeouts surface as `Error::SearchDegraded` from
//! the index client; the matcher catches them and records the
//! degradation instead of failing the match.

use std::collections::HashMap;

use aircheck_core::{
    Candidate, CatalogRepository, MatchStrategy, Result, Signature, VectorIndex,
};

/// Map an index distance to a confidence score in [0, 1].
///
/// Linear ramp: distance 0 is confidence 1.0, the cutoff is 0.0. Keeps
/// vector confidences comparable to the other strategies without
/// pretending to more precision than the index gives us.
pub fn distance_to_confidence(distance: f32, max_distance: f32) -> f32 {
    if max_distance <= 0.0 {
        return 0.0;
    }
    (1.0 - distance / max_distance).clamp(0.0, 1.0)
}

/// Run the vector-semantic strategy for a signature.
pub async fn search_vector(
    index: &dyn VectorIndex,
    catalog: &dyn CatalogRepository,
    signature: &Signature,
    k: usize,
    max_distance: f32,
) -> Result<Vec<Candidate>> {
    let query = format!("{} {}", signature.artist, signature.title);
    let hits = index.search(&query, k).await?;

    let in_range: Vec<_> = hits
        .into_iter()
        .filter(|h| h.distance <= max_distance)
        .collect();
    if in_range.is_empty() {
        return Ok(Vec::new());
    }

    let distances: HashMap<String, f32> = in_range
        .iter()
        .map(|h| (h.external_id.clone(), h.distance))
        .collect();
    let external_ids: Vec<String> = distances.keys().cloned().collect();

    let mapped = catalog.recordings_by_external_ids(&external_ids).await?;

    Ok(mapped
        .into_iter()
        .map(|(ext, ctx)| {
            let confidence = distance_to_confidence(distances[&ext], max_distance);
            Candidate::new(&ctx, confidence, confidence, MatchStrategy::Vector)
        })
        .collect())
}
