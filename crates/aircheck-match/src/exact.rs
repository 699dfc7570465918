//! Exact-pattern match strategy.
//!
//! Substring/pattern search against catalog recording titles, work
//! titles, and artist names. Exact normalized equality scores 1.0;
//! substring containment scores slightly lower so a full match always
//! outranks a partial one.

use aircheck_core::{
    defaults, Candidate, CatalogRepository, MatchStrategy, Result, Signature,
};

/// Score one side of the signature against a catalog field: equality
/// beats containment.
fn part_score(query: &str, field: &str) -> f32 {
    if query == field {
        1.0
    } else {
        defaults::SUBSTRING_SCORE
    }
}

/// Run the exact strategy for a signature.
pub async fn search_exact(
    catalog: &dyn CatalogRepository,
    signature: &Signature,
    limit: i64,
) -> Result<Vec<Candidate>> {
    let hits = catalog
        .search_recordings(&signature.artist, &signature.title, limit)
        .await?;

    Ok(hits
        .iter()
        .map(|ctx| {
            let artist_score = part_score(&signature.artist, &ctx.normalized_artist);
            let title_score = part_score(&signature.title, &ctx.normalized_title);
            Candidate::new(ctx, artist_score, title_score, MatchStrategy::Exact)
        })
        .collect())
}
