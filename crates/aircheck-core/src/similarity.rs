//! Token-set similarity scoring between normalized strings.
//!
//! The scorer is order-insensitive ("bowie david" vs "david bowie" score
//! 1.0) and tolerant of partial overlap, which is what broadcast-log
//! transcriptions need. Inputs are expected to already be normalized; the
//! scorer itself does no canonicalization.

use std::collections::BTreeSet;

use strsim::normalized_levenshtein;

/// Compute a bounded similarity score between two normalized strings.
///
/// Token-set ratio: both strings are split into whitespace tokens, the
/// shared-token core and each side's remainder are recombined, and the
/// best normalized Levenshtein ratio among the three pairings wins. A
/// fully shared token set scores 1.0 regardless of token order.
///
/// Properties: deterministic, symmetric, `similarity(x, x) == 1.0`,
/// result always in `[0.0, 1.0]`.
pub fn similarity(a: &str, b: &str) -> f32 {
    if a == b {
        return 1.0;
    }

    let tokens_a: BTreeSet<&str> = a.split_whitespace().collect();
    let tokens_b: BTreeSet<&str> = b.split_whitespace().collect();

    if tokens_a.is_empty() && tokens_b.is_empty() {
        return 1.0;
    }
    if tokens_a.is_empty() || tokens_b.is_empty() {
        return 0.0;
    }

    let shared: Vec<&str> = tokens_a.intersection(&tokens_b).copied().collect();
    let only_a: Vec<&str> = tokens_a.difference(&tokens_b).copied().collect();
    let only_b: Vec<&str> = tokens_b.difference(&tokens_a).copied().collect();

    let core = shared.join(" ");
    let combined_a = join_parts(&shared, &only_a);
    let combined_b = join_parts(&shared, &only_b);

    let ratio = normalized_levenshtein(&core, &combined_a)
        .max(normalized_levenshtein(&core, &combined_b))
        .max(normalized_levenshtein(&combined_a, &combined_b));

    (ratio as f32).clamp(0.0, 1.0)
}

fn join_parts(shared: &[&str], rest: &[&str]) -> String {
    let mut parts: Vec<&str> = Vec::with_capacity(shared.len() + rest.len());
    parts.extend_from_slice(shared);
    parts.extend_from_slice(rest);
    parts.join(" ")
}
