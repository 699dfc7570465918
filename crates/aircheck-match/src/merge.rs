//! Candidate merge and deduplication.
//!
//! Strategies run independently and may surface the same recording;
//! the merge folds all per-strategy lists by recording id, keeping the
//! best scores and the union of contributing strategies, then ranks the
//! result deterministically.

use std::collections::HashMap;

use aircheck_core::Candidate;

/// Merge per-strategy candidate lists into one ranked list.
///
/// When a recording appears in multiple lists the maximum confidence
/// (and per-part scores) win and every contributing strategy is
/// recorded for the explain trail. Sorted by confidence descending,
/// ties broken by lower recording id (older catalog entries first).
pub fn merge_candidates(lists: Vec<Vec<Candidate>>) -> Vec<Candidate> {
    let mut merged: HashMap<i64, Candidate> = HashMap::new();

    for candidate in lists.into_iter().flatten() {
        match merged.get_mut(&candidate.recording_id) {
            None => {
                merged.insert(candidate.recording_id, candidate);
            }
            Some(existing) => {
                existing.artist_score = existing.artist_score.max(candidate.artist_score);
                existing.title_score = existing.title_score.max(candidate.title_score);
                existing.confidence = existing.confidence.max(candidate.confidence);
                for strategy in candidate.strategies {
                    if !existing.strategies.contains(&strategy) {
                        existing.strategies.push(strategy);
                    }
                }
            }
        }
    }

    let mut result: Vec<Candidate> = merged.into_values().collect();
    result.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.recording_id.cmp(&b.recording_id))
    });
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use aircheck_core::{MatchStrategy, VersionType};

    fn candidate(recording_id: i64, confidence: f32, strategy: MatchStrategy) -> Candidate {
        Candidate {
            recording_id,
            title: format!("title {recording_id}"),
            artist_name: "artist".to_string(),
            version_type: VersionType::Studio,
            artist_score: confidence,
            title_score: confidence,
            confidence,
            strategies: vec![strategy],
        }
    }

    #[test]
    fn test_dedupes_by_recording_id_keeping_max() {
        let merged = merge_candidates(vec![
            vec![candidate(1, 0.7, MatchStrategy::Fuzzy)],
            vec![candidate(1, 0.9, MatchStrategy::Vector)],
        ]);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].confidence, 0.9);
        assert_eq!(
            merged[0].strategies,
            vec![MatchStrategy::Fuzzy, MatchStrategy::Vector]
        );
    }

    #[test]
    fn test_sorted_by_confidence_desc() {
        let merged = merge_candidates(vec![vec![
            candidate(1, 0.5, MatchStrategy::Exact),
            candidate(2, 0.9, MatchStrategy::Exact),
            candidate(3, 0.7, MatchStrategy::Exact),
        ]]);
        let ids: Vec<i64> = merged.iter().map(|c| c.recording_id).collect();
        assert_eq!(ids, vec![2, 3, 1]);
    }

    #[test]
    fn test_ties_break_to_lower_id() {
        let merged = merge_candidates(vec![vec![
            candidate(9, 0.8, MatchStrategy::Exact),
            candidate(3, 0.8, MatchStrategy::Fuzzy),
        ]]);
        assert_eq!(merged[0].recording_id, 3);
        assert_eq!(merged[1].recording_id, 9);
    }

    #[test]
    fn test_duplicate_strategy_not_repeated() {
        let merged = merge_candidates(vec![
            vec![candidate(1, 0.8, MatchStrategy::Exact)],
            vec![candidate(1, 0.6, MatchStrategy::Exact)],
        ]);
        assert_eq!(merged[0].strategies, vec![MatchStrategy::Exact]);
    }

    #[test]
    fn test_empty_input() {
        assert!(merge_candidates(vec![]).is_empty());
        assert!(merge_candidates(vec![vec![], vec![]]).is_empty());
    }
}
