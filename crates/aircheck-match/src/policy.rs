//! Confidence-threshold decision policy.
//!
//! A state-free classifier over the top candidate's part scores, plus a
//! pure threshold-impact simulation used for tuning. Neither touches
//! storage: the simulation replays thresholds over already-loaded
//! samples and never re-enters the matcher's write paths.

use aircheck_core::{
    Candidate, Decision, EdgeCase, Error, ImpactReport, Result, SimSample, ThresholdSet,
};

/// Bucket one part score against its threshold pair.
fn bucket(score: f32, auto: f32, review: f32) -> Decision {
    if score >= auto {
        Decision::AutoLink
    } else if score >= review {
        Decision::NeedsReview
    } else {
        Decision::Reject
    }
}

/// State-free decision classifier.
#[derive(Debug, Clone)]
pub struct DecisionPolicy {
    thresholds: ThresholdSet,
}

impl Default for DecisionPolicy {
    fn default() -> Self {
        Self {
            thresholds: ThresholdSet::default(),
        }
    }
}

impl DecisionPolicy {
    /// Create a policy with validated thresholds.
    pub fn new(thresholds: ThresholdSet) -> Result<Self> {
        validate_thresholds(&thresholds)?;
        Ok(Self { thresholds })
    }

    /// Create a policy from environment variables (with defaults).
    ///
    /// | Variable | Default |
    /// |----------|---------|
    /// | `AIRCHECK_ARTIST_AUTO_THRESHOLD` | `0.90` |
    /// | `AIRCHECK_ARTIST_REVIEW_THRESHOLD` | `0.75` |
    /// | `AIRCHECK_TITLE_AUTO_THRESHOLD` | `0.85` |
    /// | `AIRCHECK_TITLE_REVIEW_THRESHOLD` | `0.70` |
    pub fn from_env() -> Result<Self> {
        let base = ThresholdSet::default();
        Self::new(ThresholdSet {
            artist_auto: env_parse("AIRCHECK_ARTIST_AUTO_THRESHOLD", base.artist_auto),
            artist_review: env_parse("AIRCHECK_ARTIST_REVIEW_THRESHOLD", base.artist_review),
            title_auto: env_parse("AIRCHECK_TITLE_AUTO_THRESHOLD", base.title_auto),
            title_review: env_parse("AIRCHECK_TITLE_REVIEW_THRESHOLD", base.title_review),
        })
    }

    /// The active thresholds.
    pub fn thresholds(&self) -> ThresholdSet {
        self.thresholds
    }

    /// Classify part scores. The overall decision is the weaker of the
    /// artist bucket and the title bucket, so both halves of the
    /// signature must clear a bar for the match to reach it.
    pub fn classify(&self, artist_score: f32, title_score: f32) -> Decision {
        classify_with(&self.thresholds, artist_score, title_score)
    }

    /// Classify a candidate by its part scores.
    pub fn classify_candidate(&self, candidate: &Candidate) -> Decision {
        self.classify(candidate.artist_score, candidate.title_score)
    }
}

fn env_parse(key: &str, fallback: f32) -> f32 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(fallback)
}

fn validate_thresholds(t: &ThresholdSet) -> Result<()> {
    for (name, value) in [
        ("artist_auto", t.artist_auto),
        ("artist_review", t.artist_review),
        ("title_auto", t.title_auto),
        ("title_review", t.title_review),
    ] {
        if !(0.0..=1.0).contains(&value) {
            return Err(Error::InvalidInput(format!(
                "threshold {name} out of range: {value}"
            )));
        }
    }
    if t.artist_auto < t.artist_review {
        return Err(Error::InvalidInput(
            "artist_auto must be >= artist_review".to_string(),
        ));
    }
    if t.title_auto < t.title_review {
        return Err(Error::InvalidInput(
            "title_auto must be >= title_review".to_string(),
        ));
    }
    Ok(())
}

fn classify_with(thresholds: &ThresholdSet, artist_score: f32, title_score: f32) -> Decision {
    let artist = bucket(artist_score, thresholds.artist_auto, thresholds.artist_review);
    let title = bucket(title_score, thresholds.title_auto, thresholds.title_review);
    artist.min(title)
}

/// Replay a threshold set over a sample of scored signatures.
///
/// Pure function: computes bucket counts/percentages and flags samples
/// within `margin` of any threshold as edge cases. Mutates nothing.
pub fn simulate(samples: &[SimSample], thresholds: ThresholdSet, margin: f32) -> ImpactReport {
    let mut auto_link_count = 0usize;
    let mut needs_review_count = 0usize;
    let mut reject_count = 0usize;
    let mut edge_cases = Vec::new();

    for sample in samples {
        let decision = classify_with(&thresholds, sample.artist_score, sample.title_score);
        match decision {
            Decision::AutoLink => auto_link_count += 1,
            Decision::NeedsReview => needs_review_count += 1,
            Decision::Reject => reject_count += 1,
        }

        let nearest = [
            (sample.artist_score - thresholds.artist_auto).abs(),
            (sample.artist_score - thresholds.artist_review).abs(),
            (sample.title_score - thresholds.title_auto).abs(),
            (sample.title_score - thresholds.title_review).abs(),
        ]
        .into_iter()
        .fold(f32::INFINITY, f32::min);

        if nearest <= margin {
            edge_cases.push(EdgeCase {
                signature: sample.signature.clone(),
                artist_score: sample.artist_score,
                title_score: sample.title_score,
                decision,
                margin: nearest,
            });
        }
    }

    let total = samples.len();
    let pct = |count: usize| {
        if total == 0 {
            0.0
        } else {
            count as f32 * 100.0 / total as f32
        }
    };

    ImpactReport {
        sample_size: total,
        thresholds,
        auto_link_count,
        needs_review_count,
        reject_count,
        auto_link_pct: pct(auto_link_count),
        needs_review_pct: pct(needs_review_count),
        reject_pct: pct(reject_count),
        edge_cases,
    }
}
