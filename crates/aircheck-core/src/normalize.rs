//! Deterministic text canonicalization.
//!
//! Every comparison in the engine — exact lookups, fuzzy scoring, bridge
//! keys, discovery aggregation — goes through [`normalize`] first, so raw
//! broadcast-log spellings ("LIMP BIZKIT ", "Bowie, David") and scanned
//! file tags land in the same key space.
//!
//! The function is pure and idempotent: `normalize(normalize(x)) ==
//! normalize(x)` holds for every input, which makes it safe to call on
//! already-normalized values without tracking provenance.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Apostrophes and their typographic variants are removed outright so
/// "don't" and "dont" collide.
static APOSTROPHES: Lazy<Regex> = Lazy::new(|| Regex::new(r"['\u{2018}\u{2019}`´]").unwrap());

/// Abbreviations expanded before punctuation stripping, while the dot or
/// slash that marks them is still present.
static FEATURING: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(?:feat|ft)\.").unwrap());
static WITH: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bw/").unwrap());

/// Punctuation deemed non-distinguishing; replaced by a space so token
/// boundaries survive ("once-bitten" -> "once bitten").
static PUNCTUATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"[.,;:!?"“”()\[\]{}/\\|_\-\u{2013}\u{2014}*+#%]"#).unwrap());

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Canonicalize free text for comparison and keying.
///
/// Lowercases, removes apostrophes, folds `&` to "and", expands a fixed
/// set of abbreviations (`feat.`, `ft.`, `w/`), strips non-distinguishing
/// punctuation, collapses whitespace runs, and trims.
pub fn normalize(text: &str) -> String {
    let lower = text.to_lowercase();
    let s = APOSTROPHES.replace_all(&lower, "");
    let s = s.replace('&', " and ");
    let s = FEATURING.replace_all(&s, "featuring ");
    let s = WITH.replace_all(&s, "with ");
    let s = PUNCTUATION.replace_all(&s, " ");
    let s = WHITESPACE.replace_all(&s, " ");
    s.trim().to_string()
}

/// Separator used to join the artist and title halves of a signature key.
/// Unit separator: cannot appear in normalized text, so keys never collide
/// across the field boundary.
const KEY_SEPARATOR: char = '\u{1f}';

/// A normalized (artist, title) pair — the dedup/lookup key for raw
/// broadcast-log entries.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Signature {
    /// Normalized artist text.
    pub artist: String,
    /// Normalized title text.
    pub title: String,
}

impl Signature {
    /// Build a signature from raw artist/title strings.
    pub fn new(raw_artist: &str, raw_title: &str) -> Self {
        Self {
            artist: normalize(raw_artist),
            title: normalize(raw_title),
        }
    }

    /// The canonical storage key for this signature.
    pub fn key(&self) -> String {
        format!("{}{}{}", self.artist, KEY_SEPARATOR, self.title)
    }

    /// Rebuild a signature from a storage key produced by [`Signature::key`].
    pub fn from_key(key: &str) -> Option<Self> {
        let (artist, title) = key.split_once(KEY_SEPARATOR)?;
        Some(Self {
            artist: artist.to_string(),
            title: title.to_string(),
        })
    }

    /// Whether either half is empty after normalization.
    pub fn is_blank(&self) -> bool {
        self.artist.is_empty() || self.title.is_empty()
    }
}

impl std::fmt::Display for Signature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} / {}", self.artist, self.title)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lowercases_and_trims() {
        assert_eq!(normalize("  LIMP BIZKIT "), "limp bizkit");
    }

    #[test]
    fn test_collapses_whitespace() {
        assert_eq!(normalize("Once  Bitten\tTwice   Shy"), "once bitten twice shy");
    }

    #[test]
    fn test_strips_punctuation() {
        assert_eq!(normalize("Once Bitten, Twice Shy"), "once bitten twice shy");
        assert_eq!(normalize("(What's the Story) Morning Glory?"), "whats the story morning glory");
    }

    #[test]
    fn test_apostrophes_removed_not_spaced() {
        assert_eq!(normalize("Don't Stop"), "dont stop");
    }

    #[test]
    fn test_ampersand_becomes_and() {
        assert_eq!(normalize("Rock & Roll"), "rock and roll");
    }

    #[test]
    fn test_expands_featuring() {
        assert_eq!(normalize("Song feat. Someone"), "song featuring someone");
        assert_eq!(normalize("Song Ft. Someone"), "song featuring someone");
        assert_eq!(normalize("Song w/ Someone"), "song with someone");
    }

    #[test]
    fn test_featuring_expansion_does_not_rewrite_featuring() {
        assert_eq!(normalize("Song featuring Someone"), "song featuring someone");
    }

    #[test]
    fn test_idempotent() {
        let inputs = [
            "  LIMP BIZKIT ",
            "Once Bitten, Twice Shy",
            "Rock & Roll feat. Nobody",
            "Bowie, David",
            "w/ friends — live!",
            "",
            "   ",
            "AC/DC",
        ];
        for input in inputs {
            let once = normalize(input);
            assert_eq!(normalize(&once), once, "not idempotent for {input:?}");
        }
    }

    #[test]
    fn test_signature_trailing_space_equivalence() {
        let a = Signature::new("LIMP BIZKIT ", "Break Stuff");
        let b = Signature::new("LIMP BIZKIT", "Break Stuff");
        assert_eq!(a, b);
        assert_eq!(a.key(), b.key());
    }

    #[test]
    fn test_signature_key_roundtrip() {
        let sig = Signature::new("Great White", "Once Bitten Twice Shy");
        let back = Signature::from_key(&sig.key()).unwrap();
        assert_eq!(sig, back);
    }

    #[test]
    fn test_blank_signature() {
        assert!(Signature::new("", "title").is_blank());
        assert!(Signature::new("...", "title").is_blank());
        assert!(!Signature::new("a", "b").is_blank());
    }
}
