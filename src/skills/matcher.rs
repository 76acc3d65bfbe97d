//! Pairwise skill equivalence with graduated fuzzy matching

use crate::skills::normalizer::SkillNormalizer;
use serde::{Deserialize, Serialize};
use strsim::levenshtein;

/// Default edit-distance similarity a fuzzy match must exceed
pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.85;

/// Tokens must be longer than this to count towards a token overlap.
const MIN_SHARED_TOKEN_LEN: usize = 2;

/// Both strings must be longer than this for the edit-distance step.
const MIN_EDIT_DISTANCE_LEN: usize = 4;

/// Which rule decided that two skills are the same.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    Exact,
    Substring,
    TokenOverlap,
    EditDistance,
}

/// Decides whether two skill strings denote the same skill.
///
/// Rules are tried in order and the first hit wins:
/// 1. exact equality after normalization
/// 2. substring containment in either direction (fuzzy only)
/// 3. a shared token longer than two characters (fuzzy only)
/// 4. Levenshtein similarity above the threshold when both are longer than four characters (fuzzy only)
///
/// Fuzzy mode favours recall: "java" and "javascript" match through rule 2.
#[derive(Debug, Clone)]
pub struct SkillMatcher {
    normalizer: SkillNormalizer,
    similarity_threshold: f64,
}

impl SkillMatcher {
    pub fn new(normalizer: SkillNormalizer) -> Self {
        Self {
            normalizer,
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
        }
    }

    /// Set edit-distance similarity threshold (0.0 to 1.0)
    pub fn with_similarity_threshold(mut self, threshold: f64) -> Self {
        self.similarity_threshold = threshold.clamp(0.0, 1.0);
        self
    }

    pub fn similarity_threshold(&self) -> f64 {
        self.similarity_threshold
    }

    pub fn normalizer(&self) -> &SkillNormalizer {
        &self.normalizer
    }

    pub fn matches(&self, a: &str, b: &str, fuzzy: bool) -> bool {
        self.match_kind(a, b, fuzzy).is_some()
    }

    /// Like `matches`, but reports which rule fired.
    pub fn match_kind(&self, a: &str, b: &str, fuzzy: bool) -> Option<MatchKind> {
        let a = self.normalizer.normalize(a);
        let b = self.normalizer.normalize(b);

        if a.is_empty() || b.is_empty() {
            return None;
        }

        if a == b {
            return Some(MatchKind::Exact);
        }

        if !fuzzy {
            return None;
        }

        if a.contains(b.as_str()) || b.contains(a.as_str()) {
            return Some(MatchKind::Substring);
        }

        if shares_token(&a, &b) {
            return Some(MatchKind::TokenOverlap);
        }

        let (len_a, len_b) = (a.chars().count(), b.chars().count());
        if len_a > MIN_EDIT_DISTANCE_LEN
            && len_b > MIN_EDIT_DISTANCE_LEN
            && similarity(&a, &b) > self.similarity_threshold
        {
            return Some(MatchKind::EditDistance);
        }

        None
    }
}

/// Normalized Levenshtein similarity: `(max_len - distance) / max_len`
pub fn similarity(a: &str, b: &str) -> f64 {
    let max_len = a.chars().count().max(b.chars().count());
    if max_len == 0 {
        return 1.0;
    }
    let distance = levenshtein(a, b);
    (max_len - distance) as f64 / max_len as f64
}

fn tokens(s: &str) -> impl Iterator<Item = &str> {
    s.split(|c: char| c.is_whitespace() || c == '-' || c == '.')
        .filter(|t| t.chars().count() > MIN_SHARED_TOKEN_LEN)
}

fn shares_token(a: &str, b: &str) -> bool {
    let b_tokens: Vec<&str> = tokens(b).collect();
    tokens(a).any(|t| b_tokens.contains(&t))
}
