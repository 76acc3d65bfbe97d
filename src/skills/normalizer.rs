//! Skill token canonicalization

use crate::skills::vocabulary::SkillVocabulary;
use crate::skills::SkillSet;
use std::sync::Arc;

/// Canonicalizes raw skill strings: trim, case-fold, alias substitution.
#[derive(Debug, Clone)]
pub struct SkillNormalizer {
    vocabulary: Arc<SkillVocabulary>,
    case_sensitive: bool,
}

impl SkillNormalizer {
    pub fn new(vocabulary: Arc<SkillVocabulary>) -> Self {
        Self {
            vocabulary,
            case_sensitive: false,
        }
    }

    /// Keep the caller's casing (aliases still only resolve on an exact key hit).
    pub fn case_sensitive(mut self, enabled: bool) -> Self {
        self.case_sensitive = enabled;
        self
    }

    pub fn vocabulary(&self) -> &Arc<SkillVocabulary> {
        &self.vocabulary
    }

    /// Canonical form of a raw skill token.
    ///
    /// Empty or whitespace-only input yields an empty string; callers filter
    /// those out before building a `SkillSet`.
    pub fn normalize(&self, raw: &str) -> String {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return String::new();
        }

        let token = if self.case_sensitive {
            trimmed.to_string()
        } else {
            trimmed.to_lowercase()
        };

        match self.vocabulary.resolve_alias(&token) {
            Some(canonical) => canonical.to_string(),
            None => token,
        }
    }

    /// Normalize a batch of raw tokens into a set, dropping empties.
    pub fn normalize_all<I, S>(&self, raw: I) -> SkillSet
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        raw.into_iter()
            .map(|s| self.normalize(s.as_ref()))
            .filter(|s| !s.is_empty())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normalizer() -> SkillNormalizer {
        SkillNormalizer::new(Arc::new(SkillVocabulary::builtin()))
    }

    #[test]
    fn test_normalize_aliases() {
        let n = normalizer();
        assert_eq!(n.normalize("JS"), "javascript");
        assert_eq!(n.normalize("  K8s "), "kubernetes");
        assert_eq!(n.normalize("React.js"), "react");
        assert_eq!(n.normalize("ReactJS"), "react");
        assert_eq!(n.normalize("Docker"), "docker");
    }

    #[test]
    fn test_normalize_empty_input() {
        let n = normalizer();
        assert_eq!(n.normalize(""), "");
        assert_eq!(n.normalize("   \t"), "");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let n = normalizer();
        let samples = [
            "JS", "ReactJS", "react.js", "  Golang", "k8s", "Postgres", "C++", "Node",
            "something unknown", "", "Machine Learning", "CI CD",
        ];
        for s in samples {
            let once = n.normalize(s);
            assert_eq!(n.normalize(&once), once, "not idempotent for {:?}", s);
        }

        let cs = normalizer().case_sensitive(true);
        for s in samples {
            let once = cs.normalize(s);
            assert_eq!(cs.normalize(&once), once, "not idempotent for {:?}", s);
        }
    }

    #[test]
    fn test_case_sensitive_mode() {
        let n = normalizer().case_sensitive(true);
        assert_eq!(n.normalize("Docker"), "Docker");
        assert_eq!(n.normalize("js"), "javascript");
        assert_eq!(n.normalize("JS"), "JS");
    }

    #[test]
    fn test_normalize_all_filters_empties() {
        let set = normalizer().normalize_all(["JS", "", "ReactJS", "javascript", "  "]);
        assert_eq!(set.len(), 2);
        assert!(set.contains("javascript"));
        assert!(set.contains("react"));
    }
}
