//! Job requirements split into must-have and nice-to-have skills

use crate::skills::extractor::SkillHit;
use crate::skills::normalizer::SkillNormalizer;
use crate::skills::sections::{
    detect_sections, first_cue_position, last_cue_position, section_at, sentence_bounds,
};
use crate::skills::SkillSet;
use serde::{Deserialize, Serialize};

const MUST_HAVE_CUES: &[&str] = &[
    "required",
    "requirements",
    "requirement",
    "must have",
    "must-have",
    "essential",
    "mandatory",
    "minimum qualifications",
    "basic qualifications",
];

const NICE_TO_HAVE_CUES: &[&str] = &[
    "preferred",
    "nice to have",
    "nice-to-have",
    "bonus",
    "a plus",
    "desirable",
    "good to have",
    "optional",
];

/// Fraction of the extraction-ordered skill list defaulting to must-have
pub const DEFAULT_MUST_HAVE_RATIO: f64 = 0.7;

/// Canonical job requirement shape. The two sets are always disjoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobRequirement {
    must_have: SkillSet,
    nice_to_have: SkillSet,
}

impl JobRequirement {
    /// A skill listed in both sets is kept only as must-have.
    pub fn new(must_have: SkillSet, nice_to_have: SkillSet) -> Self {
        let nice_to_have = nice_to_have.difference(&must_have);
        Self {
            must_have,
            nice_to_have,
        }
    }

    pub fn must_have(&self) -> &SkillSet {
        &self.must_have
    }

    pub fn nice_to_have(&self) -> &SkillSet {
        &self.nice_to_have
    }

    pub fn all_skills(&self) -> SkillSet {
        self.must_have.union(&self.nice_to_have)
    }

    pub fn is_empty(&self) -> bool {
        self.must_have.is_empty() && self.nice_to_have.is_empty()
    }

    /// Adapt any accepted upstream shape, normalizing every skill.
    pub fn from_raw(raw: RawJobRequirement, normalizer: &SkillNormalizer) -> Self {
        match raw {
            RawJobRequirement::Categorized {
                must_have,
                nice_to_have,
            } => Self::new(
                normalizer.normalize_all(must_have),
                normalizer.normalize_all(nice_to_have),
            ),
            RawJobRequirement::Uncategorized(skills) => {
                // no text to look for cues in, so only the position rule applies
                let ordered: Vec<String> = skills
                    .iter()
                    .map(|s| normalizer.normalize(s))
                    .filter(|s| !s.is_empty())
                    .collect();
                RequirementCategorizer::default().categorize_by_position(&ordered)
            }
        }
    }
}

/// Job requirement shapes accepted at the boundary.
///
/// Accepts `{"mustHave": [...], "niceToHave": [...]}`,
/// `{"must_have_skills": [...], "good_to_have_skills": [...]}` or a plain list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawJobRequirement {
    Categorized {
        #[serde(
            rename = "must_have",
            alias = "mustHave",
            alias = "must_have_skills",
            default
        )]
        must_have: Vec<String>,
        #[serde(
            rename = "nice_to_have",
            alias = "niceToHave",
            alias = "good_to_have_skills",
            alias = "nice_to_have_skills",
            default
        )]
        nice_to_have: Vec<String>,
    },
    Uncategorized(Vec<String>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Priority {
    MustHave,
    NiceToHave,
}

/// Heuristic must-have / nice-to-have split for skills found in a posting.
///
/// For each mention, the nearest cue in the same sentence decides, then the
/// heading of the enclosing section. Skills without any cue fall back to
/// their rank: the first `must_have_ratio` of the list is must-have. This is
/// an ordering proxy, not a semantic classifier.
#[derive(Debug, Clone)]
pub struct RequirementCategorizer {
    must_have_ratio: f64,
}

impl Default for RequirementCategorizer {
    fn default() -> Self {
        Self {
            must_have_ratio: DEFAULT_MUST_HAVE_RATIO,
        }
    }
}

impl RequirementCategorizer {
    pub fn new(must_have_ratio: f64) -> Self {
        Self {
            must_have_ratio: must_have_ratio.clamp(0.0, 1.0),
        }
    }

    /// Categorize skills found in `text`, given in order of first mention.
    pub fn categorize(&self, text: &str, mentions: &[SkillHit]) -> JobRequirement {
        let sections = detect_sections(text);
        let total = mentions.len();
        let mut must_have = SkillSet::new();
        let mut nice_to_have = SkillSet::new();

        for (index, hit) in mentions.iter().enumerate() {
            let cued: Vec<Priority> = hit
                .positions
                .iter()
                .filter_map(|&pos| {
                    self.sentence_priority(text, pos).or_else(|| {
                        section_at(&sections, pos).and_then(|section| {
                            if section.title_has_any(NICE_TO_HAVE_CUES) {
                                Some(Priority::NiceToHave)
                            } else if section.title_has_any(MUST_HAVE_CUES) {
                                Some(Priority::MustHave)
                            } else {
                                None
                            }
                        })
                    })
                })
                .collect();

            let priority = if cued.contains(&Priority::MustHave) {
                Priority::MustHave
            } else if cued.contains(&Priority::NiceToHave) {
                Priority::NiceToHave
            } else {
                self.positional_priority(index, total)
            };

            match priority {
                Priority::MustHave => must_have.insert(hit.skill.clone()),
                Priority::NiceToHave => nice_to_have.insert(hit.skill.clone()),
            };
        }

        log::debug!(
            "Categorized {} must-have and {} nice-to-have skills",
            must_have.len(),
            nice_to_have.len()
        );

        JobRequirement::new(must_have, nice_to_have)
    }

    /// Split purely by rank in the list.
    pub fn categorize_by_position(&self, ordered: &[String]) -> JobRequirement {
        let mut must_have = SkillSet::new();
        let mut nice_to_have = SkillSet::new();

        for (index, skill) in ordered.iter().enumerate() {
            match self.positional_priority(index, ordered.len()) {
                Priority::MustHave => must_have.insert(skill.clone()),
                Priority::NiceToHave => nice_to_have.insert(skill.clone()),
            };
        }

        JobRequirement::new(must_have, nice_to_have)
    }

    fn positional_priority(&self, index: usize, total: usize) -> Priority {
        if (index as f64) < self.must_have_ratio * total as f64 {
            Priority::MustHave
        } else {
            Priority::NiceToHave
        }
    }

    /// Cue nearest to the mention within its sentence: the last one before it,
    /// otherwise the first one after it.
    fn sentence_priority(&self, text: &str, position: usize) -> Option<Priority> {
        let (start, end) = sentence_bounds(text, position);
        let before = text[start..position].to_lowercase();
        let after = text[position..end].to_lowercase();

        let must_before = last_cue_position(&before, MUST_HAVE_CUES);
        let nice_before = last_cue_position(&before, NICE_TO_HAVE_CUES);
        match (must_before, nice_before) {
            (Some(m), Some(n)) => {
                return Some(if m > n {
                    Priority::MustHave
                } else {
                    Priority::NiceToHave
                })
            }
            (Some(_), None) => return Some(Priority::MustHave),
            (None, Some(_)) => return Some(Priority::NiceToHave),
            (None, None) => {}
        }

        match (
            first_cue_position(&after, MUST_HAVE_CUES),
            first_cue_position(&after, NICE_TO_HAVE_CUES),
        ) {
            (Some(m), Some(n)) => Some(if m < n {
                Priority::MustHave
            } else {
                Priority::NiceToHave
            }),
            (Some(_), None) => Some(Priority::MustHave),
            (None, Some(_)) => Some(Priority::NiceToHave),
            (None, None) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::skills::vocabulary::SkillVocabulary;
    use std::sync::Arc;

    fn normalizer() -> SkillNormalizer {
        SkillNormalizer::new(Arc::new(SkillVocabulary::builtin()))
    }

    fn mentions(text: &str, skills: &[&str]) -> Vec<SkillHit> {
        let lower = text.to_lowercase();
        skills
            .iter()
            .map(|s| SkillHit {
                skill: s.to_string(),
                positions: lower.match_indices(s).map(|(i, _)| i).collect(),
            })
            .collect()
    }

    #[test]
    fn test_new_keeps_sets_disjoint() {
        let req = JobRequirement::new(
            ["rust", "docker"].into_iter().collect(),
            ["docker", "kafka"].into_iter().collect(),
        );
        assert!(req.must_have().contains("docker"));
        assert!(!req.nice_to_have().contains("docker"));
        assert_eq!(req.all_skills().len(), 3);
    }

    #[test]
    fn test_adapter_accepts_both_shapes() {
        let camel: RawJobRequirement =
            serde_json::from_str(r#"{"mustHave": ["JS"], "niceToHave": ["K8s"]}"#).unwrap();
        let snake: RawJobRequirement = serde_json::from_str(
            r#"{"must_have_skills": ["javascript"], "good_to_have_skills": ["kubernetes"]}"#,
        )
        .unwrap();

        let n = normalizer();
        let a = JobRequirement::from_raw(camel, &n);
        let b = JobRequirement::from_raw(snake, &n);
        assert_eq!(a, b);
        assert!(a.must_have().contains("javascript"));
        assert!(a.nice_to_have().contains("kubernetes"));
    }

    #[test]
    fn test_adapter_plain_list_uses_position() {
        let raw: RawJobRequirement =
            serde_json::from_str(r#"["rust", "go", "docker", "kafka"]"#).unwrap();
        let req = JobRequirement::from_raw(raw, &normalizer());
        // 0.7 * 4 = 2.8 -> first three are must-have
        assert_eq!(req.must_have().len(), 3);
        assert!(req.nice_to_have().contains("kafka"));
    }

    #[test]
    fn test_sentence_cues() {
        let text = "Required: Java, Spring Boot, SQL. Preferred: Kubernetes, Kafka experience a plus.";
        let req = RequirementCategorizer::default()
            .categorize(text, &mentions(text, &["java", "sql", "kubernetes", "kafka"]));

        assert!(req.must_have().contains("java"));
        assert!(req.must_have().contains("sql"));
        assert!(req.nice_to_have().contains("kubernetes"));
        assert!(req.nice_to_have().contains("kafka"));
    }

    #[test]
    fn test_cue_after_mention() {
        let text = "Rust is required. Kafka would be a bonus.";
        let req = RequirementCategorizer::default()
            .categorize(text, &mentions(text, &["rust", "kafka"]));
        assert!(req.must_have().contains("rust"));
        assert!(req.nice_to_have().contains("kafka"));
    }

    #[test]
    fn test_section_heading_cues() {
        let text = "Requirements:\n- Rust\n- PostgreSQL\n\nNice to have:\n- Kafka\n";
        let req = RequirementCategorizer::default()
            .categorize(text, &mentions(text, &["rust", "postgresql", "kafka"]));
        assert!(req.must_have().contains("rust"));
        assert!(req.must_have().contains("postgresql"));
        assert!(req.nice_to_have().contains("kafka"));
    }

    #[test]
    fn test_positional_fallback() {
        let text = "We use rust, go, docker, redis, kafka, react, vue, sass, jest and nginx daily";
        let skills = [
            "rust", "go", "docker", "redis", "kafka", "react", "vue", "sass", "jest", "nginx",
        ];
        let req = RequirementCategorizer::default().categorize(text, &mentions(text, &skills));
        assert_eq!(req.must_have().len(), 7);
        assert_eq!(req.nice_to_have().len(), 3);
        assert!(req.nice_to_have().contains("nginx"));
    }

    #[test]
    fn test_empty_input() {
        let req = RequirementCategorizer::default().categorize("", &[]);
        assert!(req.is_empty());
    }
}
