//! Dictionary-based skill extraction from free text

use crate::error::{MatcherError, Result};
use crate::skills::normalizer::SkillNormalizer;
use crate::skills::sections::{detect_sections, sentence_bounds};
use crate::skills::vocabulary::SkillVocabulary;
use crate::skills::SkillSet;
use aho_corasick::{AhoCorasick, MatchKind as AhoMatchKind};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

/// Headings that mark a resume's skills section
const SKILLS_SECTION_CUES: &[&str] = &[
    "skills",
    "technologies",
    "tech stack",
    "competencies",
    "expertise",
    "tools",
];

/// Phrases that introduce a genuine claim of experience
const EXPERIENCE_PHRASES: &[&str] = &[
    "experience with",
    "experience in",
    "experienced in",
    "proficient in",
    "proficiency in",
    "knowledge of",
    "expertise in",
    "skilled in",
    "worked with",
    "familiar with",
    "hands-on",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionOptions {
    pub case_sensitive: bool,
    /// Enable alias, acronym, version-suffix and file-extension detection
    pub include_variations: bool,
    /// Vocabulary entries shorter than this (in characters) are ignored
    pub min_word_length: usize,
    /// Restrict the vocabulary to these categories
    pub categories: Option<Vec<String>>,
}

impl Default for ExtractionOptions {
    fn default() -> Self {
        Self {
            case_sensitive: false,
            include_variations: true,
            min_word_length: 2,
            categories: None,
        }
    }
}

/// A skill found in the text and the byte offsets of its mentions.
#[derive(Debug, Clone, PartialEq)]
pub struct SkillHit {
    pub skill: String,
    pub positions: Vec<usize>,
}

impl SkillHit {
    pub fn first_position(&self) -> usize {
        self.positions.first().copied().unwrap_or(usize::MAX)
    }
}

/// A skill with a display/ranking confidence in 0..=1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedSkill {
    pub skill: String,
    pub confidence: f32,
    pub occurrences: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Seniority {
    Intern,
    Junior,
    Mid,
    Senior,
    Lead,
    Staff,
    Principal,
}

impl std::str::FromStr for Seniority {
    type Err = MatcherError;

    /// Lenient: accepts "Senior", "sr", "mid-level", "Entry level" and so on.
    fn from_str(s: &str) -> Result<Self> {
        let exact = match s.trim().to_lowercase().as_str() {
            "intern" => Some(Seniority::Intern),
            "junior" => Some(Seniority::Junior),
            "mid" => Some(Seniority::Mid),
            "senior" => Some(Seniority::Senior),
            "lead" => Some(Seniority::Lead),
            "staff" => Some(Seniority::Staff),
            "principal" => Some(Seniority::Principal),
            _ => None,
        };
        exact
            .or_else(|| detect_seniority(s))
            .ok_or_else(|| MatcherError::InvalidInput(format!("Unknown seniority level: {}", s)))
    }
}

/// Scans text against a skills vocabulary.
pub struct DictionaryExtractor {
    vocabulary: Arc<SkillVocabulary>,
    version_regex: Regex,
    extension_regex: Regex,
}

impl DictionaryExtractor {
    pub fn new(vocabulary: Arc<SkillVocabulary>) -> Result<Self> {
        Ok(Self {
            vocabulary,
            version_regex: Regex::new(r"\b([A-Za-z][A-Za-z+#]*)\s?[vV]?\d+(?:\.\d+)*\b")?,
            extension_regex: Regex::new(r"(\*|[A-Za-z0-9_\-/]+)\.([a-z][a-z0-9]{0,4})\b")?,
        })
    }

    pub fn vocabulary(&self) -> &Arc<SkillVocabulary> {
        &self.vocabulary
    }

    /// Skills present in the text, as a sorted set.
    pub fn extract(&self, text: &str, options: &ExtractionOptions) -> Result<SkillSet> {
        Ok(self
            .scan(text, options)?
            .into_iter()
            .map(|hit| hit.skill)
            .collect())
    }

    /// Skills in order of first mention, used for position-based categorization.
    pub fn extract_ordered(&self, text: &str, options: &ExtractionOptions) -> Result<Vec<String>> {
        Ok(self
            .scan(text, options)?
            .into_iter()
            .map(|hit| hit.skill)
            .collect())
    }

    /// Skills ranked by confidence.
    ///
    /// confidence = 0.4 * min(occurrences / 3, 1)
    ///            + 0.3 if any mention follows an experience phrase in its sentence
    ///            + 0.3 if any mention sits in a skills section
    pub fn extract_with_confidence(
        &self,
        text: &str,
        options: &ExtractionOptions,
    ) -> Result<Vec<RankedSkill>> {
        let hits = self.scan(text, options)?;
        let sections = detect_sections(text);
        let skills_sections: Vec<_> = sections
            .iter()
            .filter(|s| s.title_has_any(SKILLS_SECTION_CUES))
            .collect();

        let mut ranked: Vec<RankedSkill> = hits
            .into_iter()
            .map(|hit| {
                let occurrences = hit.positions.len();
                let frequency = (occurrences as f32 / 3.0).min(1.0);

                let phrase = hit.positions.iter().any(|&pos| {
                    let (start, _) = sentence_bounds(text, pos);
                    let before = text[start..pos].to_lowercase();
                    EXPERIENCE_PHRASES.iter().any(|p| before.contains(p))
                });

                let in_skills_section = hit
                    .positions
                    .iter()
                    .any(|&pos| skills_sections.iter().any(|s| s.contains(pos)));

                let mut confidence = 0.4 * frequency;
                if phrase {
                    confidence += 0.3;
                }
                if in_skills_section {
                    confidence += 0.3;
                }

                RankedSkill {
                    skill: hit.skill,
                    confidence: confidence.clamp(0.0, 1.0),
                    occurrences,
                }
            })
            .collect();

        ranked.sort_by(|a, b| {
            b.confidence
                .total_cmp(&a.confidence)
                .then_with(|| a.skill.cmp(&b.skill))
        });

        Ok(ranked)
    }

    /// Find every vocabulary skill mentioned in the text.
    ///
    /// Single-token skills need word boundaries on both sides so "java" does
    /// not fire inside "javascript". Skills containing a space, `.`, `#` or `+`
    /// are matched as plain substrings.
    pub fn scan(&self, text: &str, options: &ExtractionOptions) -> Result<Vec<SkillHit>> {
        let active: HashSet<&str> = self
            .vocabulary
            .skills(options.categories.as_deref())
            .into_iter()
            .filter(|s| s.chars().count() >= options.min_word_length)
            .collect();

        let mut positions: BTreeMap<String, Vec<usize>> = BTreeMap::new();

        if text.trim().is_empty() || active.is_empty() {
            return Ok(Vec::new());
        }

        // (pattern, skill) pairs; a pattern maps to the first skill registered for it
        let mut patterns: Vec<(&str, &str)> = active.iter().map(|s| (*s, *s)).collect();
        patterns.sort();

        if options.include_variations {
            let variations = self
                .vocabulary
                .aliases()
                .chain(self.vocabulary.acronyms())
                .filter(|(pattern, skill)| {
                    active.contains(skill) && pattern.chars().count() >= options.min_word_length
                });
            patterns.extend(variations);
        }

        let mut seen = HashSet::new();
        patterns.retain(|(pattern, _)| seen.insert(*pattern));

        let matcher = AhoCorasick::builder()
            .ascii_case_insensitive(!options.case_sensitive)
            .match_kind(AhoMatchKind::Standard)
            .build(patterns.iter().map(|(pattern, _)| *pattern))
            .map_err(|e| MatcherError::Processing(format!("Failed to build skill matcher: {}", e)))?;

        for mat in matcher.find_overlapping_iter(text) {
            let (pattern, skill) = patterns[mat.pattern().as_usize()];
            if needs_word_boundary(pattern) && !at_word_boundary(text, mat.start(), mat.end()) {
                continue;
            }
            positions.entry(skill.to_string()).or_default().push(mat.start());
        }

        if options.include_variations {
            let normalizer =
                SkillNormalizer::new(self.vocabulary.clone()).case_sensitive(options.case_sensitive);

            // "react 18", "python3", "Java 17"
            for cap in self.version_regex.captures_iter(text) {
                if let Some(base) = cap.get(1) {
                    if dotted_before(text, base.start()) {
                        continue;
                    }
                    let skill = normalizer.normalize(base.as_str());
                    if active.contains(skill.as_str()) {
                        positions.entry(skill).or_default().push(base.start());
                    }
                }
            }

            // "main.py", "*.rs files"; not "Node.js", which names a skill of its own
            for cap in self.extension_regex.captures_iter(text) {
                let (Some(stem), Some(ext)) = (cap.get(1), cap.get(2)) else {
                    continue;
                };
                if dotted_before(text, stem.start()) {
                    continue;
                }
                let token = format!("{}.{}", stem.as_str(), ext.as_str()).to_lowercase();
                if self.vocabulary.contains(&token) || self.vocabulary.resolve_alias(&token).is_some() {
                    continue;
                }
                if let Some(skill) = self.vocabulary.extension_skill(ext.as_str()) {
                    if active.contains(skill) {
                        positions.entry(skill.to_string()).or_default().push(ext.start() - 1);
                    }
                }
            }
        }

        let mut hits: Vec<SkillHit> = positions
            .into_iter()
            .map(|(skill, mut positions)| {
                positions.sort_unstable();
                positions.dedup();
                SkillHit { skill, positions }
            })
            .collect();

        hits.sort_by(|a, b| {
            a.first_position()
                .cmp(&b.first_position())
                .then_with(|| a.skill.cmp(&b.skill))
        });

        log::debug!("Dictionary scan found {} skills", hits.len());
        Ok(hits)
    }
}

fn needs_word_boundary(pattern: &str) -> bool {
    !pattern.contains([' ', '.', '#', '+'])
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// A dot between word characters ("Taylor.Swift", "Next.js") joins rather than separates.
fn at_word_boundary(text: &str, start: usize, end: usize) -> bool {
    let before = text[..start].chars().next_back();
    let after = text[end..].chars().next();
    !before.map_or(false, is_word_char)
        && !after.map_or(false, is_word_char)
        && !dotted_before(text, start)
        && !dotted_after(text, end)
}

fn dotted_before(text: &str, start: usize) -> bool {
    text[..start]
        .strip_suffix('.')
        .and_then(|rest| rest.chars().next_back())
        .map_or(false, is_word_char)
}

fn dotted_after(text: &str, end: usize) -> bool {
    text[end..]
        .strip_prefix('.')
        .and_then(|rest| rest.chars().next())
        .map_or(false, is_word_char)
}

/// Largest "N years" / "N+ yrs" figure in the text.
pub fn detect_experience_years(text: &str) -> Option<f32> {
    let re = Regex::new(r"(?i)\b(\d{1,2}(?:\.\d)?)\s*\+?\s*(?:years?|yrs?)\b").ok()?;
    re.captures_iter(text)
        .filter_map(|cap| cap.get(1)?.as_str().parse::<f32>().ok())
        .filter(|years| *years <= 50.0)
        .reduce(f32::max)
}

/// Most senior level word mentioned in the text.
pub fn detect_seniority(text: &str) -> Option<Seniority> {
    let levels: [(Seniority, &str); 7] = [
        (Seniority::Principal, r"\bprincipal\b"),
        (Seniority::Staff, r"\bstaff\s+(?:engineer|developer|scientist)\b"),
        (Seniority::Lead, r"\b(?:lead|tech lead|team lead)\b"),
        (Seniority::Senior, r"\b(?:senior|sr)\b"),
        (Seniority::Mid, r"\b(?:mid[- ]level|intermediate)\b"),
        (Seniority::Junior, r"\b(?:junior|jr|entry[- ]level|graduate)\b"),
        (Seniority::Intern, r"\bintern(?:ship)?\b"),
    ];

    let lower = text.to_lowercase();
    levels
        .iter()
        .find(|(_, pattern)| Regex::new(pattern).map_or(false, |re| re.is_match(&lower)))
        .map(|(level, _)| *level)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extractor() -> DictionaryExtractor {
        DictionaryExtractor::new(Arc::new(SkillVocabulary::builtin())).unwrap()
    }

    fn skills(text: &str) -> Vec<String> {
        extractor()
            .extract(text, &ExtractionOptions::default())
            .unwrap()
            .to_vec()
    }

    #[test]
    fn test_word_boundary_for_single_tokens() {
        let found = skills("Five years of JavaScript and TypeScript.");
        assert!(found.contains(&"javascript".to_string()));
        assert!(!found.contains(&"java".to_string()));
    }

    #[test]
    fn test_substring_for_symbol_skills() {
        let found = skills("Built services in C++, C# and Node.js; deployed with CI/CD.");
        for expected in ["c++", "c#", "node.js", "ci/cd"] {
            assert!(found.contains(&expected.to_string()), "missing {}", expected);
        }
    }

    #[test]
    fn test_multi_token_skills() {
        let found = skills("Background in machine learning and React Native apps");
        assert!(found.contains(&"machine learning".to_string()));
        assert!(found.contains(&"react native".to_string()));
        assert!(found.contains(&"react".to_string()));
    }

    #[test]
    fn test_variations() {
        let found = skills("Ran k8s clusters, wrote ReactJS, ML pipelines in python3, scripts like etl.rs and react 18");
        for expected in ["kubernetes", "react", "machine learning", "python", "rust"] {
            assert!(found.contains(&expected.to_string()), "missing {}", expected);
        }
    }

    #[test]
    fn test_extension_cue_needs_a_file_name() {
        let found = skills("Shipped apps in Node.js and Next.js");
        assert_eq!(found, vec!["next.js".to_string(), "node.js".to_string()]);

        assert!(skills("Tickets for Taylor.Swift sold out").is_empty());

        let found = skills("Edited main.py, src/lib.rs and all *.go files");
        for expected in ["python", "rust", "go"] {
            assert!(found.contains(&expected.to_string()), "missing {}", expected);
        }
    }

    #[test]
    fn test_variations_disabled() {
        let options = ExtractionOptions {
            include_variations: false,
            ..Default::default()
        };
        let found = extractor().extract("k8s and golang", &options).unwrap();
        assert!(found.is_empty());
    }

    #[test]
    fn test_case_sensitive() {
        let options = ExtractionOptions {
            case_sensitive: true,
            ..Default::default()
        };
        let found = extractor().extract("Docker and docker-compose", &options).unwrap();
        assert_eq!(found.to_vec(), vec!["docker".to_string()]);
        let found = extractor().extract("Docker only", &options).unwrap();
        assert!(found.is_empty());
    }

    #[test]
    fn test_category_filter() {
        let options = ExtractionOptions {
            categories: Some(vec!["databases".to_string()]),
            ..Default::default()
        };
        let found = extractor().extract("Rust, Postgres and Redis", &options).unwrap();
        assert_eq!(found.to_vec(), vec!["postgresql".to_string(), "redis".to_string()]);
    }

    #[test]
    fn test_min_word_length() {
        let options = ExtractionOptions {
            min_word_length: 3,
            ..Default::default()
        };
        let found = extractor().extract("Go and Rust", &options).unwrap();
        assert_eq!(found.to_vec(), vec!["rust".to_string()]);
    }

    #[test]
    fn test_empty_text() {
        assert!(skills("").is_empty());
        assert!(skills("   ").is_empty());
    }

    #[test]
    fn test_extract_ordered_by_first_mention() {
        let ordered = extractor()
            .extract_ordered("Docker first, then Rust, then Docker again", &ExtractionOptions::default())
            .unwrap();
        assert_eq!(ordered, vec!["docker".to_string(), "rust".to_string()]);
    }

    #[test]
    fn test_confidence_ranking() {
        let resume = "Jane Doe\n\nSkills:\nRust, Docker\n\nExperience:\nExperience with Rust services. Rust everywhere. Some Python scripts.\n";
        let ranked = extractor()
            .extract_with_confidence(resume, &ExtractionOptions::default())
            .unwrap();

        assert_eq!(ranked[0].skill, "rust");
        assert!((ranked[0].confidence - 1.0).abs() < 1e-6);
        let python = ranked.iter().find(|r| r.skill == "python").unwrap();
        assert!(python.confidence < ranked[0].confidence);
        assert!(ranked.iter().all(|r| (0.0..=1.0).contains(&r.confidence)));
    }

    #[test]
    fn test_detect_experience_years() {
        assert_eq!(detect_experience_years("5+ years of Rust, 3 yrs Go"), Some(5.0));
        assert_eq!(detect_experience_years("no numbers here"), None);
    }

    #[test]
    fn test_detect_seniority() {
        assert_eq!(detect_seniority("Senior Rust Engineer"), Some(Seniority::Senior));
        assert_eq!(detect_seniority("Principal Engineer, Platform"), Some(Seniority::Principal));
        assert_eq!(detect_seniority("Summer Internship 2025"), Some(Seniority::Intern));
        assert_eq!(detect_seniority("Software Engineer"), None);
    }

    #[test]
    fn test_seniority_from_label() {
        assert_eq!("Senior".parse::<Seniority>().unwrap(), Seniority::Senior);
        assert_eq!("mid".parse::<Seniority>().unwrap(), Seniority::Mid);
        assert_eq!("entry-level".parse::<Seniority>().unwrap(), Seniority::Junior);
        assert!("wizard".parse::<Seniority>().is_err());
    }
}
