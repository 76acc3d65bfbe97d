//! Skill vocabulary, normalization, matching and dictionary extraction

pub mod extractor;
pub mod matcher;
pub mod normalizer;
pub mod requirements;
pub mod sections;
pub mod vocabulary;

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

pub use extractor::{DictionaryExtractor, ExtractionOptions, RankedSkill};
pub use matcher::{MatchKind, SkillMatcher};
pub use normalizer::SkillNormalizer;
pub use requirements::{JobRequirement, RawJobRequirement, RequirementCategorizer};
pub use vocabulary::SkillVocabulary;

/// A set of unique skill tokens, iterated in sorted order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SkillSet(BTreeSet<String>);

impl SkillSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, skill: impl Into<String>) -> bool {
        self.0.insert(skill.into())
    }

    pub fn remove(&mut self, skill: &str) -> bool {
        self.0.remove(skill)
    }

    pub fn contains(&self, skill: &str) -> bool {
        self.0.contains(skill)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|s| s.as_str())
    }

    pub fn union(&self, other: &SkillSet) -> SkillSet {
        self.0.union(&other.0).cloned().collect()
    }

    pub fn intersection(&self, other: &SkillSet) -> SkillSet {
        self.0.intersection(&other.0).cloned().collect()
    }

    pub fn difference(&self, other: &SkillSet) -> SkillSet {
        self.0.difference(&other.0).cloned().collect()
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.0.iter().cloned().collect()
    }
}

impl FromIterator<String> for SkillSet {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> FromIterator<&'a str> for SkillSet {
    fn from_iter<I: IntoIterator<Item = &'a str>>(iter: I) -> Self {
        Self(iter.into_iter().map(|s| s.to_string()).collect())
    }
}

impl IntoIterator for SkillSet {
    type Item = String;
    type IntoIter = std::collections::btree_set::IntoIter<String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a SkillSet {
    type Item = &'a String;
    type IntoIter = std::collections::btree_set::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl Extend<String> for SkillSet {
    fn extend<I: IntoIterator<Item = String>>(&mut self, iter: I) {
        self.0.extend(iter)
    }
}
