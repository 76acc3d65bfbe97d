//! The analysis envelope handed back to callers and stored in the cache

use crate::extraction::pipeline::ExtractionMethod;
use crate::matching::engine::MatchResult;
use crate::skills::extractor::{RankedSkill, Seniority};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisPayload {
    /// Headline score: must-have and nice-to-have ratios averaged by weight
    pub weighted_match_percentage: u8,
    /// Unweighted score over every job skill
    pub match_percentage: u8,
    pub matched_skills: Vec<String>,
    pub missing_skills: Vec<String>,
    pub extra_skills: Vec<String>,
    pub must_have: CategoryScore,
    pub nice_to_have: CategoryScore,
    #[serde(default)]
    pub resume_skills: Vec<RankedSkill>,
    #[serde(default)]
    pub experience: ExperienceSummary,
    #[serde(default)]
    pub job_title: Option<String>,
    pub metadata: AnalysisMetadata,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryScore {
    pub match_percentage: u8,
    pub weight: f64,
    pub matched_skills: Vec<String>,
    pub missing_skills: Vec<String>,
}

impl CategoryScore {
    pub fn from_result(result: &MatchResult, weight: f64) -> Self {
        Self {
            match_percentage: result.match_percentage,
            weight,
            matched_skills: result.matched_skills.to_vec(),
            missing_skills: result.missing_skills.to_vec(),
        }
    }

    pub fn required(&self) -> usize {
        self.matched_skills.len() + self.missing_skills.len()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExperienceSummary {
    pub resume_years: Option<f32>,
    pub required_years: Option<f32>,
    pub resume_seniority: Option<Seniority>,
    pub required_seniority: Option<Seniority>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisMetadata {
    /// `ai` when both sides came from the AI, `dictionary` when AI is off,
    /// `dictionary_fallback` otherwise
    pub analysis_method: ExtractionMethod,
    pub ai_enabled: bool,
    pub timestamp: DateTime<Utc>,
    pub resume_extraction: ExtractionMethod,
    pub job_extraction: ExtractionMethod,
    pub fuzzy: bool,
}

/// Provenance of a whole analysis from the provenance of its two sides.
pub fn combined_method(
    ai_enabled: bool,
    resume: ExtractionMethod,
    job: ExtractionMethod,
) -> ExtractionMethod {
    match (resume, job) {
        (ExtractionMethod::Ai, ExtractionMethod::Ai) => ExtractionMethod::Ai,
        _ if !ai_enabled => ExtractionMethod::Dictionary,
        _ => ExtractionMethod::DictionaryFallback,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ExtractionMethod::*;

    #[test]
    fn test_combined_method() {
        assert_eq!(combined_method(true, Ai, Ai), Ai);
        assert_eq!(combined_method(false, Dictionary, Dictionary), Dictionary);
        assert_eq!(combined_method(true, Ai, DictionaryFallback), DictionaryFallback);
        assert_eq!(
            combined_method(true, DictionaryFallback, DictionaryFallback),
            DictionaryFallback
        );
    }
}
