//! Resume vs. job skill comparison with weighted must-have / nice-to-have scoring

use crate::error::{MatcherError, Result};
use crate::skills::matcher::{MatchKind, SkillMatcher};
use crate::skills::requirements::JobRequirement;
use crate::skills::SkillSet;
use serde::{Deserialize, Serialize};

/// Relative importance of the two requirement categories.
///
/// Weights need not sum to one; the weighted score divides by their sum.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Weights {
    pub must_have: f64,
    pub nice_to_have: f64,
}

impl Weights {
    pub fn new(must_have: f64, nice_to_have: f64) -> Result<Self> {
        let valid = |w: f64| w.is_finite() && w >= 0.0;
        if !valid(must_have) || !valid(nice_to_have) {
            return Err(MatcherError::InvalidInput(format!(
                "Weights must be finite and non-negative (got {}, {})",
                must_have, nice_to_have
            )));
        }
        if must_have + nice_to_have <= 0.0 {
            return Err(MatcherError::InvalidInput(
                "At least one weight must be positive".to_string(),
            ));
        }
        Ok(Self {
            must_have,
            nice_to_have,
        })
    }
}

impl Default for Weights {
    fn default() -> Self {
        Self {
            must_have: 0.7,
            nice_to_have: 0.3,
        }
    }
}

/// Which resume skill satisfied a job skill, and how.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillPairing {
    pub job_skill: String,
    pub resume_skill: String,
    pub kind: MatchKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    /// Job skills satisfied by some resume skill, in the job's spelling
    pub matched_skills: SkillSet,
    pub missing_skills: SkillSet,
    /// Resume skills that satisfy none of the job skills
    pub extra_skills: SkillSet,
    /// 0..=100; 100 when nothing is required
    pub match_percentage: u8,
    pub pairings: Vec<SkillPairing>,
}

impl MatchResult {
    /// Fraction of required skills matched, 1.0 when nothing is required.
    pub fn ratio(&self) -> f64 {
        let required = self.matched_skills.len() + self.missing_skills.len();
        if required == 0 {
            1.0
        } else {
            self.matched_skills.len() as f64 / required as f64
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightedMatchResult {
    pub must_have: MatchResult,
    pub nice_to_have: MatchResult,
    pub weights: Weights,
    /// round(100 * (must * w_must + nice * w_nice) / (w_must + w_nice))
    pub weighted_percentage: u8,
    /// Union of both categories
    pub matched_skills: SkillSet,
    pub missing_skills: SkillSet,
    /// Resume skills that satisfy no job skill in either category
    pub extra_skills: SkillSet,
}

/// Compares resume skills against job skills.
#[derive(Debug, Clone)]
pub struct MatchingEngine {
    matcher: SkillMatcher,
    fuzzy: bool,
}

impl MatchingEngine {
    pub fn new(matcher: SkillMatcher) -> Self {
        Self {
            matcher,
            fuzzy: true,
        }
    }

    pub fn with_fuzzy(mut self, fuzzy: bool) -> Self {
        self.fuzzy = fuzzy;
        self
    }

    pub fn is_fuzzy(&self) -> bool {
        self.fuzzy
    }

    pub fn matcher(&self) -> &SkillMatcher {
        &self.matcher
    }

    /// Compare a resume's skills against one set of job skills.
    ///
    /// Each job skill takes the first resume skill that matches it, trying an
    /// exact hit before scanning for a fuzzy one. A resume skill may satisfy
    /// several job skills.
    pub fn compare(&self, resume_skills: &SkillSet, job_skills: &SkillSet) -> MatchResult {
        let mut matched_skills = SkillSet::new();
        let mut missing_skills = SkillSet::new();
        let mut pairings = Vec::new();

        for job_skill in job_skills.iter() {
            match self.find_match(resume_skills, job_skill) {
                Some((resume_skill, kind)) => {
                    matched_skills.insert(job_skill);
                    pairings.push(SkillPairing {
                        job_skill: job_skill.to_string(),
                        resume_skill: resume_skill.to_string(),
                        kind,
                    });
                }
                None => {
                    missing_skills.insert(job_skill);
                }
            }
        }

        let extra_skills = self.unmatched_resume_skills(resume_skills, job_skills);
        let match_percentage = percentage(matched_skills.len(), job_skills.len());

        MatchResult {
            matched_skills,
            missing_skills,
            extra_skills,
            match_percentage,
            pairings,
        }
    }

    /// Score must-have and nice-to-have skills separately, then combine.
    ///
    /// Each weight is applied once: the category ratios are averaged with the
    /// weights and rounded a single time at the end.
    pub fn compare_weighted(
        &self,
        resume_skills: &SkillSet,
        requirement: &JobRequirement,
        weights: Weights,
    ) -> WeightedMatchResult {
        let must_have = self.compare(resume_skills, requirement.must_have());
        let nice_to_have = self.compare(resume_skills, requirement.nice_to_have());

        let total = weights.must_have + weights.nice_to_have;
        let weighted = if total > 0.0 {
            (must_have.ratio() * weights.must_have + nice_to_have.ratio() * weights.nice_to_have)
                / total
        } else {
            must_have.ratio()
        };

        let matched_skills = must_have.matched_skills.union(&nice_to_have.matched_skills);
        let missing_skills = must_have.missing_skills.union(&nice_to_have.missing_skills);
        let extra_skills = must_have.extra_skills.intersection(&nice_to_have.extra_skills);

        log::debug!(
            "Weighted match: must-have {}%, nice-to-have {}%, overall {:.1}%",
            must_have.match_percentage,
            nice_to_have.match_percentage,
            weighted * 100.0
        );

        WeightedMatchResult {
            must_have,
            nice_to_have,
            weights,
            weighted_percentage: to_percentage(weighted),
            matched_skills,
            missing_skills,
            extra_skills,
        }
    }

    fn find_match<'a>(&self, resume_skills: &'a SkillSet, job_skill: &str) -> Option<(&'a str, MatchKind)> {
        if let Some(exact) = resume_skills.iter().find(|s| *s == job_skill) {
            return Some((exact, MatchKind::Exact));
        }

        resume_skills.iter().find_map(|resume_skill| {
            self.matcher
                .match_kind(resume_skill, job_skill, self.fuzzy)
                .map(|kind| (resume_skill, kind))
        })
    }

    fn unmatched_resume_skills(&self, resume_skills: &SkillSet, job_skills: &SkillSet) -> SkillSet {
        resume_skills
            .iter()
            .filter(|resume_skill| {
                !job_skills
                    .iter()
                    .any(|job_skill| self.matcher.matches(resume_skill, job_skill, self.fuzzy))
            })
            .collect()
    }
}

/// round(100 * part / whole), 100 when whole is zero
pub fn percentage(part: usize, whole: usize) -> u8 {
    if whole == 0 {
        return 100;
    }
    to_percentage(part as f64 / whole as f64)
}

fn to_percentage(ratio: f64) -> u8 {
    (ratio.clamp(0.0, 1.0) * 100.0).round() as u8
}
