//! Skill extraction with AI first and the dictionary as fallback

use crate::error::Result;
use crate::extraction::ai::{AiExtractionError, AiSkillExtractor};
use crate::skills::extractor::{
    detect_experience_years, detect_seniority, DictionaryExtractor, ExtractionOptions,
    RankedSkill, Seniority,
};
use crate::skills::normalizer::SkillNormalizer;
use crate::skills::requirements::{JobRequirement, RequirementCategorizer};
use crate::skills::vocabulary::SkillVocabulary;
use crate::skills::SkillSet;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_AI_TIMEOUT: Duration = Duration::from_secs(30);

/// Where a skill set came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionMethod {
    Ai,
    /// AI was not configured
    Dictionary,
    /// AI was configured but failed, timed out or found nothing
    DictionaryFallback,
}

impl ExtractionMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExtractionMethod::Ai => "ai",
            ExtractionMethod::Dictionary => "dictionary",
            ExtractionMethod::DictionaryFallback => "dictionary_fallback",
        }
    }
}

/// Extracted data tagged with its provenance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Extraction<T> {
    pub method: ExtractionMethod,
    pub data: T,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResumeSkills {
    pub skills: SkillSet,
    /// Display ordering only; never used for matched/missing decisions
    pub ranked: Vec<RankedSkill>,
    pub experience_years: Option<f32>,
    pub seniority: Option<Seniority>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobSkills {
    pub requirement: JobRequirement,
    pub experience_years: Option<f32>,
    pub seniority: Option<Seniority>,
}

/// Runs the AI extractor when one is attached and falls back to the
/// dictionary on any error, on timeout, or when the AI finds no skills.
pub struct ExtractionPipeline {
    dictionary: DictionaryExtractor,
    normalizer: SkillNormalizer,
    categorizer: RequirementCategorizer,
    options: ExtractionOptions,
    ai: Option<Arc<dyn AiSkillExtractor>>,
    ai_timeout: Duration,
}

impl ExtractionPipeline {
    pub fn new(
        vocabulary: Arc<SkillVocabulary>,
        options: ExtractionOptions,
        categorizer: RequirementCategorizer,
    ) -> Result<Self> {
        let normalizer =
            SkillNormalizer::new(vocabulary.clone()).case_sensitive(options.case_sensitive);
        Ok(Self {
            dictionary: DictionaryExtractor::new(vocabulary)?,
            normalizer,
            categorizer,
            options,
            ai: None,
            ai_timeout: DEFAULT_AI_TIMEOUT,
        })
    }

    pub fn with_ai(mut self, ai: Arc<dyn AiSkillExtractor>, timeout: Duration) -> Self {
        self.ai = Some(ai);
        self.ai_timeout = timeout;
        self
    }

    pub fn ai_enabled(&self) -> bool {
        self.ai.is_some()
    }

    pub fn normalizer(&self) -> &SkillNormalizer {
        &self.normalizer
    }

    pub fn dictionary(&self) -> &DictionaryExtractor {
        &self.dictionary
    }

    pub fn options(&self) -> &ExtractionOptions {
        &self.options
    }

    pub async fn extract_resume(&self, resume_text: &str) -> Result<Extraction<ResumeSkills>> {
        let Some(ai) = &self.ai else {
            return Ok(Extraction {
                method: ExtractionMethod::Dictionary,
                data: self.dictionary_resume(resume_text)?,
            });
        };

        match self.bounded(ai.extract_resume_skills(resume_text)).await {
            Ok(profile) if !profile.is_empty() => {
                info!("Resume skills extracted by AI");
                Ok(Extraction {
                    method: ExtractionMethod::Ai,
                    data: ResumeSkills {
                        skills: profile.skills(&self.normalizer),
                        ranked: profile.ranked(&self.normalizer),
                        experience_years: profile
                            .experience_years
                            .or_else(|| detect_experience_years(resume_text)),
                        seniority: profile
                            .seniority_level()
                            .or_else(|| detect_seniority(resume_text)),
                    },
                })
            }
            outcome => {
                log_fallback("resume", outcome.err());
                Ok(Extraction {
                    method: ExtractionMethod::DictionaryFallback,
                    data: self.dictionary_resume(resume_text)?,
                })
            }
        }
    }

    pub async fn extract_job(
        &self,
        job_text: &str,
        job_title: Option<&str>,
    ) -> Result<Extraction<JobSkills>> {
        let Some(ai) = &self.ai else {
            return Ok(Extraction {
                method: ExtractionMethod::Dictionary,
                data: self.dictionary_job(job_text, job_title)?,
            });
        };

        match self.bounded(ai.extract_job_skills(job_text, job_title)).await {
            Ok(profile) if !profile.is_empty() => {
                info!("Job skills extracted by AI");
                let requirement = profile.requirement(&self.normalizer);
                Ok(Extraction {
                    method: ExtractionMethod::Ai,
                    data: JobSkills {
                        requirement,
                        experience_years: profile
                            .experience_years
                            .or_else(|| detect_experience_years(job_text)),
                        seniority: profile
                            .seniority_level()
                            .or_else(|| title_or_text_seniority(job_text, job_title)),
                    },
                })
            }
            outcome => {
                log_fallback("job", outcome.err());
                Ok(Extraction {
                    method: ExtractionMethod::DictionaryFallback,
                    data: self.dictionary_job(job_text, job_title)?,
                })
            }
        }
    }

    /// Dictionary-only resume extraction.
    pub fn dictionary_resume(&self, resume_text: &str) -> Result<ResumeSkills> {
        let ranked = self
            .dictionary
            .extract_with_confidence(resume_text, &self.options)?;
        Ok(ResumeSkills {
            skills: ranked.iter().map(|r| r.skill.as_str()).collect(),
            ranked,
            experience_years: detect_experience_years(resume_text),
            seniority: detect_seniority(resume_text),
        })
    }

    /// Dictionary-only job extraction with cue-based categorization.
    pub fn dictionary_job(&self, job_text: &str, job_title: Option<&str>) -> Result<JobSkills> {
        let hits = self.dictionary.scan(job_text, &self.options)?;
        Ok(JobSkills {
            requirement: self.categorizer.categorize(job_text, &hits),
            experience_years: detect_experience_years(job_text),
            seniority: title_or_text_seniority(job_text, job_title),
        })
    }

    async fn bounded<T>(
        &self,
        call: impl Future<Output = std::result::Result<T, AiExtractionError>>,
    ) -> std::result::Result<T, AiExtractionError> {
        tokio::time::timeout(self.ai_timeout, call)
            .await
            .map_err(|_| AiExtractionError::Timeout(self.ai_timeout))?
    }
}

fn title_or_text_seniority(job_text: &str, job_title: Option<&str>) -> Option<Seniority> {
    job_title
        .and_then(detect_seniority)
        .or_else(|| detect_seniority(job_text))
}

fn log_fallback(side: &str, error: Option<AiExtractionError>) {
    match error {
        Some(e) => warn!("AI {} extraction failed, using dictionary: {}", side, e),
        None => warn!("AI {} extraction found no skills, using dictionary", side),
    }
}
