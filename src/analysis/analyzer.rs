//! End-to-end analysis: cache lookup, extraction, matching, save

use crate::analysis::payload::{
    combined_method, AnalysisMetadata, AnalysisPayload, CategoryScore, ExperienceSummary,
};
use crate::cache::key::ResumeIdentity;
use crate::cache::store::AnalysisStore;
use crate::config::Config;
use crate::error::{MatcherError, Result};
use crate::extraction::ai::HttpAiExtractor;
use crate::extraction::pipeline::{Extraction, ExtractionPipeline, JobSkills, ResumeSkills};
use crate::matching::engine::{MatchingEngine, Weights};
use crate::skills::matcher::SkillMatcher;
use crate::skills::requirements::RequirementCategorizer;
use chrono::Utc;
use log::{debug, info, warn};
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisRequest {
    pub url: String,
    pub resume_text: String,
    pub job_text: String,
    pub job_title: Option<String>,
    pub resume_identity: Option<ResumeIdentity>,
    /// Recompute and overwrite even when a cached analysis exists
    pub force: bool,
}

impl AnalysisRequest {
    pub fn new(
        url: impl Into<String>,
        resume_text: impl Into<String>,
        job_text: impl Into<String>,
    ) -> Self {
        Self {
            url: url.into(),
            resume_text: resume_text.into(),
            job_text: job_text.into(),
            job_title: None,
            resume_identity: None,
            force: false,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.job_title = Some(title.into());
        self
    }

    pub fn with_resume_identity(mut self, identity: ResumeIdentity) -> Self {
        self.resume_identity = Some(identity);
        self
    }

    pub fn force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisOutcome {
    pub payload: AnalysisPayload,
    pub from_cache: bool,
}

/// Analysis service over an extraction pipeline, a matching engine and an
/// optional store.
pub struct Analyzer {
    pipeline: ExtractionPipeline,
    engine: MatchingEngine,
    weights: Weights,
    store: Option<AnalysisStore>,
}

impl Analyzer {
    pub fn new(pipeline: ExtractionPipeline, engine: MatchingEngine, weights: Weights) -> Self {
        Self {
            pipeline,
            engine,
            weights,
            store: None,
        }
    }

    pub fn with_store(mut self, store: AnalysisStore) -> Self {
        self.store = Some(store);
        self
    }

    /// Wire everything from configuration: vocabulary, AI client and file store.
    pub fn from_config(config: &Config) -> Result<Self> {
        config.validate()?;

        let vocabulary = Arc::new(config.load_vocabulary()?);

        let mut pipeline = ExtractionPipeline::new(
            vocabulary,
            config.extraction_options(),
            RequirementCategorizer::new(config.matching.must_have_position_ratio),
        )?;

        if config.ai.enabled {
            let ai = HttpAiExtractor::from_config(&config.ai)?;
            info!("AI extraction enabled via {}", ai.url());
            pipeline = pipeline.with_ai(Arc::new(ai), Duration::from_secs(config.ai.timeout_secs));
        }

        let matcher = SkillMatcher::new(pipeline.normalizer().clone())
            .with_similarity_threshold(config.matching.similarity_threshold);
        let engine = MatchingEngine::new(matcher).with_fuzzy(config.matching.fuzzy);

        let analyzer = Self::new(pipeline, engine, config.weights()?);
        Ok(if config.storage.enabled {
            analyzer.with_store(AnalysisStore::file(&config.storage.cache_dir))
        } else {
            analyzer
        })
    }

    pub fn pipeline(&self) -> &ExtractionPipeline {
        &self.pipeline
    }

    pub fn engine(&self) -> &MatchingEngine {
        &self.engine
    }

    pub fn store(&self) -> Option<&AnalysisStore> {
        self.store.as_ref()
    }

    /// Serve from the cache when possible, otherwise extract, score and save.
    ///
    /// The save happens only after the full result exists, so an aborted
    /// request never leaves a partial record behind.
    pub async fn analyze(&self, request: &AnalysisRequest) -> Result<AnalysisOutcome> {
        if request.resume_text.trim().is_empty() {
            return Err(MatcherError::InsufficientInput("Resume text is empty".to_string()));
        }
        if request.job_text.trim().is_empty() {
            return Err(MatcherError::InsufficientInput("Job description is empty".to_string()));
        }

        let identity = request.resume_identity.as_ref();

        if let (Some(store), false) = (&self.store, request.force) {
            if let Some(record) = store.load(&request.url, identity, Some(&request.job_text)).await {
                match serde_json::from_value::<AnalysisPayload>(record.analysis_data) {
                    Ok(payload) if self.scored_like_this(&payload) => {
                        info!("Using cached analysis from {}", record.metadata.saved_at);
                        return Ok(AnalysisOutcome {
                            payload,
                            from_cache: true,
                        });
                    }
                    Ok(_) => info!(
                        "Cached analysis for {} used other matching settings, recomputing",
                        request.url
                    ),
                    Err(e) => warn!("Cached analysis for {} is unreadable, recomputing: {}", request.url, e),
                }
            }
        }

        info!("Extracting skills");
        let (resume, job) = tokio::join!(
            self.pipeline.extract_resume(&request.resume_text),
            self.pipeline
                .extract_job(&request.job_text, request.job_title.as_deref()),
        );
        let (resume, job) = (resume?, job?);

        if resume.data.skills.is_empty() {
            return Err(MatcherError::InsufficientInput(
                "No skills could be extracted from the resume".to_string(),
            ));
        }
        if job.data.requirement.is_empty() {
            return Err(MatcherError::InsufficientInput(
                "No skills could be extracted from the job description".to_string(),
            ));
        }

        let payload = self.score(&resume, &job, request.job_title.clone());
        info!(
            "Weighted match {}% ({} matched, {} missing)",
            payload.weighted_match_percentage,
            payload.matched_skills.len(),
            payload.missing_skills.len()
        );

        if let Some(store) = &self.store {
            if !store
                .save(&request.url, &payload, identity, Some(&request.job_text))
                .await
            {
                warn!("Analysis for {} was not cached", request.url);
            }
        }

        Ok(AnalysisOutcome {
            payload,
            from_cache: false,
        })
    }

    /// Score extracted skills into the payload envelope.
    /// True if a cached payload was produced with this analyzer's fuzzy
    /// mode, weights and AI setting.
    fn scored_like_this(&self, payload: &AnalysisPayload) -> bool {
        let same = |a: f64, b: f64| (a - b).abs() < 1e-9;
        payload.metadata.fuzzy == self.engine.is_fuzzy()
            && payload.metadata.ai_enabled == self.pipeline.ai_enabled()
            && same(payload.must_have.weight, self.weights.must_have)
            && same(payload.nice_to_have.weight, self.weights.nice_to_have)
    }

    pub fn score(
        &self,
        resume: &Extraction<ResumeSkills>,
        job: &Extraction<JobSkills>,
        job_title: Option<String>,
    ) -> AnalysisPayload {
        let requirement = &job.data.requirement;
        let weighted = self
            .engine
            .compare_weighted(&resume.data.skills, requirement, self.weights);
        let overall = self
            .engine
            .compare(&resume.data.skills, &requirement.all_skills());

        debug!(
            "Resume skills: {:?}; must-have: {:?}; nice-to-have: {:?}",
            resume.data.skills.to_vec(),
            requirement.must_have().to_vec(),
            requirement.nice_to_have().to_vec()
        );

        AnalysisPayload {
            weighted_match_percentage: weighted.weighted_percentage,
            match_percentage: overall.match_percentage,
            matched_skills: weighted.matched_skills.to_vec(),
            missing_skills: weighted.missing_skills.to_vec(),
            extra_skills: weighted.extra_skills.to_vec(),
            must_have: CategoryScore::from_result(&weighted.must_have, self.weights.must_have),
            nice_to_have: CategoryScore::from_result(
                &weighted.nice_to_have,
                self.weights.nice_to_have,
            ),
            resume_skills: resume.data.ranked.clone(),
            experience: ExperienceSummary {
                resume_years: resume.data.experience_years,
                required_years: job.data.experience_years,
                resume_seniority: resume.data.seniority,
                required_seniority: job.data.seniority,
            },
            job_title,
            metadata: AnalysisMetadata {
                analysis_method: combined_method(
                    self.pipeline.ai_enabled(),
                    resume.method,
                    job.method,
                ),
                ai_enabled: self.pipeline.ai_enabled(),
                timestamp: Utc::now(),
                resume_extraction: resume.method,
                job_extraction: job.method,
                fuzzy: self.engine.is_fuzzy(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extraction::pipeline::ExtractionMethod;
    use crate::skills::extractor::ExtractionOptions;
    use crate::skills::normalizer::SkillNormalizer;
    use crate::skills::vocabulary::SkillVocabulary;

    const URL: &str = "https://jobs.example.com/view/7";
    const RESUME: &str = "Skills: JavaScript, React, Node.js. 4 years of experience.";
    const JOB: &str = "Requirements: JavaScript, React, Docker. GraphQL is a bonus.";

    fn analyzer() -> Analyzer {
        let vocabulary = Arc::new(SkillVocabulary::builtin());
        let pipeline = ExtractionPipeline::new(
            vocabulary.clone(),
            ExtractionOptions::default(),
            RequirementCategorizer::default(),
        )
        .unwrap();
        let engine = MatchingEngine::new(SkillMatcher::new(SkillNormalizer::new(vocabulary)));
        Analyzer::new(pipeline, engine, Weights::default()).with_store(AnalysisStore::in_memory())
    }

    #[tokio::test]
    async fn test_analyze_scores_and_caches() {
        let analyzer = analyzer();
        let request = AnalysisRequest::new(URL, RESUME, JOB)
            .with_resume_identity(ResumeIdentity::new("cv.txt", 60));

        let first = analyzer.analyze(&request).await.unwrap();
        assert!(!first.from_cache);
        let payload = &first.payload;
        assert_eq!(payload.must_have.match_percentage, 67);
        assert_eq!(payload.nice_to_have.match_percentage, 0);
        assert_eq!(payload.weighted_match_percentage, 47);
        assert_eq!(payload.match_percentage, 50);
        assert_eq!(payload.extra_skills, vec!["node.js".to_string()]);
        assert_eq!(payload.metadata.analysis_method, ExtractionMethod::Dictionary);
        assert_eq!(payload.experience.resume_years, Some(4.0));

        let second = analyzer.analyze(&request).await.unwrap();
        assert!(second.from_cache);
        assert_eq!(second.payload, first.payload);
    }

    #[tokio::test]
    async fn test_cache_ignored_when_settings_change() {
        let first = analyzer();
        let store = first.store().unwrap().clone();
        let request = AnalysisRequest::new(URL, RESUME, JOB);
        first.analyze(&request).await.unwrap();

        let vocabulary = Arc::new(SkillVocabulary::builtin());
        let exact = Analyzer::new(
            ExtractionPipeline::new(
                vocabulary.clone(),
                ExtractionOptions::default(),
                RequirementCategorizer::default(),
            )
            .unwrap(),
            MatchingEngine::new(SkillMatcher::new(SkillNormalizer::new(vocabulary))).with_fuzzy(false),
            Weights::new(0.5, 0.5).unwrap(),
        )
        .with_store(store.clone());

        let outcome = exact.analyze(&request).await.unwrap();
        assert!(!outcome.from_cache);
        assert!(!outcome.payload.metadata.fuzzy);
        assert_eq!(outcome.payload.must_have.weight, 0.5);
        // must 67%, nice 0%, now averaged evenly
        assert_eq!(outcome.payload.weighted_match_percentage, 33);

        assert!(exact.analyze(&request).await.unwrap().from_cache);
        assert_eq!(store.list_for_job(URL).await.len(), 1);
    }

    #[tokio::test]
    async fn test_force_recomputes() {
        let analyzer = analyzer();
        let request = AnalysisRequest::new(URL, RESUME, JOB);
        analyzer.analyze(&request).await.unwrap();

        let forced = analyzer.analyze(&request.clone().force(true)).await.unwrap();
        assert!(!forced.from_cache);
        assert_eq!(analyzer.store().unwrap().list_for_job(URL).await.len(), 1);
    }

    #[tokio::test]
    async fn test_changed_description_misses_cache() {
        let analyzer = analyzer();
        analyzer.analyze(&AnalysisRequest::new(URL, RESUME, JOB)).await.unwrap();

        let changed = AnalysisRequest::new(URL, RESUME, "Requirements: Rust and Kafka.");
        let outcome = analyzer.analyze(&changed).await.unwrap();
        assert!(!outcome.from_cache);
        assert_eq!(outcome.payload.must_have.match_percentage, 0);
        // no nice-to-have skills listed, so that category counts as satisfied
        assert_eq!(outcome.payload.nice_to_have.match_percentage, 100);
        assert_eq!(outcome.payload.weighted_match_percentage, 30);
    }

    #[tokio::test]
    async fn test_insufficient_input() {
        let analyzer = analyzer();
        let blank = AnalysisRequest::new(URL, "   ", JOB);
        assert!(matches!(
            analyzer.analyze(&blank).await,
            Err(MatcherError::InsufficientInput(_))
        ));

        let no_skills = AnalysisRequest::new(URL, RESUME, "We are a friendly team in Berlin.");
        assert!(matches!(
            analyzer.analyze(&no_skills).await,
            Err(MatcherError::InsufficientInput(_))
        ));
    }

    #[tokio::test]
    async fn test_zero_overlap_is_not_an_error() {
        let analyzer = analyzer();
        let request = AnalysisRequest::new(URL, "Expert in Haskell and OCaml", JOB);
        let outcome = analyzer.analyze(&request).await.unwrap();
        assert_eq!(outcome.payload.weighted_match_percentage, 0);
    }

    #[test]
    fn test_from_config_without_storage() {
        let mut config = Config::default();
        config.storage.enabled = false;
        let analyzer = Analyzer::from_config(&config).unwrap();
        assert!(analyzer.store().is_none());
        assert!(!analyzer.pipeline().ai_enabled());
        assert!(analyzer.engine().is_fuzzy());
    }
}
