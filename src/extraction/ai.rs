//! External AI skill extractor: contract, response shapes and HTTP client

use crate::config::AiConfig;
use crate::extraction::prompts::PromptTemplates;
use crate::skills::extractor::{RankedSkill, Seniority};
use crate::skills::normalizer::SkillNormalizer;
use crate::skills::requirements::{JobRequirement, RawJobRequirement};
use crate::skills::SkillSet;
use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

const CHAT_COMPLETIONS_PATH: &str = "/chat/completions";

/// Failures of the AI path. Never surfaced to callers of the pipeline; they
/// trigger the dictionary fallback instead.
#[derive(Debug, Error)]
pub enum AiExtractionError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("AI provider returned empty content")]
    EmptyContent,

    #[error("AI provider did not answer within {0:?}")]
    Timeout(Duration),

    #[error("API key not set (expected in ${0})")]
    MissingApiKey(String),
}

/// Resume skills by proficiency, as returned by the AI provider.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResumeSkillProfile {
    #[serde(alias = "expert_skills")]
    pub expert: Vec<String>,
    #[serde(alias = "proficient_skills")]
    pub proficient: Vec<String>,
    #[serde(alias = "familiar_skills")]
    pub familiar: Vec<String>,
    #[serde(alias = "experienceYears")]
    pub experience_years: Option<f32>,
    #[serde(alias = "seniorityLevel", alias = "seniority_level")]
    pub seniority: Option<String>,
}

impl ResumeSkillProfile {
    pub fn is_empty(&self) -> bool {
        self.expert.is_empty() && self.proficient.is_empty() && self.familiar.is_empty()
    }

    pub fn skills(&self, normalizer: &SkillNormalizer) -> SkillSet {
        normalizer.normalize_all(
            self.expert
                .iter()
                .chain(&self.proficient)
                .chain(&self.familiar),
        )
    }

    /// Proficiency tiers mapped onto the ranking scale: expert 1.0,
    /// proficient 0.7, familiar 0.4. A skill keeps its highest tier.
    pub fn ranked(&self, normalizer: &SkillNormalizer) -> Vec<RankedSkill> {
        let mut ranked: Vec<RankedSkill> = Vec::new();
        let tiers = [
            (&self.expert, 1.0_f32),
            (&self.proficient, 0.7),
            (&self.familiar, 0.4),
        ];
        for (skills, confidence) in tiers {
            for raw in skills {
                let skill = normalizer.normalize(raw);
                if skill.is_empty() || ranked.iter().any(|r| r.skill == skill) {
                    continue;
                }
                ranked.push(RankedSkill {
                    skill,
                    confidence,
                    occurrences: 0,
                });
            }
        }
        ranked
    }

    pub fn seniority_level(&self) -> Option<Seniority> {
        parse_seniority(self.seniority.as_deref())
    }
}

/// Job skills by priority, as returned by the AI provider.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JobSkillProfile {
    #[serde(alias = "mustHave", alias = "must_have_skills")]
    pub must_have: Vec<String>,
    #[serde(
        alias = "niceToHave",
        alias = "good_to_have_skills",
        alias = "nice_to_have_skills"
    )]
    pub nice_to_have: Vec<String>,
    #[serde(alias = "experienceYears", alias = "required_experience_years")]
    pub experience_years: Option<f32>,
    #[serde(alias = "seniorityLevel", alias = "seniority_level")]
    pub seniority: Option<String>,
}

impl JobSkillProfile {
    pub fn is_empty(&self) -> bool {
        self.must_have.is_empty() && self.nice_to_have.is_empty()
    }

    pub fn requirement(&self, normalizer: &SkillNormalizer) -> JobRequirement {
        JobRequirement::from_raw(
            RawJobRequirement::Categorized {
                must_have: self.must_have.clone(),
                nice_to_have: self.nice_to_have.clone(),
            },
            normalizer,
        )
    }

    pub fn seniority_level(&self) -> Option<Seniority> {
        parse_seniority(self.seniority.as_deref())
    }
}

fn parse_seniority(label: Option<&str>) -> Option<Seniority> {
    let label = label?;
    match label.parse() {
        Ok(level) => Some(level),
        Err(e) => {
            debug!("Ignoring seniority from AI provider: {}", e);
            None
        }
    }
}

/// Black-box skill extractor backed by a language model.
#[async_trait]
pub trait AiSkillExtractor: Send + Sync {
    async fn extract_resume_skills(
        &self,
        resume_text: &str,
    ) -> Result<ResumeSkillProfile, AiExtractionError>;

    async fn extract_job_skills(
        &self,
        job_text: &str,
        job_title: Option<&str>,
    ) -> Result<JobSkillProfile, AiExtractionError>;
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    response_format: ResponseFormat,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessageResponse,
}

#[derive(Debug, Deserialize)]
struct ChatMessageResponse {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

/// Client for an OpenAI-compatible chat completions endpoint.
#[derive(Clone)]
pub struct HttpAiExtractor {
    client: Client,
    url: String,
    model: String,
    api_key: Option<String>,
    timeout: Duration,
    prompts: PromptTemplates,
}

impl HttpAiExtractor {
    pub fn new(
        endpoint: &str,
        model: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, AiExtractionError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: completions_url(endpoint),
            model: model.into(),
            api_key,
            timeout,
            prompts: PromptTemplates::default(),
        })
    }

    /// Build from the `[ai]` config section, reading the key from the named env var.
    /// A blank `api_key_env` means the endpoint takes no key.
    pub fn from_config(config: &AiConfig) -> Result<Self, AiExtractionError> {
        let api_key = if config.api_key_env.trim().is_empty() {
            debug!("No API key configured for {}", config.endpoint);
            None
        } else {
            let key = std::env::var(&config.api_key_env)
                .ok()
                .filter(|k| !k.trim().is_empty())
                .ok_or_else(|| AiExtractionError::MissingApiKey(config.api_key_env.clone()))?;
            Some(key)
        };
        Self::new(
            &config.endpoint,
            config.model.clone(),
            api_key,
            Duration::from_secs(config.timeout_secs),
        )
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    async fn call_json<T: DeserializeOwned>(
        &self,
        system: &str,
        prompt: &str,
    ) -> Result<T, AiExtractionError> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            temperature: 0.0,
            response_format: ResponseFormat {
                format_type: "json_object",
            },
        };

        let mut builder = self.client.post(&self.url).json(&request);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = tokio::time::timeout(self.timeout, builder.send())
            .await
            .map_err(|_| AiExtractionError::Timeout(self.timeout))??;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiErrorEnvelope>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(AiExtractionError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body = tokio::time::timeout(self.timeout, response.text())
            .await
            .map_err(|_| AiExtractionError::Timeout(self.timeout))??;
        parse_chat_content(&body)
    }
}

#[async_trait]
impl AiSkillExtractor for HttpAiExtractor {
    async fn extract_resume_skills(
        &self,
        resume_text: &str,
    ) -> Result<ResumeSkillProfile, AiExtractionError> {
        let prompt = self.prompts.render_resume(resume_text);
        self.call_json(self.prompts.system(), &prompt).await
    }

    async fn extract_job_skills(
        &self,
        job_text: &str,
        job_title: Option<&str>,
    ) -> Result<JobSkillProfile, AiExtractionError> {
        let prompt = self.prompts.render_job(job_text, job_title);
        self.call_json(self.prompts.system(), &prompt).await
    }
}

fn completions_url(endpoint: &str) -> String {
    let endpoint = endpoint.trim().trim_end_matches('/');
    if endpoint.ends_with(CHAT_COMPLETIONS_PATH) {
        endpoint.to_string()
    } else {
        format!("{}{}", endpoint, CHAT_COMPLETIONS_PATH)
    }
}

/// Pull the first choice's content out of a chat completion body and decode it.
fn parse_chat_content<T: DeserializeOwned>(body: &str) -> Result<T, AiExtractionError> {
    let response: ChatResponse = serde_json::from_str(body)?;
    let content = response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .filter(|content| !content.trim().is_empty())
        .ok_or(AiExtractionError::EmptyContent)?;

    Ok(serde_json::from_str(strip_json_fences(&content))?)
}

/// Strips ```json ... ``` or ``` ... ``` fences some models wrap JSON in.
fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    let inner = text
        .strip_prefix("```json")
        .or_else(|| text.strip_prefix("```"));
    match inner {
        Some(stripped) => {
            let stripped = stripped.trim_start();
            stripped
                .strip_suffix("```")
                .map(str::trim)
                .unwrap_or(stripped)
        }
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MatcherError;
    use crate::skills::vocabulary::SkillVocabulary;
    use std::sync::Arc;

    fn normalizer() -> SkillNormalizer {
        SkillNormalizer::new(Arc::new(SkillVocabulary::builtin()))
    }

    fn chat_body(content: &str) -> String {
        serde_json::json!({"choices": [{"message": {"content": content}}]}).to_string()
    }

    #[test]
    fn test_strip_json_fences() {
        assert_eq!(strip_json_fences("```json\n{\"a\": 1}\n```"), "{\"a\": 1}");
        assert_eq!(strip_json_fences("```\n{\"a\": 1}\n```"), "{\"a\": 1}");
        assert_eq!(strip_json_fences("  {\"a\": 1} "), "{\"a\": 1}");
    }

    #[test]
    fn test_completions_url() {
        assert_eq!(
            completions_url("https://api.openai.com/v1/"),
            "https://api.openai.com/v1/chat/completions"
        );
        assert_eq!(
            completions_url("http://localhost:11434/v1/chat/completions"),
            "http://localhost:11434/v1/chat/completions"
        );
    }

    #[test]
    fn test_parse_resume_profile() {
        let body = chat_body(
            "```json\n{\"expert\": [\"JS\"], \"proficient\": [\"ReactJS\"], \"familiar\": [], \"experienceYears\": 6, \"seniority\": \"Senior\"}\n```",
        );
        let profile: ResumeSkillProfile = parse_chat_content(&body).unwrap();
        let skills = profile.skills(&normalizer());
        assert!(skills.contains("javascript"));
        assert!(skills.contains("react"));
        assert_eq!(profile.experience_years, Some(6.0));
        assert_eq!(profile.seniority_level(), Some(Seniority::Senior));
    }

    #[test]
    fn test_parse_job_profile_snake_case_shape() {
        let body = chat_body(
            r#"{"must_have_skills": ["k8s", "Go"], "good_to_have_skills": ["golang", "Kafka"]}"#,
        );
        let profile: JobSkillProfile = parse_chat_content(&body).unwrap();
        let requirement = profile.requirement(&normalizer());
        assert!(requirement.must_have().contains("kubernetes"));
        assert!(requirement.must_have().contains("go"));
        // "golang" normalizes to a must-have skill, so it is dropped from nice-to-have
        assert_eq!(requirement.nice_to_have().to_vec(), vec!["kafka".to_string()]);
    }

    #[test]
    fn test_empty_and_malformed_content() {
        let empty = serde_json::json!({"choices": [{"message": {"content": ""}}]}).to_string();
        assert!(matches!(
            parse_chat_content::<ResumeSkillProfile>(&empty),
            Err(AiExtractionError::EmptyContent)
        ));
        assert!(matches!(
            parse_chat_content::<ResumeSkillProfile>(&chat_body("not json")),
            Err(AiExtractionError::Parse(_))
        ));
        assert!(matches!(
            parse_chat_content::<ResumeSkillProfile>(r#"{"choices": []}"#),
            Err(AiExtractionError::EmptyContent)
        ));
    }

    #[test]
    fn test_ranked_keeps_highest_tier() {
        let profile = ResumeSkillProfile {
            expert: vec!["Rust".into()],
            familiar: vec!["rust".into(), "Docker".into()],
            ..Default::default()
        };
        let ranked = profile.ranked(&normalizer());
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].skill, "rust");
        assert!((ranked[0].confidence - 1.0).abs() < 1e-6);
        assert!((ranked[1].confidence - 0.4).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_an_error() {
        let extractor = HttpAiExtractor::new(
            "http://127.0.0.1:9/v1",
            "test-model",
            None,
            Duration::from_millis(500),
        )
        .unwrap();
        let err = extractor.extract_resume_skills("Rust").await.unwrap_err();
        assert!(matches!(MatcherError::from(err), MatcherError::Network(_)));
    }

    #[test]
    fn test_from_config_requires_named_key() {
        let config = AiConfig {
            enabled: true,
            api_key_env: "JOB_MATCHER_TEST_KEY_THAT_IS_NEVER_SET".to_string(),
            ..AiConfig::default()
        };
        let err = HttpAiExtractor::from_config(&config).err().unwrap();
        assert!(matches!(err, AiExtractionError::MissingApiKey(ref name) if name == &config.api_key_env));
        assert!(matches!(MatcherError::from(err), MatcherError::Configuration(_)));

        let keyless = AiConfig {
            api_key_env: String::new(),
            ..config
        };
        assert!(HttpAiExtractor::from_config(&keyless).is_ok());
    }

    #[test]
    fn test_bad_content_maps_to_extraction_error() {
        let err = MatcherError::from(AiExtractionError::EmptyContent);
        assert!(matches!(err, MatcherError::Extraction(_)));
    }
}
