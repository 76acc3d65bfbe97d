//! Configuration management for the job matcher

use crate::error::{MatcherError, Result};
use crate::matching::engine::Weights;
use crate::skills::extractor::ExtractionOptions;
use crate::skills::matcher::DEFAULT_SIMILARITY_THRESHOLD;
use crate::skills::requirements::DEFAULT_MUST_HAVE_RATIO;
use crate::skills::vocabulary::SkillVocabulary;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const APP_DIR: &str = "job-matcher";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub matching: MatchingConfig,
    pub extraction: ExtractionConfig,
    pub ai: AiConfig,
    pub storage: StorageConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchingConfig {
    pub fuzzy: bool,
    pub must_have_weight: f64,
    pub nice_to_have_weight: f64,
    /// Levenshtein similarity a pair must exceed to match
    pub similarity_threshold: f64,
    /// Share of uncued job skills, by first mention, treated as must-have
    pub must_have_position_ratio: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    pub case_sensitive: bool,
    pub include_variations: bool,
    pub min_word_length: usize,
    pub categories: Option<Vec<String>>,
    /// TOML vocabulary replacing the built-in one
    pub vocabulary_path: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AiConfig {
    pub enabled: bool,
    /// Base URL of an OpenAI-compatible API
    pub endpoint: String,
    pub model: String,
    /// Name of the environment variable holding the API key; blank for
    /// endpoints that take none
    pub api_key_env: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub enabled: bool,
    pub cache_dir: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub format: OutputFormat,
    pub detailed: bool,
    pub color_output: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Console,
    Json,
    Markdown,
}

impl std::str::FromStr for OutputFormat {
    type Err = MatcherError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "console" => Ok(OutputFormat::Console),
            "json" => Ok(OutputFormat::Json),
            "markdown" | "md" => Ok(OutputFormat::Markdown),
            _ => Err(MatcherError::InvalidInput(format!(
                "Invalid output format: {}. Supported: console, json, markdown",
                s
            ))),
        }
    }
}

impl Default for MatchingConfig {
    fn default() -> Self {
        let weights = Weights::default();
        Self {
            fuzzy: true,
            must_have_weight: weights.must_have,
            nice_to_have_weight: weights.nice_to_have,
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
            must_have_position_ratio: DEFAULT_MUST_HAVE_RATIO,
        }
    }
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        let options = ExtractionOptions::default();
        Self {
            case_sensitive: options.case_sensitive,
            include_variations: options.include_variations,
            min_word_length: options.min_word_length,
            categories: options.categories,
            vocabulary_path: None,
        }
    }
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            endpoint: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            timeout_secs: 30,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        let cache_dir = dirs::data_dir()
            .unwrap_or_else(|| dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
            .join(APP_DIR)
            .join("analyses");

        Self {
            enabled: true,
            cache_dir,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::Console,
            detailed: false,
            color_output: true,
        }
    }
}

impl Config {
    /// Load from the default location, writing defaults there on first use.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let config = Self::read_from(path)?;
        config.validate()?;
        Ok(config)
    }

    /// Like `load_from`, but an out-of-range value only warns, so the file
    /// can still be shown and repaired with `set`.
    pub fn load_lenient(path: &Path) -> Result<Self> {
        let config = Self::read_from(path)?;
        if let Err(e) = config.validate() {
            log::warn!("{} has invalid settings: {}", path.display(), e);
        }
        Ok(config)
    }

    fn read_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            toml::from_str(&content).map_err(|e| {
                MatcherError::Configuration(format!("Failed to parse {}: {}", path.display(), e))
            })
        } else {
            let config = Self::default();
            config.save_to(path)?;
            Ok(config)
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self).map_err(|e| {
            MatcherError::Configuration(format!("Failed to serialize config: {}", e))
        })?;

        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
            .join(APP_DIR)
            .join("config.toml")
    }

    pub fn weights(&self) -> Result<Weights> {
        Weights::new(self.matching.must_have_weight, self.matching.nice_to_have_weight)
    }

    pub fn extraction_options(&self) -> ExtractionOptions {
        ExtractionOptions {
            case_sensitive: self.extraction.case_sensitive,
            include_variations: self.extraction.include_variations,
            min_word_length: self.extraction.min_word_length,
            categories: self.extraction.categories.clone(),
        }
    }

    /// The configured vocabulary file, or the built-in tables.
    pub fn load_vocabulary(&self) -> Result<SkillVocabulary> {
        match &self.extraction.vocabulary_path {
            Some(path) => {
                log::info!("Loading skill vocabulary from {}", path.display());
                SkillVocabulary::load(path)
            }
            None => Ok(SkillVocabulary::builtin()),
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.weights()
            .map_err(|e| MatcherError::Configuration(e.to_string()))?;

        let unit = |name: &str, value: f64| {
            if (0.0..=1.0).contains(&value) {
                Ok(())
            } else {
                Err(MatcherError::Configuration(format!(
                    "{} must be between 0 and 1 (got {})",
                    name, value
                )))
            }
        };
        unit("matching.similarity_threshold", self.matching.similarity_threshold)?;
        unit(
            "matching.must_have_position_ratio",
            self.matching.must_have_position_ratio,
        )?;

        if self.ai.timeout_secs == 0 {
            return Err(MatcherError::Configuration(
                "ai.timeout_secs must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Set a dotted key such as `matching.must_have_weight` from its string form.
    /// The change is validated; on error the config is left untouched.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let mut updated = self.clone();
        {
            let c = &mut updated;
            match key {
                "matching.fuzzy" => c.matching.fuzzy = parse(key, value)?,
                "matching.must_have_weight" => c.matching.must_have_weight = parse(key, value)?,
                "matching.nice_to_have_weight" => {
                    c.matching.nice_to_have_weight = parse(key, value)?
                }
                "matching.similarity_threshold" => {
                    c.matching.similarity_threshold = parse(key, value)?
                }
                "matching.must_have_position_ratio" => {
                    c.matching.must_have_position_ratio = parse(key, value)?
                }
                "extraction.case_sensitive" => c.extraction.case_sensitive = parse(key, value)?,
                "extraction.include_variations" => {
                    c.extraction.include_variations = parse(key, value)?
                }
                "extraction.min_word_length" => c.extraction.min_word_length = parse(key, value)?,
                "extraction.categories" => {
                    let categories: Vec<String> = value
                        .split(',')
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty())
                        .collect();
                    c.extraction.categories = (!categories.is_empty()).then_some(categories);
                }
                "extraction.vocabulary_path" => {
                    c.extraction.vocabulary_path =
                        (!value.trim().is_empty()).then(|| PathBuf::from(value.trim()))
                }
                "ai.enabled" => c.ai.enabled = parse(key, value)?,
                "ai.endpoint" => c.ai.endpoint = value.trim().to_string(),
                "ai.model" => c.ai.model = value.trim().to_string(),
                "ai.api_key_env" => c.ai.api_key_env = value.trim().to_string(),
                "ai.timeout_secs" => c.ai.timeout_secs = parse(key, value)?,
                "storage.enabled" => c.storage.enabled = parse(key, value)?,
                "storage.cache_dir" => c.storage.cache_dir = PathBuf::from(value.trim()),
                "output.format" => c.output.format = value.parse()?,
                "output.detailed" => c.output.detailed = parse(key, value)?,
                "output.color_output" => c.output.color_output = parse(key, value)?,
                _ => {
                    return Err(MatcherError::Configuration(format!(
                        "Unknown configuration key: {}",
                        key
                    )))
                }
            }
        }

        updated.validate()?;
        *self = updated;
        Ok(())
    }
}

fn parse<T: std::str::FromStr>(key: &str, value: &str) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    value.trim().parse().map_err(|e: T::Err| {
        MatcherError::Configuration(format!("Invalid value for {}: {} ({})", key, value, e))
    })
}
