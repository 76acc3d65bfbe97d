//! Error handling for the job matcher

use crate::extraction::ai::AiExtractionError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MatcherError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("File format not supported: {0}")]
    UnsupportedFormat(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// No skills could be found in the input at all, as opposed to a zero overlap.
    #[error("Insufficient input: {0}")]
    InsufficientInput(String),

    #[error("Skill extraction error: {0}")]
    Extraction(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Processing error: {0}")]
    Processing(String),

    #[error("Output formatting error: {0}")]
    OutputFormatting(String),
}

pub type Result<T> = std::result::Result<T, MatcherError>;

/// Convert anyhow errors to our custom error type
impl From<anyhow::Error> for MatcherError {
    fn from(err: anyhow::Error) -> Self {
        MatcherError::Processing(err.to_string())
    }
}

impl From<toml::de::Error> for MatcherError {
    fn from(err: toml::de::Error) -> Self {
        MatcherError::Configuration(err.to_string())
    }
}

impl From<regex::Error> for MatcherError {
    fn from(err: regex::Error) -> Self {
        MatcherError::Processing(format!("Invalid pattern: {}", err))
    }
}

impl From<AiExtractionError> for MatcherError {
    fn from(err: AiExtractionError) -> Self {
        match err {
            AiExtractionError::MissingApiKey(_) => MatcherError::Configuration(err.to_string()),
            AiExtractionError::Http(_)
            | AiExtractionError::Api { .. }
            | AiExtractionError::Timeout(_) => MatcherError::Network(err.to_string()),
            AiExtractionError::Parse(_) | AiExtractionError::EmptyContent => {
                MatcherError::Extraction(err.to_string())
            }
        }
    }
}
