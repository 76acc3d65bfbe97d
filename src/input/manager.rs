//! Input manager: routes files to the right extractor

use crate::cache::key::ResumeIdentity;
use crate::error::{MatcherError, Result};
use crate::input::file_detector::FileType;
use crate::input::text_extractor::{MarkdownExtractor, PlainTextExtractor, TextExtractor};
use log::info;
use std::path::Path;

/// Text of an input file plus the identity used to segment cached analyses.
#[derive(Debug, Clone, PartialEq)]
pub struct InputDocument {
    pub text: String,
    pub identity: ResumeIdentity,
}

#[derive(Debug, Default)]
pub struct InputManager;

impl InputManager {
    pub fn new() -> Self {
        Self
    }

    pub async fn read(&self, path: &Path) -> Result<InputDocument> {
        if !path.exists() {
            return Err(MatcherError::InvalidInput(format!(
                "File does not exist: {}",
                path.display()
            )));
        }

        let text = match FileType::from_path(path) {
            FileType::Text => {
                info!("Reading plain text file: {}", path.display());
                PlainTextExtractor.extract(path).await?
            }
            FileType::Markdown => {
                info!("Processing markdown file: {}", path.display());
                MarkdownExtractor.extract(path).await?
            }
            FileType::Unknown => {
                return Err(MatcherError::UnsupportedFormat(format!(
                    "{} (supported: txt, md)",
                    path.display()
                )));
            }
        };

        let identity = ResumeIdentity::from_path(path)?;
        Ok(InputDocument { text, identity })
    }

    pub async fn read_text(&self, path: &Path) -> Result<String> {
        Ok(self.read(path).await?.text)
    }
}
