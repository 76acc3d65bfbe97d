//! Plain-text extraction from resume and job files

use crate::error::Result;
use pulldown_cmark::{Event, Parser, Tag};
use std::path::Path;
use tokio::fs;

pub trait TextExtractor {
    fn extract(&self, path: &Path) -> impl std::future::Future<Output = Result<String>> + Send;
}

pub struct PlainTextExtractor;

impl TextExtractor for PlainTextExtractor {
    async fn extract(&self, path: &Path) -> Result<String> {
        Ok(fs::read_to_string(path).await?)
    }
}

pub struct MarkdownExtractor;

impl TextExtractor for MarkdownExtractor {
    async fn extract(&self, path: &Path) -> Result<String> {
        let markdown = fs::read_to_string(path).await?;
        Ok(markdown_to_text(&markdown))
    }
}

/// Flatten markdown to text, one block per line.
///
/// Headings stay on their own line so section detection still sees them;
/// list items get a "- " prefix so they are never mistaken for headings.
pub fn markdown_to_text(markdown: &str) -> String {
    let mut out = String::new();

    for event in Parser::new(markdown) {
        match event {
            Event::Start(Tag::Item) => out.push_str("- "),
            Event::Text(text) | Event::Code(text) => out.push_str(&text),
            Event::SoftBreak | Event::HardBreak => out.push('\n'),
            Event::End(
                Tag::Paragraph
                | Tag::Heading(..)
                | Tag::Item
                | Tag::CodeBlock(_)
                | Tag::BlockQuote
                | Tag::TableRow,
            ) => {
                if !out.ends_with('\n') {
                    out.push('\n');
                }
            }
            Event::Rule => out.push('\n'),
            _ => {}
        }
    }

    out.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_markdown_to_text() {
        let md = "# Jane Doe\n\n## Skills\n\n- **Rust**, `tokio`\n- Docker\n\nBuilt *services* in Go.\n";
        let text = markdown_to_text(md);
        assert_eq!(text, "Jane Doe\nSkills\n- Rust, tokio\n- Docker\nBuilt services in Go.");
    }

    #[tokio::test]
    async fn test_extractors_read_files() {
        let dir = tempfile::tempdir().unwrap();
        let txt = dir.path().join("cv.txt");
        let md = dir.path().join("cv.md");
        std::fs::write(&txt, "Rust and Go").unwrap();
        std::fs::write(&md, "## Skills\n- Rust").unwrap();

        assert_eq!(PlainTextExtractor.extract(&txt).await.unwrap(), "Rust and Go");
        assert_eq!(MarkdownExtractor.extract(&md).await.unwrap(), "Skills\n- Rust");
    }
}
