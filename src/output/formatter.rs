//! Output formatters for analysis results

use crate::analysis::payload::{AnalysisPayload, CategoryScore};
use crate::cache::store::CachedAnalysis;
use crate::config::OutputFormat;
use crate::error::{MatcherError, Result};
use crate::skills::extractor::RankedSkill;
use colored::{Color, Colorize};
use std::path::Path;

/// Renders an analysis payload as text
pub trait OutputFormatter {
    fn format_analysis(&self, payload: &AnalysisPayload) -> Result<String>;
    fn supports_format(&self) -> OutputFormat;
}

/// Console formatter with optional colors
pub struct ConsoleFormatter {
    use_colors: bool,
    detailed: bool,
}

/// JSON formatter for scripting and integration
pub struct JsonFormatter {
    pretty: bool,
}

/// Markdown formatter for saved reports
pub struct MarkdownFormatter {
    include_metadata: bool,
}

/// Picks the formatter for an output format
pub struct ReportGenerator {
    console_formatter: ConsoleFormatter,
    json_formatter: JsonFormatter,
    markdown_formatter: MarkdownFormatter,
}

const TOP_RANKED_SKILLS: usize = 10;

impl ConsoleFormatter {
    pub fn new(use_colors: bool, detailed: bool) -> Self {
        Self {
            use_colors,
            detailed,
        }
    }

    fn colorize(&self, text: &str, color: Color) -> String {
        if self.use_colors {
            text.color(color).to_string()
        } else {
            text.to_string()
        }
    }

    fn format_header(&self, title: &str, level: u8) -> String {
        let prefix = match level {
            1 => "█",
            2 => "▓",
            _ => "▒",
        };

        let color = match level {
            1 => Color::Blue,
            2 => Color::Green,
            _ => Color::Yellow,
        };

        if self.use_colors {
            format!("\n{} {}\n", prefix.color(color).bold(), title.color(color).bold())
        } else {
            format!("\n{} {}\n", prefix, title)
        }
    }

    fn format_score_badge(&self, score: u8) -> String {
        let (badge, color) = match score {
            90..=100 => ("EXCELLENT", Color::Green),
            80..=89 => ("VERY GOOD", Color::BrightGreen),
            70..=79 => ("GOOD", Color::Yellow),
            60..=69 => ("FAIR", Color::BrightYellow),
            50..=59 => ("BELOW AVG", Color::Red),
            _ => ("POOR", Color::BrightRed),
        };

        if self.use_colors {
            format!("[{}]", badge.color(color).bold())
        } else {
            format!("[{}]", badge)
        }
    }

    fn format_skill_list(&self, skills: &[String], color: Color) -> String {
        if skills.is_empty() {
            return "  (none)\n".to_string();
        }
        skills
            .iter()
            .map(|skill| format!("  • {}\n", self.colorize(skill, color)))
            .collect()
    }

    fn format_category(&self, title: &str, category: &CategoryScore) -> String {
        let mut output = self.format_header(title, 3);
        output.push_str(&format!(
            "Score: {}% (weight {:.2}, {} of {} skills)\n",
            category.match_percentage,
            category.weight,
            category.matched_skills.len(),
            category.required()
        ));
        if self.detailed {
            output.push_str(&self.format_skill_list(&category.matched_skills, Color::Green));
            for skill in &category.missing_skills {
                output.push_str(&format!("  ✗ {}\n", self.colorize(skill, Color::Red)));
            }
        }
        output
    }

    /// One line per cached record.
    pub fn format_cache_listing(&self, records: &[CachedAnalysis]) -> String {
        if records.is_empty() {
            return "No cached analyses.\n".to_string();
        }

        let mut output = self.format_header(&format!("Cached analyses ({})", records.len()), 2);
        for record in records {
            let score = record
                .analysis_data
                .get("weightedMatchPercentage")
                .or_else(|| record.analysis_data.get("matchPercentage"))
                .and_then(|v| v.as_u64())
                .map(|v| format!("{:>3}%", v))
                .unwrap_or_else(|| "  ?%".to_string());
            output.push_str(&format!(
                "{}  {}  {}\n    {}\n",
                record.metadata.saved_at.format("%Y-%m-%d %H:%M"),
                self.colorize(&score, Color::Cyan),
                record.url,
                record.key
            ));
        }
        output
    }
}

impl OutputFormatter for ConsoleFormatter {
    fn format_analysis(&self, payload: &AnalysisPayload) -> Result<String> {
        let mut output = String::new();

        output.push_str(&self.format_header("JOB MATCH ANALYSIS", 1));
        if let Some(title) = &payload.job_title {
            output.push_str(&format!("Role: {}\n", title));
        }
        output.push_str(&format!(
            "Generated: {} | Method: {}\n",
            payload.metadata.timestamp.format("%Y-%m-%d %H:%M:%S UTC"),
            payload.metadata.analysis_method.as_str()
        ));

        output.push_str(&self.format_header("Summary", 2));
        output.push_str(&format!(
            "Weighted Match: {}% {}\n",
            payload.weighted_match_percentage,
            self.format_score_badge(payload.weighted_match_percentage)
        ));
        output.push_str(&format!("Overall Skill Coverage: {}%\n", payload.match_percentage));

        output.push_str(&self.format_category("Must-have", &payload.must_have));
        output.push_str(&self.format_category("Nice-to-have", &payload.nice_to_have));

        output.push_str(&self.format_header("Matched Skills", 3));
        output.push_str(&self.format_skill_list(&payload.matched_skills, Color::Green));

        output.push_str(&self.format_header("Missing Skills", 3));
        output.push_str(&self.format_skill_list(&payload.missing_skills, Color::Red));

        output.push_str(&self.format_header("Additional Skills", 3));
        output.push_str(&self.format_skill_list(&payload.extra_skills, Color::Cyan));

        let experience = &payload.experience;
        if experience.resume_years.is_some() || experience.required_years.is_some() {
            output.push_str(&self.format_header("Experience", 3));
            output.push_str(&format!(
                "Resume: {} | Required: {}\n",
                years(experience.resume_years),
                years(experience.required_years)
            ));
        }

        if self.detailed && !payload.resume_skills.is_empty() {
            output.push_str(&self.format_header("Strongest Resume Skills", 3));
            output.push_str(&format_ranked(&payload.resume_skills));
        }

        Ok(output)
    }

    fn supports_format(&self) -> OutputFormat {
        OutputFormat::Console
    }
}

impl JsonFormatter {
    pub fn new(pretty: bool) -> Self {
        Self { pretty }
    }
}

impl OutputFormatter for JsonFormatter {
    fn format_analysis(&self, payload: &AnalysisPayload) -> Result<String> {
        if self.pretty {
            Ok(serde_json::to_string_pretty(payload)?)
        } else {
            Ok(serde_json::to_string(payload)?)
        }
    }

    fn supports_format(&self) -> OutputFormat {
        OutputFormat::Json
    }
}

impl MarkdownFormatter {
    pub fn new(include_metadata: bool) -> Self {
        Self { include_metadata }
    }

    fn markdown_score_badge(score: u8) -> &'static str {
        match score {
            90..=100 => "🟢 Excellent",
            80..=89 => "🟡 Very Good",
            70..=79 => "🟠 Good",
            60..=69 => "🔴 Fair",
            50..=59 => "🔴 Below Average",
            _ => "🔴 Poor",
        }
    }

    fn skill_bullets(skills: &[String]) -> String {
        if skills.is_empty() {
            return "_None_\n\n".to_string();
        }
        let mut output: String = skills.iter().map(|s| format!("- {}\n", s)).collect();
        output.push('\n');
        output
    }
}

impl OutputFormatter for MarkdownFormatter {
    fn format_analysis(&self, payload: &AnalysisPayload) -> Result<String> {
        let mut output = String::from("# Job Match Analysis\n\n");

        if let Some(title) = &payload.job_title {
            output.push_str(&format!("**Role:** {}\n\n", title));
        }
        if self.include_metadata {
            output.push_str(&format!(
                "**Generated:** {} | **Method:** `{}` | **Fuzzy matching:** {}\n\n",
                payload.metadata.timestamp.format("%Y-%m-%d %H:%M:%S UTC"),
                payload.metadata.analysis_method.as_str(),
                if payload.metadata.fuzzy { "on" } else { "off" }
            ));
        }

        output.push_str("## Summary\n\n");
        output.push_str(&format!(
            "**Weighted Match:** {}% {}\n\n",
            payload.weighted_match_percentage,
            Self::markdown_score_badge(payload.weighted_match_percentage)
        ));

        output.push_str("| Category | Score | Weight | Matched |\n");
        output.push_str("|----------|-------|--------|---------|\n");
        for (name, category) in [
            ("Must-have", &payload.must_have),
            ("Nice-to-have", &payload.nice_to_have),
        ] {
            output.push_str(&format!(
                "| {} | {}% | {:.2} | {}/{} |\n",
                name,
                category.match_percentage,
                category.weight,
                category.matched_skills.len(),
                category.required()
            ));
        }
        output.push_str(&format!(
            "| All skills | {}% | | |\n\n",
            payload.match_percentage
        ));

        output.push_str("## Matched Skills\n\n");
        output.push_str(&Self::skill_bullets(&payload.matched_skills));
        output.push_str("## Missing Skills\n\n");
        output.push_str(&Self::skill_bullets(&payload.missing_skills));
        output.push_str("## Additional Skills\n\n");
        output.push_str(&Self::skill_bullets(&payload.extra_skills));

        Ok(output)
    }

    fn supports_format(&self) -> OutputFormat {
        OutputFormat::Markdown
    }
}

impl ReportGenerator {
    pub fn new() -> Self {
        Self::with_options(true, false, true, true)
    }

    pub fn with_options(
        use_colors: bool,
        detailed: bool,
        pretty_json: bool,
        include_metadata: bool,
    ) -> Self {
        Self {
            console_formatter: ConsoleFormatter::new(use_colors, detailed),
            json_formatter: JsonFormatter::new(pretty_json),
            markdown_formatter: MarkdownFormatter::new(include_metadata),
        }
    }

    pub fn console(&self) -> &ConsoleFormatter {
        &self.console_formatter
    }

    pub fn generate(&self, payload: &AnalysisPayload, format: OutputFormat) -> Result<String> {
        match format {
            OutputFormat::Console => self.console_formatter.format_analysis(payload),
            OutputFormat::Json => self.json_formatter.format_analysis(payload),
            OutputFormat::Markdown => self.markdown_formatter.format_analysis(payload),
        }
    }
}

impl Default for ReportGenerator {
    fn default() -> Self {
        Self::new()
    }
}

/// Ranked skills as "skill (confidence)" lines
pub fn format_ranked(ranked: &[RankedSkill]) -> String {
    ranked
        .iter()
        .take(TOP_RANKED_SKILLS)
        .map(|r| format!("  {:<24} {:.2}\n", r.skill, r.confidence))
        .collect()
}

pub fn save_report_to_file(content: &str, file_path: &Path) -> Result<()> {
    if let Some(parent) = file_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(file_path, content).map_err(|e| {
        MatcherError::OutputFormatting(format!("Failed to write {}: {}", file_path.display(), e))
    })
}

fn years(value: Option<f32>) -> String {
    value
        .map(|y| format!("{} years", y))
        .unwrap_or_else(|| "n/a".to_string())
}
