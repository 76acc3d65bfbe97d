//! CLI interface for the job matcher

use crate::config::OutputFormat;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

/// Input files the matcher can read
pub const SUPPORTED_EXTENSIONS: &[&str] = &["txt", "md", "markdown"];

#[derive(Parser)]
#[command(name = "job-matcher")]
#[command(about = "Match a resume against a job posting by skills")]
#[command(
    long_about = "Extract skills from a resume and a job posting, score the overlap with weighted must-have / nice-to-have categories, and cache results per job URL, resume and posting text"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Analyze how well a resume matches a job posting
    Analyze {
        /// Path to resume file (TXT, MD)
        #[arg(short, long)]
        resume: PathBuf,

        /// Path to job description file (TXT, MD)
        #[arg(short, long)]
        job: PathBuf,

        /// URL of the job posting, used as the cache key
        #[arg(short, long)]
        url: String,

        /// Job title, passed to the AI extractor
        #[arg(short, long)]
        title: Option<String>,

        /// Recompute even if a cached analysis exists
        #[arg(short, long)]
        force: bool,

        /// Use dictionary extraction only
        #[arg(long)]
        no_ai: bool,

        /// Exact skill matching only
        #[arg(long)]
        no_fuzzy: bool,

        /// Output format: console, json, markdown
        #[arg(short, long)]
        output: Option<String>,

        /// Show per-category skill lists and ranked resume skills
        #[arg(short, long)]
        detailed: bool,

        /// Save output to file
        #[arg(short, long)]
        save: Option<PathBuf>,
    },

    /// Extract skills from a single file with the dictionary
    Extract {
        /// Path to a resume or job description (TXT, MD)
        #[arg(short, long)]
        file: PathBuf,

        /// Rank skills by confidence
        #[arg(long)]
        confidence: bool,

        /// Restrict to vocabulary categories (repeatable)
        #[arg(long = "category")]
        categories: Vec<String>,
    },

    /// Manage cached analyses
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },

    /// Show or change configuration
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },
}

#[derive(Subcommand)]
pub enum CacheAction {
    /// List cached analyses, newest first
    List {
        /// Only analyses of this job posting
        #[arg(short, long)]
        url: Option<String>,
    },

    /// Show a cached analysis
    Show {
        #[arg(short, long)]
        url: String,

        /// Resume file the analysis was made with
        #[arg(short, long)]
        resume: Option<PathBuf>,

        /// Job description file; without it only metadata is shown
        #[arg(short, long)]
        job: Option<PathBuf>,
    },

    /// Delete the analyses of one job posting and resume
    Delete {
        #[arg(short, long)]
        url: String,

        #[arg(short, long)]
        resume: Option<PathBuf>,
    },

    /// Delete every analysis of a job posting, for any resume
    Clear {
        #[arg(short, long)]
        url: String,
    },
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Reset configuration to defaults
    Reset,

    /// Set a configuration value
    Set {
        /// Configuration key (e.g., "matching.must_have_weight")
        key: String,

        /// Configuration value
        value: String,
    },
}

/// Parse and validate output format
pub fn parse_output_format(format: &str) -> Result<OutputFormat, String> {
    format.parse().map_err(|e: crate::error::MatcherError| e.to_string())
}

/// Validate file extension
pub fn validate_file_extension(path: &Path, allowed_extensions: &[&str]) -> Result<(), String> {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) => {
            if allowed_extensions.contains(&ext.to_lowercase().as_str()) {
                Ok(())
            } else {
                Err(format!(
                    "Unsupported file extension: .{}. Allowed: {}",
                    ext,
                    allowed_extensions.join(", ")
                ))
            }
        }
        None => Err("File has no extension".to_string()),
    }
}
