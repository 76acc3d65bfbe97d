//! job-matcher: skill-based resume and job posting matching

use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use job_matcher::analysis::{AnalysisPayload, AnalysisRequest, Analyzer};
use job_matcher::cache::{AnalysisStore, ResumeIdentity};
use job_matcher::cli::{self, CacheAction, Cli, Commands, ConfigAction, SUPPORTED_EXTENSIONS};
use job_matcher::config::Config;
use job_matcher::input::InputManager;
use job_matcher::output::formatter::{format_ranked, save_report_to_file};
use job_matcher::output::ReportGenerator;
use job_matcher::skills::extractor::{detect_experience_years, detect_seniority, DictionaryExtractor};
use job_matcher::{MatcherError, Result};
use log::{error, info};
use std::path::Path;
use std::process;
use std::sync::Arc;
use std::time::Duration;

/// Exit code when the inputs contain no recognizable skills
const EXIT_INSUFFICIENT_INPUT: i32 = 2;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    let config_path = cli.config.clone().unwrap_or_else(Config::config_path);
    // config subcommands must work on a file that fails validation
    let loaded = match &cli.command {
        Commands::Config {
            action: Some(ConfigAction::Reset),
        } => Ok(Config::default()),
        Commands::Config { .. } => Config::load_lenient(&config_path),
        _ => Config::load_from(&config_path),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            process::exit(1);
        }
    };

    match run_command(cli.command, config, &config_path).await {
        Ok(()) => {}
        Err(MatcherError::InsufficientInput(msg)) => {
            eprintln!("Not enough information to match: {}", msg);
            eprintln!("Check that both files list concrete skills or technologies.");
            process::exit(EXIT_INSUFFICIENT_INPUT);
        }
        Err(e) => {
            error!("Command failed: {}", e);
            process::exit(1);
        }
    }
}

async fn run_command(command: Commands, config: Config, config_path: &Path) -> Result<()> {
    match command {
        Commands::Analyze {
            resume,
            job,
            url,
            title,
            force,
            no_ai,
            no_fuzzy,
            output,
            detailed,
            save,
        } => {
            cli::validate_file_extension(&resume, SUPPORTED_EXTENSIONS)
                .map_err(|e| MatcherError::InvalidInput(format!("Resume file: {}", e)))?;
            cli::validate_file_extension(&job, SUPPORTED_EXTENSIONS)
                .map_err(|e| MatcherError::InvalidInput(format!("Job description file: {}", e)))?;

            let format = match output {
                Some(format) => cli::parse_output_format(&format).map_err(MatcherError::InvalidInput)?,
                None => config.output.format,
            };

            let mut config = config;
            if no_ai {
                config.ai.enabled = false;
            }
            if no_fuzzy {
                config.matching.fuzzy = false;
            }

            let input = InputManager::new();
            let resume_doc = input.read(&resume).await?;
            let job_text = input.read_text(&job).await?;

            let analyzer = Analyzer::from_config(&config)?;

            let mut request = AnalysisRequest::new(&url, resume_doc.text, job_text)
                .with_resume_identity(resume_doc.identity)
                .force(force);
            if let Some(title) = title {
                request = request.with_title(title);
            }

            info!("Analyzing {} against {}", resume.display(), url);
            let spinner = spinner("Extracting and matching skills...");
            let outcome = analyzer.analyze(&request).await;
            spinner.finish_and_clear();
            let outcome = outcome?;

            if outcome.from_cache {
                info!("Using cached analysis (pass --force to recompute)");
            }

            let generator = ReportGenerator::with_options(
                config.output.color_output && save.is_none(),
                detailed || config.output.detailed,
                true,
                true,
            );
            let report = generator.generate(&outcome.payload, format)?;

            match save {
                Some(path) => {
                    save_report_to_file(&report, &path)?;
                    println!("Report saved to {}", path.display());
                }
                None => println!("{}", report),
            }
        }

        Commands::Extract {
            file,
            confidence,
            categories,
        } => {
            let text = InputManager::new().read_text(&file).await?;

            let mut options = config.extraction_options();
            if !categories.is_empty() {
                options.categories = Some(categories);
            }

            let extractor = DictionaryExtractor::new(Arc::new(config.load_vocabulary()?))?;

            println!("Skills found in {}:", file.display());
            if confidence {
                let ranked = extractor.extract_with_confidence(&text, &options)?;
                if ranked.is_empty() {
                    println!("  (none)");
                } else {
                    print!("{}", format_ranked(&ranked));
                }
            } else {
                let skills = extractor.extract(&text, &options)?;
                if skills.is_empty() {
                    println!("  (none)");
                }
                for skill in skills.iter() {
                    println!("  • {}", skill);
                }
            }

            if let Some(years) = detect_experience_years(&text) {
                println!("Experience: {} years", years);
            }
            if let Some(level) = detect_seniority(&text) {
                println!("Seniority: {:?}", level);
            }
        }

        Commands::Cache { action } => {
            let store = AnalysisStore::file(&config.storage.cache_dir);
            let console = ReportGenerator::with_options(config.output.color_output, true, true, true);

            match action {
                CacheAction::List { url } => {
                    let records = match url {
                        Some(url) => store.list_for_job(&url).await,
                        None => store.list_all().await,
                    };
                    print!("{}", console.console().format_cache_listing(&records));
                }

                CacheAction::Show { url, resume, job } => {
                    let identity = resume_identity(resume.as_deref())?;

                    match job {
                        Some(job) => {
                            let job_text = InputManager::new().read_text(&job).await?;
                            let Some(record) =
                                store.load(&url, identity.as_ref(), Some(&job_text)).await
                            else {
                                println!("No cached analysis for {}", url);
                                return Ok(());
                            };
                            let payload: AnalysisPayload =
                                serde_json::from_value(record.analysis_data)?;
                            println!(
                                "{}",
                                console.generate(&payload, config.output.format)?
                            );
                        }
                        None => match store.exists(&url, identity.as_ref()).await {
                            Some(info) => {
                                println!("Cached analysis for {}", info.url);
                                println!("  Key:      {}", info.key);
                                println!("  Created:  {}", info.timestamp.to_rfc3339());
                                println!("  Saved:    {}", info.saved_at.to_rfc3339());
                                println!("  Version:  {}", info.version);
                                println!("Pass --job to show the full analysis.");
                            }
                            None => println!("No cached analysis for {}", url),
                        },
                    }
                }

                CacheAction::Delete { url, resume } => {
                    let identity = resume_identity(resume.as_deref())?;
                    if store.delete(&url, identity.as_ref()).await {
                        println!("Deleted cached analysis for {}", url);
                    } else {
                        println!("No cached analysis for {}", url);
                    }
                }

                CacheAction::Clear { url } => {
                    let removed = store.clear_for_job(&url).await;
                    println!("Removed {} cached analyses for {}", removed, url);
                }
            }
        }

        Commands::Config { action } => match action {
            Some(ConfigAction::Show) | None => {
                let rendered = toml::to_string_pretty(&config).map_err(|e| {
                    MatcherError::Configuration(format!("Failed to render config: {}", e))
                })?;
                println!("# {}\n", config_path.display());
                println!("{}", rendered);
            }

            Some(ConfigAction::Reset) => {
                Config::default().save_to(config_path)?;
                println!("Configuration reset to defaults ({})", config_path.display());
            }

            Some(ConfigAction::Set { key, value }) => {
                let mut config = config;
                config.set(&key, &value)?;
                config.save_to(config_path)?;
                println!("Set {} = {}", key, value);
            }
        },
    }

    Ok(())
}

fn resume_identity(path: Option<&Path>) -> Result<Option<ResumeIdentity>> {
    path.map(|p| ResumeIdentity::from_path(p).map_err(MatcherError::from))
        .transpose()
}

fn spinner(message: &str) -> ProgressBar {
    let bar = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
        bar.set_style(style);
    }
    bar.set_message(message.to_string());
    bar.enable_steady_tick(Duration::from_millis(100));
    bar
}
