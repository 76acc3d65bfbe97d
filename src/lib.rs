//! Job matcher library: skill extraction, weighted resume/job matching and
//! cached analysis results

pub mod analysis;
pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod extraction;
pub mod input;
pub mod matching;
pub mod output;
pub mod skills;

pub use analysis::{AnalysisOutcome, AnalysisPayload, AnalysisRequest, Analyzer};
pub use cache::{AnalysisStore, CacheKey, ResumeIdentity};
pub use config::Config;
pub use error::{MatcherError, Result};
pub use matching::{MatchingEngine, Weights};
pub use skills::{JobRequirement, SkillSet, SkillVocabulary};
