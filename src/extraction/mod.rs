//! Skill extraction: external AI extractor with dictionary fallback

pub mod ai;
pub mod pipeline;
pub mod prompts;

pub use ai::{AiExtractionError, AiSkillExtractor, HttpAiExtractor, JobSkillProfile, ResumeSkillProfile};
pub use pipeline::{Extraction, ExtractionMethod, ExtractionPipeline, JobSkills, ResumeSkills};
