//! Analysis service and the payload it produces

pub mod analyzer;
pub mod payload;

pub use analyzer::{AnalysisOutcome, AnalysisRequest, Analyzer};
pub use payload::{AnalysisMetadata, AnalysisPayload, CategoryScore, ExperienceSummary};
