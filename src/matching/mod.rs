//! Matching engine: compares resume skills against job requirements

pub mod engine;

pub use engine::{MatchResult, MatchingEngine, SkillPairing, WeightedMatchResult, Weights};
