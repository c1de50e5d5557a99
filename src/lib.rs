//! Adaptive, incrementally-trained recommendation core of the Cuddle Cat
//! companion app: three online predictors (mood delta, engagement,
//! satisfaction), EMA preference learning, and multi-objective candidate
//! scoring behind an opaque blob store.

pub mod cache;
pub mod config;
pub mod engine;
pub mod error;
pub mod features;
pub mod model;
pub mod persistence;
pub mod predictor;
pub mod preference;
pub mod seed;
pub mod types;

pub use config::{EngineConfig, StrategyWeights};
pub use engine::AdaptiveEngine;
pub use error::EngineError;
pub use types::{CandidateActivity, FeedbackEvent, RecommendationContext, ScoredCandidate};
