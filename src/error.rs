use thiserror::Error;

/// Internal failure taxonomy. None of these escape the engine's two public
/// calls; they are absorbed into degraded defaults at the boundary.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("feature vector has length {got}, predictor expects {expected}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("model update produced non-finite parameters")]
    NumericalInstability,

    #[error("model has not been fitted yet")]
    NotFitted,

    #[error("empty training batch")]
    EmptyBatch,

    #[error("strategy weights must be non-negative and sum to 1.0, got {sum}")]
    InvalidStrategyWeights { sum: f64 },
}
