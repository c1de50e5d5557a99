use serde::{Deserialize, Serialize};

use crate::error::EngineError;

const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

/// Blend weights over the three predictors plus the diversity term. Must be
/// non-negative and sum to 1.0; enforced at the update boundary
/// (`validate`), not re-checked on every scoring pass.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StrategyWeights {
    pub mood_based: f64,
    pub engagement_based: f64,
    pub satisfaction_based: f64,
    pub diversity: f64,
}

impl Default for StrategyWeights {
    fn default() -> Self {
        Self {
            mood_based: 0.3,
            engagement_based: 0.25,
            satisfaction_based: 0.25,
            diversity: 0.2,
        }
    }
}

impl StrategyWeights {
    pub fn validate(&self) -> Result<(), EngineError> {
        let parts = [
            self.mood_based,
            self.engagement_based,
            self.satisfaction_based,
            self.diversity,
        ];
        let sum: f64 = parts.iter().sum();
        if parts.iter().any(|w| !w.is_finite() || *w < 0.0)
            || (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE
        {
            return Err(EngineError::InvalidStrategyWeights { sum });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SgdParams {
    pub eta0: f64,
    pub learning_rate_decay: f64,
    pub l2: f64,
}

impl Default for SgdParams {
    fn default() -> Self {
        Self {
            eta0: 0.01,
            learning_rate_decay: 1e-3,
            l2: 1e-4,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictorConfig {
    pub buffer_capacity: usize,
    pub batch_threshold: usize,
    pub history_capacity: usize,
    pub confidence_window: usize,
    pub neutral_prediction: f64,
    pub default_confidence: f64,
    pub degraded_confidence: f64,
    pub min_confidence: f64,
    pub max_confidence: f64,
    pub sgd: SgdParams,
}

impl Default for PredictorConfig {
    fn default() -> Self {
        Self {
            buffer_capacity: 50,
            batch_threshold: 10,
            history_capacity: 100,
            confidence_window: 10,
            neutral_prediction: 3.0,
            default_confidence: 0.5,
            degraded_confidence: 0.3,
            min_confidence: 0.1,
            max_confidence: 0.95,
            sgd: SgdParams::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreferenceParams {
    pub category_alpha: f64,
    pub time_alpha: f64,
    pub difficulty_alpha: f64,
    pub liked_threshold: f64,
}

impl Default for PreferenceParams {
    fn default() -> Self {
        Self {
            category_alpha: 0.1,
            time_alpha: 0.1,
            difficulty_alpha: 0.05,
            liked_threshold: 3.0,
        }
    }
}

/// Preference-boost scales and clip bounds. Each term is clipped to its own
/// cap before summing; the sum is clipped to ±`total_cap`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoostParams {
    pub category_scale: f64,
    pub category_cap: f64,
    pub time_scale: f64,
    pub time_cap: f64,
    pub difficulty_scale: f64,
    pub difficulty_cap: f64,
    pub total_cap: f64,
}

impl Default for BoostParams {
    fn default() -> Self {
        Self {
            category_scale: 0.2,
            category_cap: 0.2,
            time_scale: 0.1,
            time_cap: 0.1,
            difficulty_scale: 0.1,
            difficulty_cap: 0.1,
            total_cap: 0.3,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiversityParams {
    pub novel_score: f64,
    pub repeat_score: f64,
}

impl Default for DiversityParams {
    fn default() -> Self {
        Self {
            novel_score: 1.0,
            repeat_score: 0.3,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedParams {
    pub samples: usize,
    pub epochs: usize,
    pub rng_seed: u64,
}

impl Default for SeedParams {
    fn default() -> Self {
        Self {
            samples: 100,
            epochs: 8,
            rng_seed: 42,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    pub strategy: StrategyWeights,
    pub predictor: PredictorConfig,
    pub preference: PreferenceParams,
    pub boost: BoostParams,
    pub diversity: DiversityParams,
    pub seed: SeedParams,
}

impl EngineConfig {
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("ADAPTIVE_BATCH_THRESHOLD") {
            if let Ok(parsed) = val.parse() {
                config.predictor.batch_threshold = parsed;
            }
        }
        if let Ok(val) = std::env::var("ADAPTIVE_BUFFER_CAPACITY") {
            if let Ok(parsed) = val.parse() {
                config.predictor.buffer_capacity = parsed;
            }
        }
        if let Ok(val) = std::env::var("ADAPTIVE_SGD_ETA0") {
            if let Ok(parsed) = val.parse() {
                config.predictor.sgd.eta0 = parsed;
            }
        }
        if let Ok(val) = std::env::var("ADAPTIVE_SEED_SAMPLES") {
            if let Ok(parsed) = val.parse() {
                config.seed.samples = parsed;
            }
        }

        config
    }
}
