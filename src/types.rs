use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::StrategyWeights;

/// Slot layout length shared by the three recommendation predictors; see
/// `features` for the slot order.
pub const RECOMMENDATION_FEATURE_DIM: usize = 10;

/// Fixed-order numeric features. Order and length are a contract between the
/// builder and the predictor; a mismatched length is rejected at the scaler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    pub values: Vec<f64>,
}

impl FeatureVector {
    pub fn new(values: Vec<f64>) -> Self {
        Self { values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingSample {
    pub features: FeatureVector,
    pub target: f64,
    pub user_id: Option<String>,
    pub weight: f64,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PredictorKind {
    Mood,
    Engagement,
    Satisfaction,
}

impl PredictorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PredictorKind::Mood => "mood",
            PredictorKind::Engagement => "engagement",
            PredictorKind::Satisfaction => "satisfaction",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetKind {
    Regression,
    Classification,
}

/// One entry of the rolling performance history: MSE for regression,
/// accuracy for classification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerformancePoint {
    pub metric: f64,
    pub timestamp: DateTime<Utc>,
}

/// Feedback arrives from untrusted, partially-filled client payloads; every
/// signal is optional and absent signals are skipped, never rejected. A
/// single event may update zero, one, two, or all three predictors.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FeedbackEvent {
    pub mood_before: Option<f64>,
    pub mood_after: Option<f64>,
    pub engagement_score: Option<f64>,
    pub satisfaction_rating: Option<f64>,
    pub category: Option<String>,
    pub hour_of_day: Option<u32>,
    pub day_of_week: Option<u32>,
    pub weather_score: Option<f64>,
    pub current_mood: Option<f64>,
    pub stress_level: Option<f64>,
    pub energy_level: Option<f64>,
    pub social_context: Option<f64>,
    pub task_difficulty: Option<f64>,
    pub task_duration: Option<f64>,
}

impl FeedbackEvent {
    /// Mood improvement, available only when both endpoints were reported.
    pub fn mood_delta(&self) -> Option<f64> {
        match (self.mood_before, self.mood_after) {
            (Some(before), Some(after)) => Some(after - before),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RecommendationContext {
    pub hour_of_day: Option<u32>,
    pub day_of_week: Option<u32>,
    pub weather_score: Option<f64>,
    pub current_mood: Option<f64>,
    pub stress_level: Option<f64>,
    pub energy_level: Option<f64>,
    pub social_context: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateActivity {
    pub name: String,
    pub category: String,
    pub difficulty: f64,
    pub estimated_duration: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoredCandidate {
    pub activity: CandidateActivity,
    pub final_score: f64,
    pub mood_prediction: f64,
    pub engagement_prediction: f64,
    pub satisfaction_prediction: f64,
    pub confidence: f64,
}

/// Lightweight per-user affinities, one profile per user id, created lazily
/// on first access and updated via EMA. Lifecycle (deletion) is owned by the
/// caller, not this core.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPreferenceProfile {
    pub category_weights: HashMap<String, f64>,
    pub time_preferences: HashMap<u32, f64>,
    pub difficulty_preference: f64,
    pub social_preference: f64,
    pub last_updated: DateTime<Utc>,
}

impl Default for UserPreferenceProfile {
    fn default() -> Self {
        Self {
            category_weights: HashMap::new(),
            time_preferences: HashMap::new(),
            difficulty_preference: 0.5,
            social_preference: 0.5,
            last_updated: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictorInfo {
    pub kind: PredictorKind,
    pub target: TargetKind,
    pub is_initialized: bool,
    pub sample_count: u64,
    pub version: String,
    pub last_update: DateTime<Utc>,
    pub buffer_len: usize,
    pub history_len: usize,
    pub latest_metric: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineStats {
    pub mood_predictor: PredictorInfo,
    pub engagement_predictor: PredictorInfo,
    pub satisfaction_predictor: PredictorInfo,
    pub total_users: usize,
    pub strategy_weights: StrategyWeights,
}
