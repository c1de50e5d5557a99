//! Builds the fixed-order numeric vectors consumed by the predictors.
//!
//! Slot layout (length 10): hour_of_day, day_of_week, weather_score,
//! current_mood, stress_level, energy_level, social_context, task_difficulty,
//! task_duration, category_affinity.
//!
//! Missing inputs fall back to documented defaults and the builders never
//! fail; feedback arrives from untrusted, partially-filled client payloads.

use chrono::{DateTime, Datelike, Timelike, Utc};

use crate::types::{CandidateActivity, FeatureVector, FeedbackEvent, RecommendationContext};

pub const DEFAULT_WEATHER_SCORE: f64 = 3.0;
pub const DEFAULT_MOOD: f64 = 3.0;
pub const DEFAULT_STRESS: f64 = 3.0;
pub const DEFAULT_ENERGY: f64 = 3.0;
pub const DEFAULT_SOCIAL_CONTEXT: f64 = 0.0;
pub const DEFAULT_DIFFICULTY: f64 = 0.5;
pub const DEFAULT_DURATION_MINUTES: f64 = 15.0;
pub const DEFAULT_CATEGORY_AFFINITY: f64 = 0.5;

/// Features of a feedback event, used when routing targets to predictors.
pub fn feedback_features(
    feedback: &FeedbackEvent,
    category_affinity: f64,
    now: DateTime<Utc>,
) -> FeatureVector {
    FeatureVector::new(vec![
        feedback.hour_of_day.unwrap_or_else(|| now.hour()) as f64,
        feedback
            .day_of_week
            .unwrap_or_else(|| now.weekday().num_days_from_monday()) as f64,
        feedback.weather_score.unwrap_or(DEFAULT_WEATHER_SCORE),
        feedback.current_mood.unwrap_or(DEFAULT_MOOD),
        feedback.stress_level.unwrap_or(DEFAULT_STRESS),
        feedback.energy_level.unwrap_or(DEFAULT_ENERGY),
        feedback.social_context.unwrap_or(DEFAULT_SOCIAL_CONTEXT),
        feedback.task_difficulty.unwrap_or(DEFAULT_DIFFICULTY),
        feedback.task_duration.unwrap_or(DEFAULT_DURATION_MINUTES),
        category_affinity,
    ])
}

/// Features of one candidate under the current context, used for scoring.
pub fn candidate_features(
    context: &RecommendationContext,
    candidate: &CandidateActivity,
    category_affinity: f64,
    now: DateTime<Utc>,
) -> FeatureVector {
    FeatureVector::new(vec![
        context.hour_of_day.unwrap_or_else(|| now.hour()) as f64,
        context
            .day_of_week
            .unwrap_or_else(|| now.weekday().num_days_from_monday()) as f64,
        context.weather_score.unwrap_or(DEFAULT_WEATHER_SCORE),
        context.current_mood.unwrap_or(DEFAULT_MOOD),
        context.stress_level.unwrap_or(DEFAULT_STRESS),
        context.energy_level.unwrap_or(DEFAULT_ENERGY),
        context.social_context.unwrap_or(DEFAULT_SOCIAL_CONTEXT),
        candidate.difficulty,
        candidate.estimated_duration,
        category_affinity,
    ])
}
