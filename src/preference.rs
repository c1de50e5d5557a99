//! Per-user affinity learning, decoupled from the regression predictors:
//! exponential moving averages over category ratings, time-of-day engagement
//! and (slowly) preferred difficulty.

use std::collections::HashMap;

use chrono::Utc;
use parking_lot::RwLock;

use crate::config::PreferenceParams;
use crate::types::{FeedbackEvent, UserPreferenceProfile};

/// One global lock serializes the read-modify-write EMA updates; contention
/// is low, one small map update per feedback event.
pub struct PreferenceStore {
    params: PreferenceParams,
    profiles: RwLock<HashMap<String, UserPreferenceProfile>>,
}

impl PreferenceStore {
    pub fn new(params: PreferenceParams) -> Self {
        Self {
            params,
            profiles: RwLock::new(HashMap::new()),
        }
    }

    /// Folds whatever signals the feedback carries into the user's profile;
    /// absent signals are skipped.
    pub fn update(&self, user_id: &str, feedback: &FeedbackEvent) {
        let mut profiles = self.profiles.write();
        let profile = profiles.entry(user_id.to_owned()).or_default();

        if let (Some(category), Some(rating)) = (&feedback.category, feedback.satisfaction_rating)
        {
            let alpha = self.params.category_alpha;
            let current = profile.category_weights.get(category).copied().unwrap_or(0.0);
            profile
                .category_weights
                .insert(category.clone(), (1.0 - alpha) * current + alpha * rating);
        }

        if let (Some(hour), Some(engagement)) = (feedback.hour_of_day, feedback.engagement_score) {
            let hour = hour % 24;
            let alpha = self.params.time_alpha;
            let current = profile.time_preferences.get(&hour).copied().unwrap_or(0.0);
            profile
                .time_preferences
                .insert(hour, (1.0 - alpha) * current + alpha * engagement);
        }

        // Difficulty preference only follows liked outcomes, and slowly.
        if let (Some(difficulty), Some(rating)) =
            (feedback.task_difficulty, feedback.satisfaction_rating)
        {
            if rating > self.params.liked_threshold {
                let alpha = self.params.difficulty_alpha;
                profile.difficulty_preference = ((1.0 - alpha) * profile.difficulty_preference
                    + alpha * difficulty)
                    .clamp(0.0, 1.0);
            }
        }

        profile.last_updated = Utc::now();
    }

    /// Get-or-create with neutral defaults; the returned profile is a copy.
    pub fn get(&self, user_id: &str) -> UserPreferenceProfile {
        if let Some(profile) = self.profiles.read().get(user_id) {
            return profile.clone();
        }
        self.profiles
            .write()
            .entry(user_id.to_owned())
            .or_default()
            .clone()
    }

    pub fn user_count(&self) -> usize {
        self.profiles.read().len()
    }

    pub fn snapshot(&self) -> HashMap<String, UserPreferenceProfile> {
        self.profiles.read().clone()
    }

    pub fn restore(&self, profiles: HashMap<String, UserPreferenceProfile>) {
        *self.profiles.write() = profiles;
    }
}
