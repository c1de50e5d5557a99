//! The public entry point: three incremental predictors blended with
//! per-user preference weights to rank candidate activities, and the
//! feedback path that keeps all of them learning. Both public calls are
//! total functions; every internal failure degrades to a neutral default
//! instead of surfacing, because on a user-facing recommendation path a hard
//! failure is worse than a mediocre fallback.

use std::sync::Arc;

use chrono::{Timelike, Utc};
use parking_lot::RwLock;

use crate::cache::BlobStore;
use crate::config::{EngineConfig, StrategyWeights};
use crate::error::EngineError;
use crate::features;
use crate::persistence::{CachedRecentCategories, EnginePersistence, RecentCategoryTracker};
use crate::predictor::IncrementalPredictor;
use crate::preference::PreferenceStore;
use crate::types::{
    CandidateActivity, EngineStats, FeedbackEvent, PredictorKind, RecommendationContext,
    ScoredCandidate, UserPreferenceProfile,
};

pub struct AdaptiveEngine {
    config: EngineConfig,
    strategy: RwLock<StrategyWeights>,
    mood: IncrementalPredictor,
    engagement: IncrementalPredictor,
    satisfaction: IncrementalPredictor,
    preferences: PreferenceStore,
    persistence: Option<EnginePersistence>,
    recent_categories: Option<Arc<dyn RecentCategoryTracker>>,
}

impl AdaptiveEngine {
    /// Memory-only engine; predictors are seeded from synthetic priors so
    /// they answer from a model on the first request.
    pub fn new(config: EngineConfig) -> Self {
        let engine = Self::build(config, None, None);
        engine.seed_cold_predictors();
        engine
    }

    /// Engine backed by a blob store: persisted predictor and preference
    /// state is loaded first, synthetic seeding covers whatever is missing,
    /// and the store doubles as the recent-category source for the
    /// diversity term.
    pub async fn with_store(config: EngineConfig, store: Arc<dyn BlobStore>) -> Self {
        let persistence = EnginePersistence::new(Arc::clone(&store));
        let recent =
            Arc::new(CachedRecentCategories::new(store)) as Arc<dyn RecentCategoryTracker>;
        let engine = Self::build(config, Some(persistence), Some(recent));
        engine.load().await;
        engine.seed_cold_predictors();
        engine.flush().await;
        engine
    }

    fn build(
        config: EngineConfig,
        persistence: Option<EnginePersistence>,
        recent_categories: Option<Arc<dyn RecentCategoryTracker>>,
    ) -> Self {
        Self {
            strategy: RwLock::new(config.strategy),
            mood: IncrementalPredictor::new(PredictorKind::Mood, config.predictor.clone()),
            engagement: IncrementalPredictor::new(
                PredictorKind::Engagement,
                config.predictor.clone(),
            ),
            satisfaction: IncrementalPredictor::new(
                PredictorKind::Satisfaction,
                config.predictor.clone(),
            ),
            preferences: PreferenceStore::new(config.preference.clone()),
            persistence,
            recent_categories,
            config,
        }
    }

    fn predictors(&self) -> [&IncrementalPredictor; 3] {
        [&self.mood, &self.engagement, &self.satisfaction]
    }

    fn seed_cold_predictors(&self) {
        for predictor in self.predictors() {
            if let Err(err) = predictor.seed_with_synthetic(&self.config.seed) {
                tracing::warn!(
                    kind = predictor.kind().as_str(),
                    error = %err,
                    "synthetic seeding failed"
                );
            }
        }
    }

    /// Restores whatever the blob store still has. Missing or unreadable
    /// entries are skipped; restart never blocks on them.
    pub async fn load(&self) {
        let Some(ref persistence) = self.persistence else {
            return;
        };
        for predictor in self.predictors() {
            if let Some(state) = persistence.load_predictor(predictor.kind()).await {
                match predictor.restore(state) {
                    Ok(()) => {
                        tracing::info!(kind = predictor.kind().as_str(), "predictor state restored")
                    }
                    Err(err) => tracing::warn!(
                        kind = predictor.kind().as_str(),
                        error = %err,
                        "persisted state rejected"
                    ),
                }
            }
        }
        if let Some(profiles) = persistence.load_preferences().await {
            tracing::info!(users = profiles.len(), "user preferences restored");
            self.preferences.restore(profiles);
        }
    }

    /// Writes all current state through the gateway, best-effort.
    pub async fn flush(&self) {
        let Some(ref persistence) = self.persistence else {
            return;
        };
        for predictor in self.predictors() {
            persistence
                .save_predictor(predictor.kind(), &predictor.snapshot())
                .await;
        }
        persistence.save_preferences(&self.preferences.snapshot()).await;
    }

    pub async fn close(&self) {
        self.flush().await;
    }

    /// Scores and ranks candidates for a user. Total function: predictors
    /// degrade to neutral defaults rather than erroring, an unavailable
    /// recent-category source means every candidate is novel, and ties keep
    /// input order (stable sort), so identical inputs rank identically.
    pub async fn score_candidates(
        &self,
        user_id: &str,
        context: &RecommendationContext,
        candidates: &[CandidateActivity],
    ) -> Vec<ScoredCandidate> {
        let now = Utc::now();
        let profile = self.preferences.get(user_id);
        let weights = *self.strategy.read();
        let recent = match self.recent_categories {
            Some(ref tracker) => tracker.recent_categories(user_id).await,
            None => Vec::new(),
        };

        let mut scored: Vec<ScoredCandidate> = candidates
            .iter()
            .map(|candidate| {
                let affinity = profile
                    .category_weights
                    .get(&candidate.category)
                    .copied()
                    .unwrap_or(features::DEFAULT_CATEGORY_AFFINITY);
                let feature_vector =
                    features::candidate_features(context, candidate, affinity, now);

                let (mood_value, mood_conf) = self.mood.predict(&feature_vector);
                let (engagement_value, engagement_conf) =
                    self.engagement.predict(&feature_vector);
                let (satisfaction_value, satisfaction_conf) =
                    self.satisfaction.predict(&feature_vector);

                let diversity = if recent.contains(&candidate.category) {
                    self.config.diversity.repeat_score
                } else {
                    self.config.diversity.novel_score
                };

                let total_score = weights.mood_based * mood_value * mood_conf
                    + weights.engagement_based * engagement_value * engagement_conf
                    + weights.satisfaction_based * satisfaction_value * satisfaction_conf
                    + weights.diversity * diversity;

                let boost = self.preference_boost(candidate, &profile, context);
                let final_score = total_score * (1.0 + boost);

                ScoredCandidate {
                    activity: candidate.clone(),
                    final_score,
                    mood_prediction: mood_value,
                    engagement_prediction: engagement_value,
                    satisfaction_prediction: satisfaction_value,
                    confidence: (mood_conf + engagement_conf + satisfaction_conf) / 3.0,
                }
            })
            .collect();

        // Vec::sort_by is stable: equal scores keep input order.
        scored.sort_by(|a, b| {
            b.final_score
                .partial_cmp(&a.final_score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        scored
    }

    /// Boost in ±`total_cap` from how far the user's learned affinities sit
    /// from neutral, each term clipped to its own cap first.
    fn preference_boost(
        &self,
        candidate: &CandidateActivity,
        profile: &UserPreferenceProfile,
        context: &RecommendationContext,
    ) -> f64 {
        let params = &self.config.boost;

        let affinity = profile
            .category_weights
            .get(&candidate.category)
            .copied()
            .unwrap_or(features::DEFAULT_CATEGORY_AFFINITY);
        let category_term = ((affinity - 0.5) * params.category_scale)
            .clamp(-params.category_cap, params.category_cap);

        let hour = context.hour_of_day.unwrap_or_else(|| Utc::now().hour()) % 24;
        let time_pref = profile.time_preferences.get(&hour).copied().unwrap_or(0.5);
        let time_term =
            ((time_pref - 0.5) * params.time_scale).clamp(-params.time_cap, params.time_cap);

        let difficulty_match =
            1.0 - (candidate.difficulty - profile.difficulty_preference).abs();
        let difficulty_term = ((difficulty_match - 0.5) * params.difficulty_scale)
            .clamp(-params.difficulty_cap, params.difficulty_cap);

        (category_term + time_term + difficulty_term).clamp(-params.total_cap, params.total_cap)
    }

    /// Routes a feedback event to every predictor whose target it carries
    /// (zero to all three), then folds it into the preference profile.
    /// Total function: nothing here can fail the caller.
    pub async fn record_feedback(
        &self,
        user_id: &str,
        recommendation_id: &str,
        feedback: &FeedbackEvent,
    ) {
        tracing::debug!(user_id, recommendation_id, "feedback received");

        let profile = self.preferences.get(user_id);
        let affinity = feedback
            .category
            .as_ref()
            .and_then(|category| profile.category_weights.get(category).copied())
            .unwrap_or(features::DEFAULT_CATEGORY_AFFINITY);
        let feature_vector = features::feedback_features(feedback, affinity, Utc::now());

        let mut learned = [false; 3];
        if let Some(delta) = feedback.mood_delta() {
            learned[0] =
                self.mood
                    .add_training_sample(feature_vector.clone(), delta, Some(user_id), 1.0);
        }
        if let Some(engagement) = feedback.engagement_score {
            learned[1] = self.engagement.add_training_sample(
                feature_vector.clone(),
                engagement,
                Some(user_id),
                1.0,
            );
        }
        if let Some(satisfaction) = feedback.satisfaction_rating {
            learned[2] = self.satisfaction.add_training_sample(
                feature_vector,
                satisfaction,
                Some(user_id),
                1.0,
            );
        }

        self.preferences.update(user_id, feedback);

        if let Some(ref persistence) = self.persistence {
            for (did_learn, predictor) in learned.iter().zip(self.predictors()) {
                if *did_learn {
                    persistence
                        .save_predictor(predictor.kind(), &predictor.snapshot())
                        .await;
                }
            }
            persistence.save_preferences(&self.preferences.snapshot()).await;
        }
    }

    /// Boundary validation: weights must be non-negative and sum to 1.0.
    pub fn set_strategy_weights(&self, weights: StrategyWeights) -> Result<(), EngineError> {
        weights.validate()?;
        *self.strategy.write() = weights;
        tracing::info!("strategy weights updated");
        Ok(())
    }

    pub fn strategy_weights(&self) -> StrategyWeights {
        *self.strategy.read()
    }

    pub fn preference_profile(&self, user_id: &str) -> UserPreferenceProfile {
        self.preferences.get(user_id)
    }

    pub fn stats(&self) -> EngineStats {
        EngineStats {
            mood_predictor: self.mood.info(),
            engagement_predictor: self.engagement.info(),
            satisfaction_predictor: self.satisfaction.info(),
            total_users: self.preferences.user_count(),
            strategy_weights: *self.strategy.read(),
        }
    }
}
