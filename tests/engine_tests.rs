//! Integration tests for the adaptive engine: cold start, scoring
//! determinism, diversity ordering, feedback routing, and persistence
//! round-trips through the in-memory blob store.

use std::sync::Arc;
use std::time::Duration;

use cuddlecat_adaptive::cache::{keys, BlobStore, MemoryStore};
use cuddlecat_adaptive::config::{EngineConfig, StrategyWeights};
use cuddlecat_adaptive::engine::AdaptiveEngine;
use cuddlecat_adaptive::types::{CandidateActivity, FeedbackEvent, RecommendationContext};

fn sample_context() -> RecommendationContext {
    RecommendationContext {
        hour_of_day: Some(9),
        weather_score: Some(4.5),
        current_mood: Some(3.0),
        ..Default::default()
    }
}

fn exercise_candidate() -> CandidateActivity {
    CandidateActivity {
        name: "walk downstairs".into(),
        category: "exercise".into(),
        difficulty: 0.3,
        estimated_duration: 10.0,
    }
}

#[tokio::test]
async fn cold_start_predictors_are_initialized_and_in_scale() {
    let engine = AdaptiveEngine::new(EngineConfig::default());

    let stats = engine.stats();
    assert!(stats.mood_predictor.is_initialized);
    assert!(stats.engagement_predictor.is_initialized);
    assert!(stats.satisfaction_predictor.is_initialized);
    assert!(stats.mood_predictor.sample_count > 0);

    let results = engine
        .score_candidates("u_cold", &sample_context(), &[exercise_candidate()])
        .await;
    assert_eq!(results.len(), 1);
    let mood = results[0].mood_prediction;
    assert!((1.0..=5.0).contains(&mood), "mood prediction out of scale: {mood}");
    assert!(results[0].confidence > 0.0);
    assert!(results[0].final_score.is_finite());
}

#[tokio::test]
async fn identical_candidates_score_identically_and_keep_order() {
    let engine = AdaptiveEngine::new(EngineConfig::default());
    let candidates = vec![exercise_candidate(), exercise_candidate()];

    let results = engine
        .score_candidates("u1", &sample_context(), &candidates)
        .await;
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].final_score, results[1].final_score);
    assert_eq!(results[0].mood_prediction, results[1].mood_prediction);
    assert_eq!(results[0].satisfaction_prediction, results[1].satisfaction_prediction);
}

#[tokio::test]
async fn scoring_is_deterministic_across_calls() {
    let engine = AdaptiveEngine::new(EngineConfig::default());
    let candidates = vec![exercise_candidate()];

    let first = engine
        .score_candidates("u1", &sample_context(), &candidates)
        .await;
    let second = engine
        .score_candidates("u1", &sample_context(), &candidates)
        .await;
    assert_eq!(first[0].final_score, second[0].final_score);
}

#[tokio::test]
async fn recently_recommended_category_scores_strictly_lower() {
    let store = Arc::new(MemoryStore::new());
    store
        .set(
            &keys::recent_categories_key("u_div"),
            r#"["exercise"]"#.to_string(),
            Duration::from_secs(60),
        )
        .await;
    let engine = AdaptiveEngine::with_store(EngineConfig::default(), store).await;

    let mut mindful = exercise_candidate();
    mindful.category = "mindfulness".into();
    let results = engine
        .score_candidates("u_div", &sample_context(), &[exercise_candidate(), mindful])
        .await;

    assert_eq!(results[0].activity.category, "mindfulness");
    assert!(results[0].final_score > results[1].final_score);
}

#[tokio::test]
async fn repeated_feedback_moves_category_weight_toward_rating() {
    let engine = AdaptiveEngine::new(EngineConfig::default());
    let feedback = FeedbackEvent {
        satisfaction_rating: Some(5.0),
        category: Some("mindfulness".into()),
        hour_of_day: Some(20),
        engagement_score: Some(0.9),
        ..Default::default()
    };

    for _ in 0..10 {
        engine.record_feedback("u2", "r1", &feedback).await;
    }

    let profile = engine.preference_profile("u2");
    let weight = profile.category_weights["mindfulness"];
    // Ten EMA steps with alpha 0.1 from 0.0 toward 5.0.
    let expected = 5.0 * (1.0 - 0.9f64.powi(10));
    assert!((weight - expected).abs() < 1e-9, "weight {weight}, expected {expected}");
    assert!(weight > 0.0 && weight < 5.0);

    let hour_pref = profile.time_preferences[&20];
    assert!(hour_pref > 0.0);
}

#[tokio::test]
async fn batch_threshold_triggers_one_learn_and_empties_buffer() {
    let engine = AdaptiveEngine::new(EngineConfig::default());
    let before = engine.stats().satisfaction_predictor.sample_count;

    for i in 0..10 {
        let feedback = FeedbackEvent {
            satisfaction_rating: Some(4.0),
            category: Some("breathing".into()),
            task_difficulty: Some(0.2 + 0.05 * i as f64),
            ..Default::default()
        };
        engine.record_feedback("u3", "r", &feedback).await;

        if i == 8 {
            let mid = engine.stats().satisfaction_predictor;
            assert_eq!(mid.sample_count, before, "no learn before the threshold");
            assert_eq!(mid.buffer_len, 9);
        }
    }

    let after = engine.stats().satisfaction_predictor;
    assert_eq!(after.sample_count, before + 10);
    assert_eq!(after.buffer_len, 0);
}

#[tokio::test]
async fn feedback_without_targets_touches_no_predictor() {
    let engine = AdaptiveEngine::new(EngineConfig::default());
    let before = engine.stats();

    let feedback = FeedbackEvent {
        current_mood: Some(2.0),
        weather_score: Some(1.0),
        ..Default::default()
    };
    engine.record_feedback("u5", "r9", &feedback).await;

    let after = engine.stats();
    assert_eq!(after.mood_predictor.buffer_len, before.mood_predictor.buffer_len);
    assert_eq!(
        after.engagement_predictor.buffer_len,
        before.engagement_predictor.buffer_len
    );
    assert_eq!(
        after.satisfaction_predictor.buffer_len,
        before.satisfaction_predictor.buffer_len
    );
    // The preference profile is still created, with neutral defaults.
    assert_eq!(after.total_users, before.total_users + 1);
}

#[tokio::test]
async fn mood_predictor_trains_on_deltas() {
    let engine = AdaptiveEngine::new(EngineConfig::default());
    let before = engine.stats().mood_predictor.sample_count;

    for _ in 0..10 {
        let feedback = FeedbackEvent {
            mood_before: Some(2.0),
            mood_after: Some(4.0),
            category: Some("exercise".into()),
            ..Default::default()
        };
        engine.record_feedback("u6", "r", &feedback).await;
    }

    assert_eq!(engine.stats().mood_predictor.sample_count, before + 10);
}

#[tokio::test]
async fn state_survives_restart_through_blob_store() {
    let store = Arc::new(MemoryStore::new());

    {
        let engine =
            AdaptiveEngine::with_store(EngineConfig::default(), store.clone() as Arc<dyn BlobStore>)
                .await;
        for _ in 0..10 {
            engine
                .record_feedback(
                    "u4",
                    "r",
                    &FeedbackEvent {
                        satisfaction_rating: Some(2.0),
                        category: Some("journaling".into()),
                        ..Default::default()
                    },
                )
                .await;
        }
        engine.close().await;
    }

    let revived =
        AdaptiveEngine::with_store(EngineConfig::default(), store.clone() as Arc<dyn BlobStore>)
            .await;
    let stats = revived.stats();
    // Synthetic seed plus the one consumed live batch.
    assert_eq!(stats.satisfaction_predictor.sample_count, 110);
    assert_eq!(stats.total_users, 1);

    let profile = revived.preference_profile("u4");
    let weight = profile.category_weights.get("journaling").copied().unwrap_or(0.0);
    assert!(weight > 0.0);
}

#[tokio::test]
async fn strategy_weights_validated_at_boundary() {
    let engine = AdaptiveEngine::new(EngineConfig::default());

    let bad = StrategyWeights {
        mood_based: 0.5,
        engagement_based: 0.5,
        satisfaction_based: 0.5,
        diversity: 0.5,
    };
    assert!(engine.set_strategy_weights(bad).is_err());

    let good = StrategyWeights {
        mood_based: 0.4,
        engagement_based: 0.3,
        satisfaction_based: 0.2,
        diversity: 0.1,
    };
    engine.set_strategy_weights(good).unwrap();
    assert_eq!(engine.strategy_weights().mood_based, 0.4);
}

#[tokio::test]
async fn empty_candidate_list_scores_to_empty() {
    let engine = AdaptiveEngine::new(EngineConfig::default());
    let results = engine
        .score_candidates("u7", &RecommendationContext::default(), &[])
        .await;
    assert!(results.is_empty());
}

#[tokio::test]
async fn preferred_category_outranks_disliked_one() {
    let engine = AdaptiveEngine::new(EngineConfig::default());

    // Teach a strong preference for mindfulness and a dislike of journaling.
    for _ in 0..20 {
        engine
            .record_feedback(
                "u8",
                "r",
                &FeedbackEvent {
                    satisfaction_rating: Some(5.0),
                    category: Some("mindfulness".into()),
                    ..Default::default()
                },
            )
            .await;
        engine
            .record_feedback(
                "u8",
                "r",
                &FeedbackEvent {
                    satisfaction_rating: Some(1.0),
                    category: Some("journaling".into()),
                    ..Default::default()
                },
            )
            .await;
    }

    let liked = CandidateActivity {
        name: "evening meditation".into(),
        category: "mindfulness".into(),
        difficulty: 0.3,
        estimated_duration: 10.0,
    };
    let disliked = CandidateActivity {
        name: "gratitude journal".into(),
        category: "journaling".into(),
        difficulty: 0.3,
        estimated_duration: 10.0,
    };

    let results = engine
        .score_candidates("u8", &sample_context(), &[disliked, liked])
        .await;
    assert_eq!(results[0].activity.category, "mindfulness");
    assert!(results[0].final_score > results[1].final_score);
}
