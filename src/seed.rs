//! Synthetic seed datasets encoding domain priors, so a predictor with no
//! persisted state and no live feedback still answers from a model at the
//! first request.
//!
//! Mood priors: better in the morning and evening, worse late at night;
//! better with good weather, well-liked activity categories, high energy and
//! social contact; worse under stress. Generation is deterministic for a
//! given RNG seed.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::SeedParams;
use crate::types::{FeatureVector, PredictorKind, TargetKind};

/// Behavior-classification layout: engagement, completion rate, feedback
/// score, usage minutes, repeat flag.
pub const BEHAVIOR_FEATURE_DIM: usize = 5;
pub const BEHAVIOR_CLASSES: usize = 3;

pub fn generate(
    kind: PredictorKind,
    target: TargetKind,
    params: &SeedParams,
) -> Vec<(FeatureVector, f64)> {
    let mut rng = StdRng::seed_from_u64(params.rng_seed);
    (0..params.samples)
        .map(|_| match target {
            TargetKind::Classification => behavior_sample(&mut rng),
            TargetKind::Regression => match kind {
                PredictorKind::Mood => mood_sample(&mut rng),
                PredictorKind::Engagement => engagement_sample(&mut rng),
                PredictorKind::Satisfaction => satisfaction_sample(&mut rng),
            },
        })
        .collect()
}

/// One random draw over the 10-slot recommendation layout.
fn context_sample(rng: &mut StdRng) -> Vec<f64> {
    vec![
        rng.random_range(0..24) as f64,  // hour_of_day
        rng.random_range(0..7) as f64,   // day_of_week
        rng.random_range(0.0..=5.0),     // weather_score
        rng.random_range(1.0..=5.0),     // current_mood
        rng.random_range(1.0..=5.0),     // stress_level
        rng.random_range(1.0..=5.0),     // energy_level
        rng.random_range(0.0..=5.0),     // social_context
        rng.random_range(0.0..=1.0),     // task_difficulty
        rng.random_range(4.0..=45.0),    // task_duration
        rng.random_range(0.0..=1.0),     // category_affinity
    ]
}

fn mood_sample(rng: &mut StdRng) -> (FeatureVector, f64) {
    let features = context_sample(rng);
    let hour = features[0] as u32;
    let weather = features[2];
    let stress = features[4];
    let energy = features[5];
    let social = features[6];
    let affinity = features[9];

    let mut mood = 3.0;
    mood += match hour {
        6..=10 | 18..=22 => 0.5, // morning and evening lift
        0..=5 => -0.8,           // late-night dip
        _ => 0.0,
    };
    if weather >= 4.0 {
        mood += 0.7;
    } else if weather <= 1.5 {
        mood -= 0.5;
    }
    mood += (affinity - 0.5) * 1.2;
    mood += social * 0.2;
    mood += (energy - 3.0) * 0.4;
    mood -= (stress - 3.0) * 0.3;
    mood += rng.random_range(-0.3..=0.3);

    (FeatureVector::new(features), mood.clamp(1.0, 5.0))
}

fn engagement_sample(rng: &mut StdRng) -> (FeatureVector, f64) {
    let features = context_sample(rng);
    let energy = features[5];
    let difficulty = features[7];
    let duration = features[8];
    let affinity = features[9];

    let mut engagement = 0.5;
    engagement += (affinity - 0.5) * 0.5;
    engagement -= (difficulty - 0.5).abs() * 0.3;
    engagement -= ((duration - 10.0) / 60.0).max(0.0) * 0.3; // long tasks lose people
    engagement += (energy - 3.0) * 0.1;
    engagement += rng.random_range(-0.1..=0.1);

    (FeatureVector::new(features), engagement.clamp(0.0, 1.0))
}

fn satisfaction_sample(rng: &mut StdRng) -> (FeatureVector, f64) {
    let features = context_sample(rng);
    let mood = features[3];
    let stress = features[4];
    let difficulty = features[7];
    let affinity = features[9];

    let mut satisfaction = 3.0;
    satisfaction += (affinity - 0.5) * 2.0;
    satisfaction -= (difficulty - 0.5).abs();
    satisfaction += (mood - 3.0) * 0.3;
    satisfaction -= (stress - 3.0) * 0.2;
    satisfaction += rng.random_range(-0.3..=0.3);

    (FeatureVector::new(features), satisfaction.clamp(1.0, 5.0))
}

fn behavior_sample(rng: &mut StdRng) -> (FeatureVector, f64) {
    let engagement = rng.random_range(0.0..=1.0);
    let completion_rate = rng.random_range(0.0..=1.0);
    let feedback_score = rng.random_range(1.0..=5.0);
    let usage_minutes = rng.random_range(0.0..=60.0);
    let repeat_usage = rng.random_range(0..=1);

    let mut score = 0;
    if engagement > 0.7 {
        score += 1;
    }
    if completion_rate > 0.8 {
        score += 1;
    }
    if feedback_score > 3.5 {
        score += 1;
    }
    if usage_minutes > 10.0 {
        score += 1;
    }
    if repeat_usage == 1 {
        score += 1;
    }

    let label = if score >= 4 {
        2.0
    } else if score >= 2 {
        1.0
    } else {
        0.0
    };

    let features = vec![
        engagement,
        completion_rate,
        feedback_score,
        usage_minutes,
        repeat_usage as f64,
    ];
    (FeatureVector::new(features), label)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RECOMMENDATION_FEATURE_DIM;

    #[test]
    fn generation_is_deterministic_for_a_seed() {
        let params = SeedParams::default();
        let a = generate(PredictorKind::Mood, TargetKind::Regression, &params);
        let b = generate(PredictorKind::Mood, TargetKind::Regression, &params);
        assert_eq!(a.len(), params.samples);
        for ((fa, ta), (fb, tb)) in a.iter().zip(&b) {
            assert_eq!(fa, fb);
            assert_eq!(ta, tb);
        }
    }

    #[test]
    fn mood_targets_stay_on_scale() {
        for (features, target) in generate(
            PredictorKind::Mood,
            TargetKind::Regression,
            &SeedParams::default(),
        ) {
            assert_eq!(features.len(), RECOMMENDATION_FEATURE_DIM);
            assert!((1.0..=5.0).contains(&target), "mood target {target}");
        }
    }

    #[test]
    fn engagement_targets_stay_on_scale() {
        for (_, target) in generate(
            PredictorKind::Engagement,
            TargetKind::Regression,
            &SeedParams::default(),
        ) {
            assert!((0.0..=1.0).contains(&target));
        }
    }

    #[test]
    fn behavior_labels_are_three_classes() {
        for (features, label) in generate(
            PredictorKind::Engagement,
            TargetKind::Classification,
            &SeedParams::default(),
        ) {
            assert_eq!(features.len(), BEHAVIOR_FEATURE_DIM);
            assert!(label == 0.0 || label == 1.0 || label == 2.0);
        }
    }
}
