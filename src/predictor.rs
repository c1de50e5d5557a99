//! One online model per prediction target, updated in small batches without
//! discarding prior learning. Lifecycle per predictor: uninitialized →
//! (synthetic seed or first real batch) → initialized, and initialized is
//! terminal; there is no retrain-from-scratch transition.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};

use crate::config::{PredictorConfig, SeedParams};
use crate::error::EngineError;
use crate::model::{IncrementalScaler, OnlineModel, SgdClassifier, SgdRegressor};
use crate::seed;
use crate::types::{
    FeatureVector, PerformancePoint, PredictorInfo, PredictorKind, TargetKind, TrainingSample,
    RECOMMENDATION_FEATURE_DIM,
};

pub const MODEL_VERSION: &str = "1.0.0";

/// Everything that survives a restart. Swapped in atomically after each
/// successful learn, so a concurrent `predict` never observes a model
/// mid-update.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictorState {
    pub model: OnlineModel,
    pub scaler: IncrementalScaler,
    pub is_initialized: bool,
    pub sample_count: u64,
    pub version: String,
    pub last_update: DateTime<Utc>,
    pub performance_history: VecDeque<PerformancePoint>,
}

pub struct IncrementalPredictor {
    kind: PredictorKind,
    config: PredictorConfig,
    buffer: Mutex<VecDeque<TrainingSample>>,
    state: RwLock<PredictorState>,
}

impl IncrementalPredictor {
    /// Regression predictor over the shared 10-slot recommendation layout.
    pub fn new(kind: PredictorKind, config: PredictorConfig) -> Self {
        let dim = RECOMMENDATION_FEATURE_DIM;
        let model = OnlineModel::Regressor(SgdRegressor::new(
            dim,
            config.sgd.eta0,
            config.sgd.learning_rate_decay,
            config.sgd.l2,
        ));
        Self::with_model(kind, config, model, dim)
    }

    /// Classification predictor over the behavior layout.
    pub fn classifier(kind: PredictorKind, config: PredictorConfig) -> Self {
        let dim = seed::BEHAVIOR_FEATURE_DIM;
        let model = OnlineModel::Classifier(SgdClassifier::new(
            dim,
            seed::BEHAVIOR_CLASSES,
            config.sgd.eta0,
            config.sgd.learning_rate_decay,
            config.sgd.l2,
        ));
        Self::with_model(kind, config, model, dim)
    }

    fn with_model(
        kind: PredictorKind,
        config: PredictorConfig,
        model: OnlineModel,
        dim: usize,
    ) -> Self {
        let state = PredictorState {
            model,
            scaler: IncrementalScaler::new(dim),
            is_initialized: false,
            sample_count: 0,
            version: MODEL_VERSION.to_string(),
            last_update: Utc::now(),
            performance_history: VecDeque::new(),
        };
        Self {
            kind,
            config,
            buffer: Mutex::new(VecDeque::new()),
            state: RwLock::new(state),
        }
    }

    pub fn kind(&self) -> PredictorKind {
        self.kind
    }

    pub fn target_kind(&self) -> TargetKind {
        self.state.read().model.target_kind()
    }

    pub fn is_initialized(&self) -> bool {
        self.state.read().is_initialized
    }

    pub fn sample_count(&self) -> u64 {
        self.state.read().sample_count
    }

    pub fn buffer_len(&self) -> usize {
        self.buffer.lock().len()
    }

    /// Appends a sample to the bounded buffer; a full buffer drops its
    /// oldest unprocessed sample first. Once the batch threshold is reached
    /// the buffer is drained and learned from while still under the buffer
    /// lock, so a batch is consumed exactly once. Returns whether a learn
    /// was triggered.
    pub fn add_training_sample(
        &self,
        features: FeatureVector,
        target: f64,
        user_id: Option<&str>,
        weight: f64,
    ) -> bool {
        let sample = TrainingSample {
            features,
            target,
            user_id: user_id.map(str::to_owned),
            weight: weight.max(0.0),
            timestamp: Utc::now(),
        };

        let mut buffer = self.buffer.lock();
        if buffer.len() >= self.config.buffer_capacity {
            buffer.pop_front();
        }
        buffer.push_back(sample);

        if buffer.len() < self.config.batch_threshold {
            return false;
        }
        let batch: Vec<TrainingSample> = buffer.drain(..).collect();
        match self.incremental_learn(batch) {
            Ok(consumed) => {
                tracing::debug!(kind = self.kind.as_str(), consumed, "incremental learn completed");
            }
            Err(err) => {
                // Predictor keeps its pre-update state; the batch is dropped,
                // not retried.
                tracing::warn!(
                    kind = self.kind.as_str(),
                    error = %err,
                    "incremental learn failed; batch discarded"
                );
            }
        }
        true
    }

    /// Folds one batch into the model and scaler. Works on a copy of the
    /// state and swaps it in only on success; any failure leaves the
    /// predictor exactly as it was.
    fn incremental_learn(&self, samples: Vec<TrainingSample>) -> Result<usize, EngineError> {
        if samples.is_empty() {
            return Err(EngineError::EmptyBatch);
        }

        let features: Vec<FeatureVector> = samples.iter().map(|s| s.features.clone()).collect();
        let targets: Vec<f64> = samples.iter().map(|s| s.target).collect();
        let weights: Vec<f64> = samples.iter().map(|s| s.weight).collect();

        let mut next = self.state.read().clone();
        self.fit_batch(&mut next, &features, &targets, &weights, 1)?;
        *self.state.write() = next;
        Ok(samples.len())
    }

    /// Cold start: fit from the synthetic prior dataset when nothing was
    /// loaded and no live samples exist. The first fit applies the same
    /// incremental rule as every later batch, repeated over the prior
    /// dataset for a few epochs.
    pub fn seed_with_synthetic(&self, params: &SeedParams) -> Result<usize, EngineError> {
        if self.is_initialized() {
            return Ok(0);
        }
        let data = seed::generate(self.kind, self.target_kind(), params);
        if data.is_empty() {
            return Err(EngineError::EmptyBatch);
        }

        let features: Vec<FeatureVector> = data.iter().map(|(f, _)| f.clone()).collect();
        let targets: Vec<f64> = data.iter().map(|(_, t)| *t).collect();
        let weights = vec![1.0; data.len()];

        let mut next = self.state.read().clone();
        self.fit_batch(&mut next, &features, &targets, &weights, params.epochs)?;
        *self.state.write() = next;

        tracing::info!(
            kind = self.kind.as_str(),
            samples = data.len(),
            "predictor seeded from synthetic priors"
        );
        Ok(data.len())
    }

    fn fit_batch(
        &self,
        next: &mut PredictorState,
        features: &[FeatureVector],
        targets: &[f64],
        weights: &[f64],
        epochs: usize,
    ) -> Result<(), EngineError> {
        next.scaler.partial_fit(features)?;
        let scaled: Vec<Vec<f64>> = features
            .iter()
            .map(|f| next.scaler.transform(f))
            .collect::<Result<_, _>>()?;
        for _ in 0..epochs.max(1) {
            next.model.partial_fit(&scaled, targets, weights)?;
        }
        next.is_initialized = true;
        next.sample_count += features.len() as u64;
        next.last_update = Utc::now();
        Self::evaluate_performance(next, &scaled, targets, self.config.history_capacity);
        Ok(())
    }

    /// Recent-batch metric (MSE for regression, accuracy for classification)
    /// appended to the bounded history that feeds the confidence heuristic.
    fn evaluate_performance(
        state: &mut PredictorState,
        scaled: &[Vec<f64>],
        targets: &[f64],
        capacity: usize,
    ) {
        let mut predictions = Vec::with_capacity(scaled.len());
        for x in scaled {
            match state.model.predict(x) {
                Ok(p) => predictions.push(p),
                Err(err) => {
                    tracing::warn!(error = %err, "performance evaluation skipped");
                    return;
                }
            }
        }

        let metric = match state.model.target_kind() {
            TargetKind::Regression => {
                let mut squared = 0.0;
                for (p, y) in predictions.iter().zip(targets) {
                    let e = p - y;
                    squared += e * e;
                }
                squared / predictions.len() as f64
            }
            TargetKind::Classification => {
                let mut hits = 0usize;
                for (p, y) in predictions.iter().zip(targets) {
                    if (p - y).abs() < 0.5 {
                        hits += 1;
                    }
                }
                hits as f64 / predictions.len() as f64
            }
        };

        state.performance_history.push_back(PerformancePoint {
            metric,
            timestamp: Utc::now(),
        });
        while state.performance_history.len() > capacity {
            state.performance_history.pop_front();
        }
    }

    /// Point estimate plus heuristic confidence. Uninitialized predictors
    /// answer the neutral default; any runtime failure degrades to
    /// `(neutral, degraded_confidence)` instead of propagating.
    pub fn predict(&self, features: &FeatureVector) -> (f64, f64) {
        let state = self.state.read();
        if !state.is_initialized {
            return (self.config.neutral_prediction, self.config.default_confidence);
        }
        match Self::try_predict(&state, features) {
            Ok(value) => (
                value,
                self.confidence_from(&state.performance_history, state.model.target_kind()),
            ),
            Err(err) => {
                tracing::warn!(
                    kind = self.kind.as_str(),
                    error = %err,
                    "prediction failed; serving degraded default"
                );
                (self.config.neutral_prediction, self.config.degraded_confidence)
            }
        }
    }

    fn try_predict(state: &PredictorState, features: &FeatureVector) -> Result<f64, EngineError> {
        let scaled = state.scaler.transform(features)?;
        state.model.predict(&scaled)
    }

    /// Heuristic confidence from the trailing performance window; a rough
    /// self-assessment, not a calibrated interval. Regression maps average
    /// recent MSE through `1/(1+mse)` clamped to the configured bounds;
    /// classification uses mean recent accuracy directly; an empty history
    /// answers the default.
    pub fn confidence(&self) -> f64 {
        let state = self.state.read();
        self.confidence_from(&state.performance_history, state.model.target_kind())
    }

    fn confidence_from(&self, history: &VecDeque<PerformancePoint>, target: TargetKind) -> f64 {
        if history.is_empty() {
            return self.config.default_confidence;
        }
        let window = self.config.confidence_window.max(1);
        let recent: Vec<f64> = history.iter().rev().take(window).map(|p| p.metric).collect();
        let average = recent.iter().sum::<f64>() / recent.len() as f64;
        match target {
            TargetKind::Regression => (1.0 / (1.0 + average))
                .clamp(self.config.min_confidence, self.config.max_confidence),
            TargetKind::Classification => average.clamp(0.0, 1.0),
        }
    }

    pub fn snapshot(&self) -> PredictorState {
        self.state.read().clone()
    }

    /// Adopts persisted state wholesale. Dimension mismatches (layout drift
    /// across versions) are rejected so a stale blob cannot poison a fresh
    /// model.
    pub fn restore(&self, snapshot: PredictorState) -> Result<(), EngineError> {
        let expected = self.state.read().scaler.dim();
        if snapshot.scaler.dim() != expected || snapshot.model.dim() != expected {
            return Err(EngineError::DimensionMismatch {
                expected,
                got: snapshot.model.dim(),
            });
        }
        *self.state.write() = snapshot;
        Ok(())
    }

    pub fn info(&self) -> PredictorInfo {
        let buffer_len = self.buffer.lock().len();
        let state = self.state.read();
        PredictorInfo {
            kind: self.kind,
            target: state.model.target_kind(),
            is_initialized: state.is_initialized,
            sample_count: state.sample_count,
            version: state.version.clone(),
            last_update: state.last_update,
            buffer_len,
            history_len: state.performance_history.len(),
            latest_metric: state.performance_history.back().map(|p| p.metric),
        }
    }
}
