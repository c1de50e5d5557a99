pub mod scaler;
pub mod sgd;

pub use scaler::IncrementalScaler;
pub use sgd::{SgdClassifier, SgdRegressor};

use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::types::TargetKind;

/// Opaque learned state behind a small partial-fit interface, so the
/// concrete online-learning family can be swapped without touching predictor
/// or engine logic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum OnlineModel {
    Regressor(SgdRegressor),
    Classifier(SgdClassifier),
}

impl OnlineModel {
    pub fn target_kind(&self) -> TargetKind {
        match self {
            OnlineModel::Regressor(_) => TargetKind::Regression,
            OnlineModel::Classifier(_) => TargetKind::Classification,
        }
    }

    pub fn dim(&self) -> usize {
        match self {
            OnlineModel::Regressor(model) => model.dim(),
            OnlineModel::Classifier(model) => model.dim(),
        }
    }

    pub fn partial_fit(
        &mut self,
        batch: &[Vec<f64>],
        targets: &[f64],
        sample_weights: &[f64],
    ) -> Result<(), EngineError> {
        match self {
            OnlineModel::Regressor(model) => model.partial_fit(batch, targets, sample_weights),
            OnlineModel::Classifier(model) => model.partial_fit(batch, targets, sample_weights),
        }
    }

    pub fn predict(&self, x: &[f64]) -> Result<f64, EngineError> {
        match self {
            OnlineModel::Regressor(model) => model.predict(x),
            OnlineModel::Classifier(model) => model.predict(x),
        }
    }
}
