use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::types::FeatureVector;

const MIN_STD_DEV: f64 = 1e-8;

/// Incrementally-fit feature scaler: per-feature running mean and variance
/// via Welford updates, so each batch folds into the existing statistics
/// without revisiting history. Near-constant features pass through centered
/// but unscaled.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncrementalScaler {
    dim: usize,
    count: u64,
    mean: Vec<f64>,
    m2: Vec<f64>,
}

impl IncrementalScaler {
    pub fn new(dim: usize) -> Self {
        Self {
            dim,
            count: 0,
            mean: vec![0.0; dim],
            m2: vec![0.0; dim],
        }
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn is_fitted(&self) -> bool {
        self.count > 0
    }

    pub fn partial_fit(&mut self, batch: &[FeatureVector]) -> Result<(), EngineError> {
        for sample in batch {
            if sample.len() != self.dim {
                return Err(EngineError::DimensionMismatch {
                    expected: self.dim,
                    got: sample.len(),
                });
            }
            self.count += 1;
            let n = self.count as f64;
            for (i, &x) in sample.values.iter().enumerate() {
                let delta = x - self.mean[i];
                self.mean[i] += delta / n;
                self.m2[i] += delta * (x - self.mean[i]);
            }
        }
        Ok(())
    }

    pub fn transform(&self, features: &FeatureVector) -> Result<Vec<f64>, EngineError> {
        if self.count == 0 {
            return Err(EngineError::NotFitted);
        }
        if features.len() != self.dim {
            return Err(EngineError::DimensionMismatch {
                expected: self.dim,
                got: features.len(),
            });
        }
        let scaled = features
            .values
            .iter()
            .enumerate()
            .map(|(i, &x)| {
                let std_dev = self.std_dev(i);
                if std_dev < MIN_STD_DEV {
                    x - self.mean[i]
                } else {
                    (x - self.mean[i]) / std_dev
                }
            })
            .collect();
        Ok(scaled)
    }

    fn std_dev(&self, i: usize) -> f64 {
        (self.m2[i] / self.count as f64).max(0.0).sqrt()
    }
}
