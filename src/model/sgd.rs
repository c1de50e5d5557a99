//! Online linear models with a single always-incremental update rule: the
//! first batch runs the same weighted SGD step as every later batch, so
//! there is no separate fit/refit path to keep equivalent.

use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// Weighted squared-loss SGD over a linear model with a slowly decaying step
/// size and L2 shrinkage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SgdRegressor {
    weights: Vec<f64>,
    bias: f64,
    eta0: f64,
    decay: f64,
    l2: f64,
    steps: u64,
}

impl SgdRegressor {
    pub fn new(dim: usize, eta0: f64, decay: f64, l2: f64) -> Self {
        Self {
            weights: vec![0.0; dim],
            bias: 0.0,
            eta0,
            decay,
            l2,
            steps: 0,
        }
    }

    pub fn dim(&self) -> usize {
        self.weights.len()
    }

    pub fn partial_fit(
        &mut self,
        batch: &[Vec<f64>],
        targets: &[f64],
        sample_weights: &[f64],
    ) -> Result<(), EngineError> {
        if batch.is_empty() {
            return Err(EngineError::EmptyBatch);
        }
        for ((x, &y), &sw) in batch.iter().zip(targets).zip(sample_weights) {
            if x.len() != self.weights.len() {
                return Err(EngineError::DimensionMismatch {
                    expected: self.weights.len(),
                    got: x.len(),
                });
            }
            self.steps += 1;
            let eta = self.eta0 / (1.0 + self.decay * self.steps as f64);
            let err = self.raw_predict(x) - y;
            for (w, &xi) in self.weights.iter_mut().zip(x) {
                *w -= eta * sw * (err * xi + self.l2 * *w);
            }
            self.bias -= eta * sw * err;
        }
        if !self.is_finite() {
            return Err(EngineError::NumericalInstability);
        }
        Ok(())
    }

    pub fn predict(&self, x: &[f64]) -> Result<f64, EngineError> {
        if x.len() != self.weights.len() {
            return Err(EngineError::DimensionMismatch {
                expected: self.weights.len(),
                got: x.len(),
            });
        }
        Ok(self.raw_predict(x))
    }

    fn raw_predict(&self, x: &[f64]) -> f64 {
        self.weights.iter().zip(x).map(|(w, xi)| w * xi).sum::<f64>() + self.bias
    }

    pub fn is_finite(&self) -> bool {
        self.bias.is_finite() && self.weights.iter().all(|w| w.is_finite())
    }
}

/// One-vs-rest logistic SGD over a small fixed label set; `predict` returns
/// the argmax label as f64 so both model families share one interface.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SgdClassifier {
    weights: Vec<Vec<f64>>,
    bias: Vec<f64>,
    eta0: f64,
    decay: f64,
    l2: f64,
    steps: u64,
}

impl SgdClassifier {
    pub fn new(dim: usize, n_classes: usize, eta0: f64, decay: f64, l2: f64) -> Self {
        Self {
            weights: vec![vec![0.0; dim]; n_classes.max(2)],
            bias: vec![0.0; n_classes.max(2)],
            eta0,
            decay,
            l2,
            steps: 0,
        }
    }

    pub fn dim(&self) -> usize {
        self.weights.first().map(|w| w.len()).unwrap_or(0)
    }

    pub fn n_classes(&self) -> usize {
        self.weights.len()
    }

    pub fn partial_fit(
        &mut self,
        batch: &[Vec<f64>],
        targets: &[f64],
        sample_weights: &[f64],
    ) -> Result<(), EngineError> {
        if batch.is_empty() {
            return Err(EngineError::EmptyBatch);
        }
        for ((x, &y), &sw) in batch.iter().zip(targets).zip(sample_weights) {
            if x.len() != self.dim() {
                return Err(EngineError::DimensionMismatch {
                    expected: self.dim(),
                    got: x.len(),
                });
            }
            self.steps += 1;
            let eta = self.eta0 / (1.0 + self.decay * self.steps as f64);
            let label = (y.round().max(0.0) as usize).min(self.n_classes() - 1);
            for class in 0..self.weights.len() {
                let target = if class == label { 1.0 } else { 0.0 };
                let score = dot(&self.weights[class], x) + self.bias[class];
                let err = sigmoid(score) - target;
                for (w, &xi) in self.weights[class].iter_mut().zip(x) {
                    *w -= eta * sw * (err * xi + self.l2 * *w);
                }
                self.bias[class] -= eta * sw * err;
            }
        }
        if !self.is_finite() {
            return Err(EngineError::NumericalInstability);
        }
        Ok(())
    }

    pub fn predict(&self, x: &[f64]) -> Result<f64, EngineError> {
        if x.len() != self.dim() {
            return Err(EngineError::DimensionMismatch {
                expected: self.dim(),
                got: x.len(),
            });
        }
        let mut best = 0usize;
        let mut best_score = f64::NEG_INFINITY;
        for (class, (w, b)) in self.weights.iter().zip(&self.bias).enumerate() {
            let score = dot(w, x) + b;
            if score > best_score {
                best_score = score;
                best = class;
            }
        }
        Ok(best as f64)
    }

    pub fn is_finite(&self) -> bool {
        self.bias.iter().all(|b| b.is_finite())
            && self.weights.iter().flatten().all(|w| w.is_finite())
    }
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn regressor_fits_a_linear_relationship() {
        let mut model = SgdRegressor::new(1, 0.05, 1e-4, 0.0);
        let xs: Vec<Vec<f64>> = (-10..=10).map(|i| vec![i as f64 / 10.0]).collect();
        let ys: Vec<f64> = xs.iter().map(|x| 2.0 * x[0] + 1.0).collect();
        let ws = vec![1.0; xs.len()];

        for _ in 0..200 {
            model.partial_fit(&xs, &ys, &ws).unwrap();
        }

        let prediction = model.predict(&[0.5]).unwrap();
        assert!((prediction - 2.0).abs() < 0.1, "prediction {prediction}");
    }

    #[test]
    fn regressor_error_shrinks_across_batches() {
        let mut model = SgdRegressor::new(1, 0.05, 1e-4, 0.0);
        let xs: Vec<Vec<f64>> = (0..20).map(|i| vec![i as f64 / 20.0]).collect();
        let ys: Vec<f64> = xs.iter().map(|x| 3.0 - x[0]).collect();
        let ws = vec![1.0; xs.len()];

        let error = |m: &SgdRegressor| -> f64 {
            xs.iter()
                .zip(&ys)
                .map(|(x, y)| (m.predict(x).unwrap() - y).powi(2))
                .sum::<f64>()
        };

        model.partial_fit(&xs, &ys, &ws).unwrap();
        let early = error(&model);
        for _ in 0..50 {
            model.partial_fit(&xs, &ys, &ws).unwrap();
        }
        assert!(error(&model) < early);
    }

    #[test]
    fn regressor_rejects_wrong_dimension() {
        let mut model = SgdRegressor::new(3, 0.01, 1e-3, 1e-4);
        let err = model
            .partial_fit(&[vec![1.0, 2.0]], &[1.0], &[1.0])
            .unwrap_err();
        assert!(matches!(err, EngineError::DimensionMismatch { .. }));
    }

    #[test]
    fn classifier_separates_two_clusters() {
        let mut model = SgdClassifier::new(2, 2, 0.1, 1e-4, 0.0);
        let xs = vec![
            vec![1.0, 1.0],
            vec![0.9, 1.1],
            vec![1.1, 0.8],
            vec![-1.0, -1.0],
            vec![-0.9, -1.1],
            vec![-1.2, -0.8],
        ];
        let ys = vec![1.0, 1.0, 1.0, 0.0, 0.0, 0.0];
        let ws = vec![1.0; xs.len()];

        for _ in 0..100 {
            model.partial_fit(&xs, &ys, &ws).unwrap();
        }

        assert_eq!(model.predict(&[1.0, 0.9]).unwrap(), 1.0);
        assert_eq!(model.predict(&[-1.0, -0.9]).unwrap(), 0.0);
    }

    #[test]
    fn classifier_clamps_out_of_range_labels() {
        let mut model = SgdClassifier::new(1, 3, 0.1, 1e-4, 0.0);
        // label 9.0 lands in the top class instead of indexing out of bounds
        model
            .partial_fit(&[vec![1.0]], &[9.0], &[1.0])
            .unwrap();
    }
}
