//! Category scores → one maturity score per state.

use crate::{
    category::CategorySet,
    error::{MaturityError, MaturityResult},
};
use serde::Serialize;

/// Weighted mean over category scores. Equal weights give the plain
/// arithmetic mean. Weights are validated once here, so scoring itself
/// cannot fail.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ScoreAggregator {
    weights: Vec<f64>,
    weight_sum: f64,
}

impl ScoreAggregator {
    pub fn new(weights: Vec<f64>) -> MaturityResult<Self> {
        if weights.is_empty() {
            return Err(MaturityError::invalid("aggregator needs at least one weight"));
        }
        if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(MaturityError::invalid("weights must be finite and non-negative"));
        }
        let weight_sum: f64 = weights.iter().sum();
        if weight_sum <= 0.0 {
            return Err(MaturityError::invalid("weights must not all be zero"));
        }
        Ok(Self { weights, weight_sum })
    }

    /// Equal weighting over `n` categories.
    pub fn equal(n: usize) -> MaturityResult<Self> {
        Self::new(vec![1.0; n])
    }

    pub fn for_categories(categories: &CategorySet) -> MaturityResult<Self> {
        Self::new(categories.weights())
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    /// Weights normalised to sum to one.
    pub fn normalized_weights(&self) -> Vec<f64> {
        self.weights.iter().map(|w| w / self.weight_sum).collect()
    }

    pub fn score(&self, scores: &[f64]) -> f64 {
        debug_assert_eq!(scores.len(), self.weights.len(), "one score per category");
        let weighted: f64 = scores
            .iter()
            .zip(&self.weights)
            .map(|(s, w)| s * w)
            .sum();
        weighted / self.weight_sum
    }
}
