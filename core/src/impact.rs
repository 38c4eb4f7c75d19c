//! Linear-regression feature importance.
//!
//! OLS with intercept, fitted on centred columns by Householder QR
//! (nalgebra). Both raw and standardized coefficients are
//! reported; ranking uses the standardized magnitude
//! (`beta * sd_x / sd_y`), since raw coefficients depend on each
//! category's spread.
//!
//! A feature whose centred variance is zero, or whose variance left over
//! after projecting out the earlier features is negligible (collinear),
//! is dropped from the solve: it is reported with `defined = false` and
//! coefficient 0.0.
//!
//! R² is clamped to [0, 1]. A constant target is scored the usual way
//! for a degenerate total sum of squares: 1.0 when the fit is exact,
//! else 0.0.

use crate::{
    dataset::AssessmentDataset,
    error::{MaturityError, MaturityResult},
    types::State,
};
use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Leftover variance, relative to a column's own, at or below which the
/// column counts as dependent on the earlier ones.
const RANK_TOLERANCE: f64 = 1e-9;

/// What the model explains, and which feature columns explain it.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ImpactTarget {
    /// After aggregate on After category scores.
    AfterAggregate,
    /// Before aggregate on Before category scores.
    BeforeAggregate,
    /// Aggregate delta on per-category deltas.
    AggregateDelta,
}

impl ImpactTarget {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "after" | "after_aggregate"   => Some(Self::AfterAggregate),
            "before" | "before_aggregate" => Some(Self::BeforeAggregate),
            "delta" | "aggregate_delta"   => Some(Self::AggregateDelta),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CategoryImpact {
    pub category: String,
    pub coefficient: f64,
    pub standardized_coefficient: f64,
    /// False when the category had no usable variance in the fit.
    pub defined: bool,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RegressionResult {
    pub target: Option<ImpactTarget>,
    pub observations: usize,
    pub intercept: f64,
    pub r_squared: f64,
    pub impacts: Vec<CategoryImpact>,
}

impl RegressionResult {
    pub fn coefficient(&self, category: &str) -> Option<f64> {
        self.impacts
            .iter()
            .find(|i| i.category == category)
            .map(|i| i.coefficient)
    }

    /// Categories by descending standardized magnitude. Equal magnitudes
    /// are ordered by category name.
    pub fn ranking(&self) -> Vec<&CategoryImpact> {
        let mut ranked: Vec<&CategoryImpact> = self.impacts.iter().collect();
        ranked.sort_by(|a, b| compare_impacts(a, b));
        ranked
    }

    /// The top-ranked defined category, if any category was identifiable.
    pub fn most_impactful(&self) -> Option<&CategoryImpact> {
        self.ranking().into_iter().find(|i| i.defined)
    }

    /// Predict the target for one company's feature values, in category order.
    pub fn predict(&self, features: &[f64]) -> MaturityResult<f64> {
        if features.len() != self.impacts.len() {
            return Err(MaturityError::invalid(format!(
                "prediction needs {} feature values, got {}",
                self.impacts.len(),
                features.len()
            )));
        }
        Ok(self.intercept
            + self
                .impacts
                .iter()
                .zip(features)
                .map(|(i, x)| i.coefficient * x)
                .sum::<f64>())
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ImpactModel {
    target: ImpactTarget,
}

impl ImpactModel {
    pub fn new(target: ImpactTarget) -> Self {
        Self { target }
    }

    pub fn fit(&self, dataset: &AssessmentDataset) -> MaturityResult<RegressionResult> {
        let width = dataset.categories().len();
        let (features, target): (Vec<Vec<f64>>, Vec<f64>) = match self.target {
            ImpactTarget::AfterAggregate => (
                (0..width).map(|c| dataset.column(State::After, c).to_vec()).collect(),
                dataset.aggregate(State::After),
            ),
            ImpactTarget::BeforeAggregate => (
                (0..width).map(|c| dataset.column(State::Before, c).to_vec()).collect(),
                dataset.aggregate(State::Before),
            ),
            ImpactTarget::AggregateDelta => (
                (0..width).map(|c| dataset.category_delta(c)).collect(),
                dataset.aggregate_delta(),
            ),
        };
        let mut result = fit_columns(dataset.categories(), &features, &target)?;
        result.target = Some(self.target);
        log::debug!(
            "impact fit target={:?} n={} r2={:.4} top={:?}",
            self.target,
            result.observations,
            result.r_squared,
            result.most_impactful().map(|i| i.category.as_str())
        );
        Ok(result)
    }
}

/// OLS of `target` on `features` (one column per name) with an intercept.
pub fn fit_columns(
    names: &[String],
    features: &[Vec<f64>],
    target: &[f64],
) -> MaturityResult<RegressionResult> {
    let p = features.len();
    let n = target.len();
    if names.len() != p {
        return Err(MaturityError::invalid(format!("{} names for {p} feature columns", names.len())));
    }
    if let Some(col) = features.iter().find(|c| c.len() != n) {
        return Err(MaturityError::invalid(format!(
            "feature column has {} rows, target has {n}",
            col.len()
        )));
    }
    let required = p + 1;
    if n < required {
        return Err(MaturityError::InsufficientData { rows: n, required });
    }
    if features.iter().flatten().chain(target).any(|v| !v.is_finite()) {
        return Err(MaturityError::invalid("regression inputs must be finite"));
    }

    let mean = |v: &[f64]| v.iter().sum::<f64>() / n as f64;
    let feature_means: Vec<f64> = features.iter().map(|c| mean(c.as_slice())).collect();
    let target_mean = mean(target);

    let x = DMatrix::from_fn(n, p, |i, k| features[k][i] - feature_means[k]);
    let y = DVector::from_fn(n, |i, _| target[i] - target_mean);
    let column_ss: Vec<f64> = (0..p).map(|k| x.column(k).norm_squared()).collect();
    let ss_total = y.norm_squared();

    // |R[k][k]| is what is left of column k once columns 0..k are
    // projected out. Earlier columns win when features are collinear.
    let leftover: Vec<f64> = if p == 0 {
        Vec::new()
    } else {
        x.clone().qr().r().diagonal().iter().map(|d| d * d).collect()
    };
    let defined: Vec<bool> = (0..p)
        .map(|k| column_ss[k] > 0.0 && leftover[k] > column_ss[k] * RANK_TOLERANCE)
        .collect();
    let independent: Vec<usize> = (0..p).filter(|&k| defined[k]).collect();

    let mut coefficients = vec![0.0; p];
    let mut ss_residual = ss_total;
    if !independent.is_empty() {
        let design = DMatrix::from_fn(n, independent.len(), |i, j| x[(i, independent[j])]);
        let qr = design.clone().qr();
        let beta = qr
            .r()
            .solve_upper_triangular(&qr.q().tr_mul(&y))
            .ok_or_else(|| MaturityError::degenerate("rank-deficient design after column selection"))?;
        for (j, &k) in independent.iter().enumerate() {
            coefficients[k] = beta[j];
        }
        ss_residual = (&y - &design * &beta).norm_squared();
    }

    let r_squared = if ss_total > 0.0 {
        (1.0 - ss_residual / ss_total).clamp(0.0, 1.0)
    } else if ss_residual == 0.0 {
        1.0
    } else {
        0.0
    };

    let sd_target = (ss_total / (n - 1) as f64).sqrt();
    let impacts: Vec<CategoryImpact> = (0..p)
        .map(|k| {
            let coefficient = coefficients[k];
            let sd_feature = (column_ss[k] / (n - 1) as f64).sqrt();
            let standardized_coefficient = if defined[k] && sd_target > 0.0 {
                coefficient * sd_feature / sd_target
            } else {
                0.0
            };
            CategoryImpact {
                category: names[k].clone(),
                coefficient,
                standardized_coefficient,
                defined: defined[k],
            }
        })
        .collect();

    let undefined: Vec<&str> = impacts
        .iter()
        .filter(|i| !i.defined)
        .map(|i| i.category.as_str())
        .collect();
    if !undefined.is_empty() {
        log::warn!("no usable variance for {undefined:?}; reported as undefined with coefficient 0");
    }

    let intercept = target_mean
        - impacts
            .iter()
            .zip(&feature_means)
            .map(|(i, m)| i.coefficient * m)
            .sum::<f64>();

    Ok(RegressionResult {
        target: None,
        observations: n,
        intercept,
        r_squared,
        impacts,
    })
}

fn compare_impacts(a: &CategoryImpact, b: &CategoryImpact) -> Ordering {
    b.standardized_coefficient
        .abs()
        .total_cmp(&a.standardized_coefficient.abs())
        .then_with(|| a.category.cmp(&b.category))
}
