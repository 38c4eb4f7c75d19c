//! Paired t-test over Before/After aggregate scores.
//!
//! The statistic is signed by After − Before: a positive t means the
//! After state scored higher. Swapping the inputs negates t and leaves
//! the two-tailed p-value unchanged.
//!
//! Degenerate inputs fail explicitly instead of producing NaN or
//! infinite statistics:
//!   - fewer than two pairs (no degrees of freedom)
//!   - zero-variance differences, including identical sequences

use crate::{
    config::validate_alpha,
    dataset::AssessmentDataset,
    error::{MaturityError, MaturityResult},
    types::State,
};
use serde::Serialize;
use statrs::distribution::{ContinuousCDF, StudentsT};

pub const DEFAULT_ALPHA: f64 = 0.05;

/// Spread of the differences, relative to the magnitude of the scores,
/// at or below which the differences count as constant. Subtraction
/// leaves rounding residue near `f64::EPSILON` times that magnitude.
const CONSTANT_SPREAD_TOLERANCE: f64 = 1e-12;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TestResult {
    pub n: usize,
    pub mean_difference: f64,
    pub std_error: f64,
    pub statistic: f64,
    pub degrees_of_freedom: f64,
    pub p_value: f64,
    /// Cohen's d_z: mean difference over the sd of the differences.
    pub effect_size: f64,
    pub alpha_used: f64,
    pub significant: bool,
}

/// Significance decision. A p-value exactly at alpha counts as significant.
pub fn is_significant(p_value: f64, alpha: f64) -> bool {
    p_value <= alpha
}

#[derive(Debug, Clone, Copy)]
pub struct SignificanceTester {
    alpha: f64,
}

impl Default for SignificanceTester {
    fn default() -> Self {
        Self { alpha: DEFAULT_ALPHA }
    }
}

impl SignificanceTester {
    pub fn new(alpha: f64) -> MaturityResult<Self> {
        validate_alpha(alpha)?;
        Ok(Self { alpha })
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    pub fn test_dataset(&self, dataset: &AssessmentDataset) -> MaturityResult<TestResult> {
        self.test(&dataset.aggregate(State::Before), &dataset.aggregate(State::After))
    }

    pub fn test(&self, before: &[f64], after: &[f64]) -> MaturityResult<TestResult> {
        if before.len() != after.len() {
            return Err(MaturityError::MismatchedLength {
                before: before.len(),
                after: after.len(),
            });
        }
        let n = before.len();
        if n < 2 {
            return Err(MaturityError::degenerate(format!(
                "paired test needs at least 2 pairs, got {n}"
            )));
        }

        let diffs: Vec<f64> = after.iter().zip(before).map(|(a, b)| a - b).collect();
        if diffs.iter().any(|d| !d.is_finite()) {
            return Err(MaturityError::invalid("paired scores must be finite"));
        }
        let scale = before
            .iter()
            .chain(after)
            .fold(1.0_f64, |acc, v| acc.max(v.abs()));
        let (lo, hi) = diffs
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &d| (lo.min(d), hi.max(d)));
        if hi - lo <= CONSTANT_SPREAD_TOLERANCE * scale {
            return Err(MaturityError::degenerate(
                "paired differences have zero variance; t statistic is undefined",
            ));
        }

        let mean = diffs.iter().sum::<f64>() / n as f64;
        let variance = diffs.iter().map(|d| (d - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
        let sd = variance.sqrt();

        let std_error = sd / (n as f64).sqrt();
        let statistic = mean / std_error;
        let degrees_of_freedom = (n - 1) as f64;
        let dist = StudentsT::new(0.0, 1.0, degrees_of_freedom)
            .map_err(|e| anyhow::anyhow!("Student-t with df={degrees_of_freedom}: {e}"))?;
        let p_value = (2.0 * dist.sf(statistic.abs())).min(1.0);

        log::debug!(
            "paired t-test n={n} mean_diff={mean:.4} t={statistic:.4} p={p_value:.3e} alpha={}",
            self.alpha
        );

        Ok(TestResult {
            n,
            mean_difference: mean,
            std_error,
            statistic,
            degrees_of_freedom,
            p_value,
            effect_size: mean / sd,
            alpha_used: self.alpha,
            significant: is_significant(p_value, self.alpha),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_closed_form_for_two_degrees_of_freedom() {
        // Differences 1, 2, 4: t = sqrt(7), and for df = 2 the two-tailed
        // p-value is 1 - t / sqrt(2 + t^2) = 1 - sqrt(7) / 3.
        let before = [10.0, 10.0, 10.0];
        let after = [11.0, 12.0, 14.0];
        let result = SignificanceTester::default().test(&before, &after).unwrap();
        assert!((result.statistic - 7f64.sqrt()).abs() < 1e-12);
        assert_eq!(result.degrees_of_freedom, 2.0);
        let expected_p = 1.0 - 7f64.sqrt() / 3.0;
        assert!((result.p_value - expected_p).abs() < 1e-9, "p = {}", result.p_value);
        assert!(!result.significant);
    }

    #[test]
    fn matches_cauchy_for_one_degree_of_freedom() {
        // Differences 1, 3: t = 2, df = 1, p = 1 - (2 / pi) * atan(2).
        let result = SignificanceTester::default()
            .test(&[0.0, 0.0], &[1.0, 3.0])
            .unwrap();
        assert!((result.statistic - 2.0).abs() < 1e-12);
        let expected_p = 1.0 - 2.0 / std::f64::consts::PI * 2f64.atan();
        assert!((result.p_value - expected_p).abs() < 1e-9);
    }

    #[test]
    fn p_value_at_alpha_is_significant() {
        assert!(is_significant(0.05, 0.05));
        assert!(is_significant(0.049_999, 0.05));
        assert!(!is_significant(0.05 + 1e-12, 0.05));
    }

    #[test]
    fn alpha_out_of_range_is_rejected() {
        assert!(SignificanceTester::new(0.0).is_err());
        assert!(SignificanceTester::new(1.0).is_err());
        assert_eq!(SignificanceTester::new(0.01).unwrap().alpha(), 0.01);
    }

    #[test]
    fn constant_nonzero_shift_is_degenerate() {
        let before = [1.0, 2.0, 3.0, 4.0];
        let after = [6.0, 7.0, 8.0, 9.0];
        let err = SignificanceTester::default().test(&before, &after).unwrap_err();
        assert!(matches!(err, MaturityError::DegenerateInput { .. }), "got {err:?}");
    }

    #[test]
    fn single_pair_is_degenerate() {
        let err = SignificanceTester::default().test(&[1.0], &[2.0]).unwrap_err();
        assert!(matches!(err, MaturityError::DegenerateInput { .. }));
    }
}
