//! Shared primitive types used across the generator and analysis.

use serde::{Deserialize, Serialize};

/// A reproducibility seed for one run.
pub type Seed = u64;

/// A stable, unique identifier for one company in a run.
pub type CompanyId = String;

/// Lower bound of every category score.
pub const SCORE_MIN: f64 = 0.0;

/// Upper bound of every category score.
pub const SCORE_MAX: f64 = 100.0;

/// The two measurement points of an assessment.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum State {
    Before,
    After,
}

impl State {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Before => "before",
            Self::After  => "after",
        }
    }
}

/// Clamp a raw draw into the score range. NaN maps to the lower bound.
pub fn clamp_score(raw: f64) -> f64 {
    if raw.is_nan() {
        return SCORE_MIN;
    }
    raw.clamp(SCORE_MIN, SCORE_MAX)
}
