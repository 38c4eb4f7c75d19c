//! Latent-variable sampler for correlated Before/After category scores.
//!
//! Per company, in this fixed stream order:
//!   1. sector index         (uniform over the configured sectors)
//!   2. latent ability z     ~ Normal(latent.mean, latent.sd)
//!   3. improvement shift u  ~ Normal(improvement.mean, improvement.sd)
//!   4. Before, per category: loading * z + baseline + noise
//!   5. After,  per category: loading * z + baseline + sensitivity * u + noise'
//!
//! The sector pick reduces a raw u64 modulo the sector count. For a
//! handful of sectors the bias is below 1e-18 and is left in place, since
//! the golden datasets are pinned to it.
//!
//! Every raw value is clamped to [0, 100] (and truncated to whole points
//! when configured). Clamping trims the tails, so observed sample means
//! and variances sit slightly inside the theoretical values for extreme
//! parameters. Downstream tests compare against observed data, never
//! against the nominal parameters.
//!
//! NEVER reorder the draws. Reordering changes every golden dataset.

use crate::{
    category::CategorySet,
    config::GenerationParams,
    error::{MaturityError, MaturityResult},
    rng::{CompanyRng, RngBank},
    types::{clamp_score, State},
};

/// One company's full draw: metadata plus both states.
#[derive(Debug, Clone, PartialEq)]
pub struct CompanyDraw {
    pub sector_index: usize,
    pub latent: f64,
    pub improvement: f64,
    pub before: Vec<f64>,
    pub after: Vec<f64>,
    /// Raw values that fell outside [0, 100] before clamping.
    pub clamped: usize,
}

impl CompanyDraw {
    pub fn scores(&self, state: State) -> &[f64] {
        match state {
            State::Before => &self.before,
            State::After  => &self.after,
        }
    }
}

pub struct LatentCorrelationSampler<'a> {
    categories: &'a CategorySet,
    params: GenerationParams,
    sector_count: usize,
}

impl<'a> LatentCorrelationSampler<'a> {
    pub fn new(
        categories: &'a CategorySet,
        params: GenerationParams,
        sector_count: usize,
    ) -> MaturityResult<Self> {
        if sector_count == 0 {
            return Err(MaturityError::invalid("sampler needs at least one sector"));
        }
        Ok(Self { categories, params, sector_count })
    }

    pub fn sample_company(&self, rng: &mut CompanyRng) -> CompanyDraw {
        let sector_index = rng.next_u64_below(self.sector_count as u64) as usize;
        let latent = rng.normal(self.params.latent.mean, self.params.latent.sd);
        let improvement = rng.normal(self.params.improvement.mean, self.params.improvement.sd);

        let mut clamped = 0;
        let before = self
            .categories
            .iter()
            .map(|c| {
                let raw = c.loading * latent + c.baseline + self.params.noise_sd * rng.standard_normal();
                self.finish(raw, &mut clamped)
            })
            .collect();
        let after = self
            .categories
            .iter()
            .map(|c| {
                let raw = c.loading * latent
                    + c.baseline
                    + c.improvement_sensitivity * improvement
                    + self.params.noise_sd * rng.standard_normal();
                self.finish(raw, &mut clamped)
            })
            .collect();

        CompanyDraw { sector_index, latent, improvement, before, after, clamped }
    }

    /// Scores for one state of one company, drawn from that company's
    /// own stream in `bank`. Both states come from the same draw, so
    /// asking for After alone yields the same values as the full dataset.
    pub fn sample_state(&self, bank: &RngBank, company_index: u64, state: State) -> Vec<f64> {
        let mut rng = bank.for_company(company_index);
        self.sample_company(&mut rng).scores(state).to_vec()
    }

    fn finish(&self, raw: f64, clamped: &mut usize) -> f64 {
        let value = clamp_score(raw);
        if value != raw {
            *clamped += 1;
        }
        if self.params.whole_point_scores {
            value.floor()
        } else {
            value
        }
    }
}
