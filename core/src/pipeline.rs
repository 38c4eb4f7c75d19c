//! The assessment pipeline: generate, then analyse.
//!
//! EXECUTION ORDER (fixed):
//!   1. DatasetBuilder:     companies from (company_count, seed)
//!   2. ImpactModel:        feature importance on the chosen target
//!   3. SignificanceTester: paired test, Before vs After aggregates
//!   4. summarize:          descriptive tables for reporting
//!
//! RULES:
//!   - Every stage reads only the dataset produced in step 1.
//!   - All randomness lives in step 1 and flows from the config seed.
//!   - A failing stage fails the run; no stage substitutes defaults.

use crate::{
    config::AssessmentConfig,
    dataset::{AssessmentDataset, DatasetBuilder},
    error::MaturityResult,
    impact::{ImpactModel, ImpactTarget, RegressionResult},
    significance::{SignificanceTester, TestResult},
    summary::{summarize, MaturitySummary},
    types::Seed,
};
use serde::Serialize;

pub const DEFAULT_LEADERBOARD_SIZE: usize = 10;

/// Everything a reporting layer needs besides the raw rows.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub seed: Seed,
    pub company_count: usize,
    pub categories: Vec<String>,
    pub weights: Vec<f64>,
    pub summary: MaturitySummary,
    pub regression: RegressionResult,
    pub significance: TestResult,
}

pub struct RunOutput {
    pub dataset: AssessmentDataset,
    pub report: RunReport,
}

pub struct AssessmentPipeline {
    config: AssessmentConfig,
    builder: DatasetBuilder,
    tester: SignificanceTester,
    target: ImpactTarget,
    leaderboard_size: usize,
}

impl AssessmentPipeline {
    pub fn new(config: AssessmentConfig) -> MaturityResult<Self> {
        config.validate()?;
        let builder = DatasetBuilder::from_config(&config)?;
        let tester = SignificanceTester::new(config.alpha)?;
        Ok(Self {
            config,
            builder,
            tester,
            target: ImpactTarget::AfterAggregate,
            leaderboard_size: DEFAULT_LEADERBOARD_SIZE,
        })
    }

    pub fn with_target(mut self, target: ImpactTarget) -> Self {
        self.target = target;
        self
    }

    pub fn with_leaderboard_size(mut self, size: usize) -> Self {
        self.leaderboard_size = size;
        self
    }

    pub fn config(&self) -> &AssessmentConfig {
        &self.config
    }

    pub fn run(&self) -> MaturityResult<RunOutput> {
        let seed = self.config.seed;
        let company_count = self.config.company_count;
        log::info!("run seed={seed} companies={company_count} target={:?}", self.target);

        let dataset = self.builder.build(company_count, seed)?;
        let regression = ImpactModel::new(self.target).fit(&dataset)?;
        let significance = self.tester.test_dataset(&dataset)?;
        let summary = summarize(&dataset, self.leaderboard_size);

        log::info!(
            "run seed={seed}: mean {:.2} -> {:.2}, t={:.2}, p={:.3e}, significant={}",
            summary.mean_before,
            summary.mean_after,
            significance.statistic,
            significance.p_value,
            significance.significant
        );

        let report = RunReport {
            seed,
            company_count,
            categories: dataset.categories().to_vec(),
            weights: dataset.aggregator().normalized_weights(),
            summary,
            regression,
            significance,
        };
        Ok(RunOutput { dataset, report })
    }
}
