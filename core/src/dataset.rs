//! Typed columnar dataset and the builder that generates it.
//!
//! Schema (fixed per run, validated at construction):
//!   company_id, company_name, sector,
//!   one Before and one After column per category (in category order).
//! Aggregate and delta columns are derived on read from the category
//! columns and the dataset's aggregator; they are never stored.

use crate::{
    aggregator::ScoreAggregator,
    category::CategorySet,
    config::{validate_generation, AssessmentConfig, GenerationParams},
    error::{MaturityError, MaturityResult},
    rng::RngBank,
    sampler::LatentCorrelationSampler,
    types::{CompanyId, Seed, State, SCORE_MAX, SCORE_MIN},
};
use serde::Serialize;
use std::collections::HashSet;

/// Category-major score storage for one state: `columns[c][row]`.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreMatrix {
    columns: Vec<Vec<f64>>,
}

impl ScoreMatrix {
    pub fn from_columns(columns: Vec<Vec<f64>>) -> Self {
        Self { columns }
    }

    /// Build from per-company rows, each holding one score per category.
    pub fn from_rows(rows: &[Vec<f64>], categories: usize) -> Self {
        let mut columns = vec![Vec::with_capacity(rows.len()); categories];
        for row in rows {
            for (column, value) in columns.iter_mut().zip(row) {
                column.push(*value);
            }
        }
        Self { columns }
    }

    pub fn column(&self, category: usize) -> &[f64] {
        &self.columns[category]
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    fn row(&self, index: usize) -> Vec<f64> {
        self.columns.iter().map(|c| c[index]).collect()
    }
}

/// One category's Before/After pair inside a row view.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CategoryScorePair {
    pub category: String,
    pub before: f64,
    pub after: f64,
}

/// Row-oriented view of one company, with derived aggregates.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CompanyRow {
    pub company_id: CompanyId,
    pub company_name: String,
    pub sector: String,
    pub scores: Vec<CategoryScorePair>,
    pub before_aggregate: f64,
    pub after_aggregate: f64,
    pub aggregate_delta: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AssessmentDataset {
    categories: Vec<String>,
    aggregator: ScoreAggregator,
    company_ids: Vec<CompanyId>,
    company_names: Vec<String>,
    sectors: Vec<String>,
    before: ScoreMatrix,
    after: ScoreMatrix,
}

impl AssessmentDataset {
    /// Assemble a dataset, checking the schema: one column per category
    /// in both states, every column as long as the id column, unique ids,
    /// and every score finite and inside [0, 100].
    pub fn new(
        categories: Vec<String>,
        aggregator: ScoreAggregator,
        company_ids: Vec<CompanyId>,
        company_names: Vec<String>,
        sectors: Vec<String>,
        before: ScoreMatrix,
        after: ScoreMatrix,
    ) -> MaturityResult<Self> {
        let n = company_ids.len();
        if categories.is_empty() {
            return Err(MaturityError::invalid("dataset needs at least one category"));
        }
        if aggregator.len() != categories.len() {
            return Err(MaturityError::invalid(format!(
                "aggregator has {} weights for {} categories",
                aggregator.len(),
                categories.len()
            )));
        }
        if company_names.len() != n || sectors.len() != n {
            return Err(MaturityError::invalid("metadata columns differ in length"));
        }
        {
            let mut seen = HashSet::with_capacity(n);
            if let Some(dup) = company_ids.iter().find(|id| !seen.insert(id.as_str())) {
                return Err(MaturityError::invalid(format!("duplicate company id '{dup}'")));
            }
        }
        for (state, matrix) in [(State::Before, &before), (State::After, &after)] {
            if matrix.width() != categories.len() {
                return Err(MaturityError::invalid(format!(
                    "{} has {} columns for {} categories",
                    state.name(),
                    matrix.width(),
                    categories.len()
                )));
            }
            for (category, column) in categories.iter().zip(&matrix.columns) {
                if column.len() != n {
                    return Err(MaturityError::invalid(format!(
                        "{} column '{category}' has {} rows, expected {n}",
                        state.name(),
                        column.len()
                    )));
                }
                if let Some(bad) = column
                    .iter()
                    .find(|v| !v.is_finite() || **v < SCORE_MIN || **v > SCORE_MAX)
                {
                    return Err(MaturityError::invalid(format!(
                        "{} column '{category}' holds out-of-range score {bad}",
                        state.name()
                    )));
                }
            }
        }
        Ok(Self { categories, aggregator, company_ids, company_names, sectors, before, after })
    }

    pub fn len(&self) -> usize {
        self.company_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.company_ids.is_empty()
    }

    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    pub fn aggregator(&self) -> &ScoreAggregator {
        &self.aggregator
    }

    pub fn company_ids(&self) -> &[CompanyId] {
        &self.company_ids
    }

    pub fn company_names(&self) -> &[String] {
        &self.company_names
    }

    pub fn sectors(&self) -> &[String] {
        &self.sectors
    }

    pub fn matrix(&self, state: State) -> &ScoreMatrix {
        match state {
            State::Before => &self.before,
            State::After  => &self.after,
        }
    }

    pub fn column(&self, state: State, category: usize) -> &[f64] {
        self.matrix(state).column(category)
    }

    /// After − Before for one category.
    pub fn category_delta(&self, category: usize) -> Vec<f64> {
        self.after
            .column(category)
            .iter()
            .zip(self.before.column(category))
            .map(|(a, b)| a - b)
            .collect()
    }

    pub fn scores_for(&self, state: State, row: usize) -> Vec<f64> {
        self.matrix(state).row(row)
    }

    /// Aggregate maturity score of every company for one state.
    pub fn aggregate(&self, state: State) -> Vec<f64> {
        (0..self.len())
            .map(|row| self.aggregator.score(&self.scores_for(state, row)))
            .collect()
    }

    /// After aggregate − Before aggregate, per company.
    pub fn aggregate_delta(&self) -> Vec<f64> {
        self.aggregate(State::After)
            .iter()
            .zip(self.aggregate(State::Before))
            .map(|(a, b)| a - b)
            .collect()
    }

    pub fn row(&self, index: usize) -> Option<CompanyRow> {
        if index >= self.len() {
            return None;
        }
        let before = self.scores_for(State::Before, index);
        let after = self.scores_for(State::After, index);
        let before_aggregate = self.aggregator.score(&before);
        let after_aggregate = self.aggregator.score(&after);
        let scores = self
            .categories
            .iter()
            .zip(before.iter().zip(&after))
            .map(|(category, (b, a))| CategoryScorePair {
                category: category.clone(),
                before: *b,
                after: *a,
            })
            .collect();
        Some(CompanyRow {
            company_id: self.company_ids[index].clone(),
            company_name: self.company_names[index].clone(),
            sector: self.sectors[index].clone(),
            scores,
            before_aggregate,
            after_aggregate,
            aggregate_delta: after_aggregate - before_aggregate,
        })
    }

    pub fn rows(&self) -> impl Iterator<Item = CompanyRow> + '_ {
        (0..self.len()).filter_map(move |i| self.row(i))
    }
}

/// Sequential, zero-padded company identifier: `Company_0001`.
pub fn company_id(index: usize) -> CompanyId {
    format!("Company_{:04}", index + 1)
}

pub struct DatasetBuilder {
    categories: CategorySet,
    params: GenerationParams,
    sectors: Vec<String>,
}

impl DatasetBuilder {
    pub fn new(
        categories: CategorySet,
        params: GenerationParams,
        sectors: Vec<String>,
    ) -> MaturityResult<Self> {
        validate_generation(&params)?;
        if sectors.is_empty() {
            return Err(MaturityError::invalid("at least one sector is required"));
        }
        Ok(Self { categories, params, sectors })
    }

    pub fn from_config(config: &AssessmentConfig) -> MaturityResult<Self> {
        Self::new(config.category_set()?, config.generation, config.sectors.clone())
    }

    pub fn categories(&self) -> &CategorySet {
        &self.categories
    }

    /// Generate `company_count` companies from `seed`. Each company draws
    /// from its own stream, so company i is identical across any N > i.
    pub fn build(&self, company_count: usize, seed: Seed) -> MaturityResult<AssessmentDataset> {
        if company_count == 0 {
            return Err(MaturityError::invalid("company count must be a positive integer"));
        }

        let bank = RngBank::new(seed);
        let sampler = LatentCorrelationSampler::new(&self.categories, self.params, self.sectors.len())?;

        let mut company_ids = Vec::with_capacity(company_count);
        let mut company_names = Vec::with_capacity(company_count);
        let mut sectors = Vec::with_capacity(company_count);
        let mut before_rows = Vec::with_capacity(company_count);
        let mut after_rows = Vec::with_capacity(company_count);
        let mut clamped = 0usize;

        for index in 0..company_count {
            let mut rng = bank.for_company(index as u64);
            let draw = sampler.sample_company(&mut rng);
            let id = company_id(index);
            company_names.push(format!("{id} Inc."));
            company_ids.push(id);
            sectors.push(self.sectors[draw.sector_index].clone());
            clamped += draw.clamped;
            before_rows.push(draw.before);
            after_rows.push(draw.after);
        }

        let total_scores = company_count * self.categories.len() * 2;
        log::debug!(
            "seed={seed} generated {company_count} companies, {clamped}/{total_scores} scores clamped"
        );
        if clamped * 10 > total_scores {
            log::warn!(
                "{clamped} of {total_scores} scores hit the [0, 100] bounds; \
                 observed moments will differ from the configured parameters"
            );
        }

        let width = self.categories.len();
        AssessmentDataset::new(
            self.categories.names(),
            ScoreAggregator::for_categories(&self.categories)?,
            company_ids,
            company_names,
            sectors,
            ScoreMatrix::from_rows(&before_rows, width),
            ScoreMatrix::from_rows(&after_rows, width),
        )
    }
}
