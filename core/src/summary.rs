//! Descriptive summaries handed to reporting collaborators:
//! headline means, growth per sector, leaderboards and the
//! correlation matrix of After category scores.

use crate::{dataset::AssessmentDataset, types::{CompanyId, State}};
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SectorGrowth {
    pub sector: String,
    pub companies: usize,
    pub mean_growth: f64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct LeaderboardEntry {
    pub company_id: CompanyId,
    pub company_name: String,
    pub sector: String,
    pub after_aggregate: f64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CorrelationMatrix {
    pub categories: Vec<String>,
    pub values: Vec<Vec<f64>>,
}

impl CorrelationMatrix {
    pub fn get(&self, a: &str, b: &str) -> Option<f64> {
        let i = self.categories.iter().position(|c| c == a)?;
        let j = self.categories.iter().position(|c| c == b)?;
        Some(self.values[i][j])
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MaturitySummary {
    pub companies: usize,
    pub mean_before: f64,
    pub mean_after: f64,
    pub mean_growth: f64,
    pub sector_growth: Vec<SectorGrowth>,
    pub top: Vec<LeaderboardEntry>,
    pub bottom: Vec<LeaderboardEntry>,
    pub after_correlation: CorrelationMatrix,
}

pub fn summarize(dataset: &AssessmentDataset, leaderboard_size: usize) -> MaturitySummary {
    let before = dataset.aggregate(State::Before);
    let after = dataset.aggregate(State::After);
    let growth = dataset.aggregate_delta();

    MaturitySummary {
        companies: dataset.len(),
        mean_before: mean(&before),
        mean_after: mean(&after),
        mean_growth: mean(&growth),
        sector_growth: sector_growth(dataset.sectors(), &growth),
        top: leaderboard(dataset, &after, leaderboard_size, true),
        bottom: leaderboard(dataset, &after, leaderboard_size, false),
        after_correlation: correlation_matrix(dataset, State::After),
    }
}

/// Mean growth per sector, sorted by sector name.
pub fn sector_growth(sectors: &[String], growth: &[f64]) -> Vec<SectorGrowth> {
    let mut groups: BTreeMap<&str, (usize, f64)> = BTreeMap::new();
    for (sector, g) in sectors.iter().zip(growth) {
        let entry = groups.entry(sector.as_str()).or_insert((0, 0.0));
        entry.0 += 1;
        entry.1 += g;
    }
    groups
        .into_iter()
        .map(|(sector, (companies, total))| SectorGrowth {
            sector: sector.to_string(),
            companies,
            mean_growth: total / companies as f64,
        })
        .collect()
}

/// Highest (or lowest) After aggregates. Ties go to the smaller company id.
fn leaderboard(
    dataset: &AssessmentDataset,
    after: &[f64],
    size: usize,
    highest: bool,
) -> Vec<LeaderboardEntry> {
    let ids = dataset.company_ids();
    let mut order: Vec<usize> = (0..dataset.len()).collect();
    order.sort_by(|&a, &b| {
        let by_score = if highest {
            after[b].total_cmp(&after[a])
        } else {
            after[a].total_cmp(&after[b])
        };
        by_score.then_with(|| ids[a].cmp(&ids[b]))
    });
    order
        .into_iter()
        .take(size)
        .map(|i| LeaderboardEntry {
            company_id: ids[i].clone(),
            company_name: dataset.company_names()[i].clone(),
            sector: dataset.sectors()[i].clone(),
            after_aggregate: after[i],
        })
        .collect()
}

/// Pearson correlation between every pair of category columns.
/// A pair involving a constant column reports 0.0, except the diagonal.
pub fn correlation_matrix(dataset: &AssessmentDataset, state: State) -> CorrelationMatrix {
    let width = dataset.categories().len();
    let columns: Vec<&[f64]> = (0..width).map(|c| dataset.column(state, c)).collect();
    let mut values = vec![vec![0.0; width]; width];
    for i in 0..width {
        values[i][i] = 1.0;
        for j in (i + 1)..width {
            let r = pearson(columns[i], columns[j]);
            values[i][j] = r;
            values[j][i] = r;
        }
    }
    CorrelationMatrix {
        categories: dataset.categories().to_vec(),
        values,
    }
}

pub fn pearson(x: &[f64], y: &[f64]) -> f64 {
    let mx = mean(x);
    let my = mean(y);
    let (mut sxy, mut sxx, mut syy) = (0.0, 0.0, 0.0);
    for (a, b) in x.iter().zip(y) {
        sxy += (a - mx) * (b - my);
        sxx += (a - mx).powi(2);
        syy += (b - my).powi(2);
    }
    if sxx <= 0.0 || syy <= 0.0 {
        return 0.0;
    }
    (sxy / (sxx * syy).sqrt()).clamp(-1.0, 1.0)
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}
