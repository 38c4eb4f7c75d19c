use crate::{
    category::{default_categories, CategoryDefinition, CategorySet, STRATEGIC_WEIGHTS},
    error::{MaturityError, MaturityResult},
    significance::DEFAULT_ALPHA,
    types::Seed,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const DEFAULT_COMPANY_COUNT: usize = 1000;
pub const DEFAULT_SEED: Seed = 42;

/// Mean and standard deviation of a normal draw.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct NormalParams {
    pub mean: f64,
    pub sd: f64,
}

/// Everything the sampler needs besides the category table.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GenerationParams {
    /// Per-company latent ability.
    pub latent: NormalParams,
    /// Per-company improvement shift applied to the After state.
    pub improvement: NormalParams,
    /// Independent per-category measurement noise.
    pub noise_sd: f64,
    /// Truncate clamped scores to whole points.
    pub whole_point_scores: bool,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            latent:             NormalParams { mean: 0.0, sd: 1.0 },
            improvement:        NormalParams { mean: 37.0, sd: 6.0 },
            noise_sd:           8.0,
            whole_point_scores: true,
        }
    }
}

fn default_sectors() -> Vec<String> {
    ["Manufacturing", "Retail", "Healthcare", "Logistics", "Finance"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AssessmentConfig {
    pub company_count: usize,
    pub seed: Seed,
    pub alpha: f64,
    #[serde(flatten)]
    pub generation: GenerationParams,
    pub sectors: Vec<String>,
    pub categories: Vec<CategoryDefinition>,
    /// Per-category overrides, applied on top of `categories` by name.
    pub category_weights: Option<BTreeMap<String, f64>>,
    pub category_loadings: Option<BTreeMap<String, f64>>,
    pub category_baselines: Option<BTreeMap<String, f64>>,
}

impl Default for AssessmentConfig {
    fn default() -> Self {
        Self {
            company_count:      DEFAULT_COMPANY_COUNT,
            seed:               DEFAULT_SEED,
            alpha:              DEFAULT_ALPHA,
            generation:         GenerationParams::default(),
            sectors:            default_sectors(),
            categories:         default_categories(),
            category_weights:   None,
            category_loadings:  None,
            category_baselines: None,
        }
    }
}

impl AssessmentConfig {
    /// Load from a JSON file. Missing fields fall back to defaults.
    /// In tests, use AssessmentConfig::default_test().
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
        let config: AssessmentConfig = serde_json::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Cannot parse {path}: {e}"))?;
        Ok(config)
    }

    /// Small, fast config for unit and integration tests.
    pub fn default_test() -> Self {
        Self {
            company_count: 200,
            seed: 7,
            ..Self::default()
        }
    }

    /// Weight the standard dimensions by strategic importance instead of equally.
    pub fn with_strategic_weights(mut self) -> Self {
        let weights = STRATEGIC_WEIGHTS
            .iter()
            .map(|(name, w)| (name.to_string(), *w))
            .collect();
        self.category_weights = Some(weights);
        self
    }

    pub fn validate(&self) -> MaturityResult<()> {
        if self.company_count == 0 {
            return Err(MaturityError::invalid("company_count must be a positive integer"));
        }
        validate_alpha(self.alpha)?;
        validate_generation(&self.generation)?;
        if self.sectors.is_empty() {
            return Err(MaturityError::invalid("at least one sector is required"));
        }
        self.category_set()?;
        Ok(())
    }

    /// The category table with every by-name override applied, validated.
    pub fn category_set(&self) -> MaturityResult<CategorySet> {
        let mut definitions = self.categories.clone();
        apply_override(&mut definitions, &self.category_weights, "category_weights", |d, v| d.weight = v)?;
        apply_override(&mut definitions, &self.category_loadings, "category_loadings", |d, v| d.loading = v)?;
        apply_override(&mut definitions, &self.category_baselines, "category_baselines", |d, v| d.baseline = v)?;
        CategorySet::new(definitions)
    }
}

pub fn validate_alpha(alpha: f64) -> MaturityResult<()> {
    if !(alpha > 0.0 && alpha < 1.0) {
        return Err(MaturityError::invalid(format!("alpha must be in (0, 1), got {alpha}")));
    }
    Ok(())
}

pub fn validate_generation(params: &GenerationParams) -> MaturityResult<()> {
    let values = [
        ("latent.mean", params.latent.mean),
        ("latent.sd", params.latent.sd),
        ("improvement.mean", params.improvement.mean),
        ("improvement.sd", params.improvement.sd),
        ("noise_sd", params.noise_sd),
    ];
    for (name, value) in values {
        if !value.is_finite() {
            return Err(MaturityError::invalid(format!("{name} must be finite, got {value}")));
        }
    }
    for (name, sd) in [
        ("latent.sd", params.latent.sd),
        ("improvement.sd", params.improvement.sd),
        ("noise_sd", params.noise_sd),
    ] {
        if sd < 0.0 {
            return Err(MaturityError::invalid(format!("{name} must not be negative, got {sd}")));
        }
    }
    Ok(())
}

fn apply_override(
    definitions: &mut [CategoryDefinition],
    overrides: &Option<BTreeMap<String, f64>>,
    field: &str,
    set: impl Fn(&mut CategoryDefinition, f64),
) -> MaturityResult<()> {
    let Some(overrides) = overrides else {
        return Ok(());
    };
    for (name, value) in overrides {
        let def = definitions
            .iter_mut()
            .find(|d| &d.name == name)
            .ok_or_else(|| MaturityError::invalid(format!("{field}: unknown category '{name}'")))?;
        set(def, *value);
    }
    Ok(())
}
