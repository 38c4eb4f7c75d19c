//! Category definitions and the validated, ordered category set.
//!
//! The six assessment dimensions are data, not an enum: a run may
//! use any ordered list of uniquely named categories. Column order in
//! the dataset, the regression and the store always follows the
//! order of the set.

use crate::error::{MaturityError, MaturityResult};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CategoryDefinition {
    pub name: String,
    /// Score points per unit of latent ability.
    pub loading: f64,
    /// Expected Before score of an average company.
    pub baseline: f64,
    /// Multiplier on the company's improvement shift for the After state.
    #[serde(default = "default_sensitivity")]
    pub improvement_sensitivity: f64,
    /// Weight in the aggregate maturity score.
    #[serde(default = "default_weight")]
    pub weight: f64,
}

fn default_sensitivity() -> f64 { 1.0 }
fn default_weight() -> f64 { 1.0 }

impl CategoryDefinition {
    pub fn new(name: &str, loading: f64, baseline: f64, improvement_sensitivity: f64) -> Self {
        Self {
            name: name.to_string(),
            loading,
            baseline,
            improvement_sensitivity,
            weight: 1.0,
        }
    }
}

/// Built-in generation table for the six standard dimensions.
pub fn default_categories() -> Vec<CategoryDefinition> {
    vec![
        CategoryDefinition::new("Strategy",       12.0, 38.0, 1.0),
        CategoryDefinition::new("Infrastructure", 11.0, 36.0, 0.9),
        CategoryDefinition::new("StaffSkills",    10.0, 33.0, 0.8),
        CategoryDefinition::new("DataManagement", 12.0, 35.0, 1.0),
        CategoryDefinition::new("AI",             13.0, 30.0, 1.2),
        CategoryDefinition::new("GreenTech",      10.0, 32.0, 0.9),
    ]
}

/// Strategic weighting of the six standard dimensions, in default order.
pub const STRATEGIC_WEIGHTS: [(&str, f64); 6] = [
    ("Strategy",       0.25),
    ("Infrastructure", 0.15),
    ("StaffSkills",    0.10),
    ("DataManagement", 0.20),
    ("AI",             0.20),
    ("GreenTech",      0.10),
];

/// An ordered, non-empty set of uniquely named categories.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CategorySet {
    definitions: Vec<CategoryDefinition>,
}

impl CategorySet {
    pub fn new(definitions: Vec<CategoryDefinition>) -> MaturityResult<Self> {
        if definitions.is_empty() {
            return Err(MaturityError::invalid("at least one category is required"));
        }
        for (i, def) in definitions.iter().enumerate() {
            if def.name.trim().is_empty() {
                return Err(MaturityError::invalid(format!("category #{i} has an empty name")));
            }
            if definitions[..i].iter().any(|d| d.name == def.name) {
                return Err(MaturityError::invalid(format!("duplicate category '{}'", def.name)));
            }
            let params = [def.loading, def.baseline, def.improvement_sensitivity, def.weight];
            if params.iter().any(|p| !p.is_finite()) {
                return Err(MaturityError::invalid(format!(
                    "category '{}' has a non-finite parameter", def.name
                )));
            }
            if def.weight < 0.0 {
                return Err(MaturityError::invalid(format!(
                    "category '{}' has negative weight {}", def.name, def.weight
                )));
            }
        }
        if definitions.iter().map(|d| d.weight).sum::<f64>() <= 0.0 {
            return Err(MaturityError::invalid("category weights must not all be zero"));
        }
        Ok(Self { definitions })
    }

    pub fn standard() -> Self {
        Self { definitions: default_categories() }
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CategoryDefinition> {
        self.definitions.iter()
    }

    pub fn get(&self, index: usize) -> Option<&CategoryDefinition> {
        self.definitions.get(index)
    }

    pub fn names(&self) -> Vec<String> {
        self.definitions.iter().map(|d| d.name.clone()).collect()
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.definitions.iter().position(|d| d.name == name)
    }

    pub fn weights(&self) -> Vec<f64> {
        self.definitions.iter().map(|d| d.weight).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_set_has_six_named_categories() {
        let set = CategorySet::standard();
        assert_eq!(
            set.names(),
            vec!["Strategy", "Infrastructure", "StaffSkills", "DataManagement", "AI", "GreenTech"]
        );
        assert_eq!(set.index_of("AI"), Some(4));
        assert!(set.weights().iter().all(|w| *w == 1.0));
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let mut defs = default_categories();
        defs.push(CategoryDefinition::new("AI", 1.0, 1.0, 1.0));
        let err = CategorySet::new(defs).unwrap_err();
        assert!(matches!(err, MaturityError::InvalidInput { .. }), "got {err:?}");
    }

    #[test]
    fn empty_and_zero_weight_sets_are_rejected() {
        assert!(CategorySet::new(vec![]).is_err());

        let mut defs = default_categories();
        defs.iter_mut().for_each(|d| d.weight = 0.0);
        assert!(CategorySet::new(defs).is_err());
    }

    #[test]
    fn strategic_weights_cover_the_standard_set() {
        let set = CategorySet::standard();
        for (name, _) in STRATEGIC_WEIGHTS {
            assert!(set.index_of(name).is_some(), "{name} missing from standard set");
        }
        let total: f64 = STRATEGIC_WEIGHTS.iter().map(|(_, w)| w).sum();
        assert!((total - 1.0).abs() < 1e-12);
    }
}
