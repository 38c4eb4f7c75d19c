//! Synthetic digital-maturity assessments: a seeded Before/After panel
//! generator plus the regression and paired-test analysis over it.

pub mod aggregator;
pub mod category;
pub mod config;
pub mod dataset;
pub mod error;
pub mod impact;
pub mod pipeline;
pub mod rng;
pub mod sampler;
pub mod significance;
pub mod store;
pub mod summary;
pub mod types;
