//! Project analysis: structured, semi-structured and full-text layers

pub mod analyzer;
pub mod incremental;
pub mod models;

pub use analyzer::{estimator_from_config, ProjectAnalyzer};
pub use models::{AnalysisMeta, ProjectAnalysis};
