//! Context engine
//!
//! Analyzes a project's manifests and Markdown corpus into a layered
//! [`ProjectAnalysis`], then selects task-specific context from it under a
//! token budget.
//!
//! ```no_run
//! use context_engine::{AnalysisDepth, ContextSelector, EngineConfig, ProjectAnalyzer, TaskType};
//! use std::path::Path;
//!
//! # async fn run() -> context_engine::Result<()> {
//! let config = EngineConfig::load(None)?;
//! let analyzer = ProjectAnalyzer::from_config(&config)?;
//! let analysis = analyzer.analyze(Path::new("."), AnalysisDepth::Balanced).await?;
//!
//! let selector = ContextSelector::new(
//!     context_engine::analysis::estimator_from_config(&config)?,
//!     config.budget.clone(),
//! )?;
//! let context = selector.select(&analysis, TaskType::MarketingContent);
//! println!("{}", context.rationale);
//! # Ok(())
//! # }
//! ```

pub mod analysis;
pub mod config;
pub mod context;
pub mod documents;
pub mod error;
pub mod fs;
pub mod logging;
pub mod manifest;
pub mod metrics;

pub use analysis::{ProjectAnalysis, ProjectAnalyzer};
pub use config::EngineConfig;
pub use context::{ContextSelector, SelectedContext, SelectionStrategy, TaskType};
pub use documents::{AnalysisDepth, CacheStats, Category, DocumentCache, DocumentRecord};
pub use error::{ContextError, Result};
pub use manifest::models::StructuredLayer;
