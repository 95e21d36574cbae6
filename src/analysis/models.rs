//! Three-layer project analysis

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::documents::models::{FullTextLayer, SemiStructuredLayer};
use crate::documents::scanner::AnalysisDepth;
use crate::manifest::models::StructuredLayer;

/// Bookkeeping for one analysis pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisMeta {
    pub analyzed_at: DateTime<Utc>,
    pub root: PathBuf,
    /// Markdown files in the full-text layer
    pub total_files: usize,
    /// Records served from cache during the pass
    pub cache_hits: u64,
    pub depth: AnalysisDepth,
}

/// Result of analyzing a project
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectAnalysis {
    pub structured: StructuredLayer,
    pub semi_structured: SemiStructuredLayer,
    pub full_text: FullTextLayer,
    pub meta: AnalysisMeta,
}

impl ProjectAnalysis {
    pub fn project_name(&self) -> &str {
        &self.structured.metadata.name
    }

    /// Every semi-structured document also appears in the full-text layer
    pub fn is_consistent(&self) -> bool {
        let counted: usize = self.full_text.category_counts.values().sum();
        counted == self.full_text.documents.len()
            && self
                .semi_structured
                .documents()
                .all(|d| self.full_text.contains(&d.path))
    }
}
