//! Data models for context selection

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use super::strategy::SelectionStrategy;
use crate::documents::models::{DocumentRecord, SemiStructuredLayer};
use crate::error::ContextError;
use crate::manifest::models::StructuredLayer;

/// Downstream task a context selection is made for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskType {
    MarketingContent,
    TechnicalDocs,
    ApiDocumentation,
    UserGuide,
    Changelog,
    ReadmeEnhancement,
    ProjectAnalysis,
    FeatureExtraction,
    #[default]
    General,
}

impl TaskType {
    pub const ALL: [TaskType; 9] = [
        TaskType::MarketingContent,
        TaskType::TechnicalDocs,
        TaskType::ApiDocumentation,
        TaskType::UserGuide,
        TaskType::Changelog,
        TaskType::ReadmeEnhancement,
        TaskType::ProjectAnalysis,
        TaskType::FeatureExtraction,
        TaskType::General,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskType::MarketingContent => "marketing-content",
            TaskType::TechnicalDocs => "technical-docs",
            TaskType::ApiDocumentation => "api-documentation",
            TaskType::UserGuide => "user-guide",
            TaskType::Changelog => "changelog",
            TaskType::ReadmeEnhancement => "readme-enhancement",
            TaskType::ProjectAnalysis => "project-analysis",
            TaskType::FeatureExtraction => "feature-extraction",
            TaskType::General => "general",
        }
    }

    /// Parse a task identifier, mapping anything unknown to `General`
    pub fn from_identifier(identifier: &str) -> Self {
        identifier.parse().unwrap_or_else(|_| {
            tracing::debug!("Unknown task type '{}', using general", identifier);
            TaskType::General
        })
    }
}

impl fmt::Display for TaskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskType {
    type Err = ContextError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace('_', "-");
        TaskType::ALL
            .into_iter()
            .find(|t| t.as_str() == normalized)
            .ok_or_else(|| ContextError::Configuration(format!("unknown task type: {s}")))
    }
}

/// Context chosen for one task
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectedContext {
    pub task_type: TaskType,
    pub strategy: SelectionStrategy,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub structured: Option<StructuredLayer>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub semi_structured: Option<SemiStructuredLayer>,
    /// Chosen records in budget order; at most one is truncated
    pub documents: Vec<DocumentRecord>,
    pub total_tokens: usize,
    /// Ceiling the selection was made under
    pub max_tokens: usize,
    /// Records that passed the category filter
    pub candidate_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub truncated_path: Option<PathBuf>,
    pub rationale: String,
}

impl SelectedContext {
    pub fn is_truncated(&self) -> bool {
        self.truncated_path.is_some()
    }

    pub fn contains(&self, relative_path: &str) -> bool {
        self.documents
            .iter()
            .any(|d| d.relative_path == std::path::Path::new(relative_path))
    }
}
