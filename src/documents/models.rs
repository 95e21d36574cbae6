//! Data models for scanned documents

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use super::markdown;

/// Semantic role of a document within a project
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Readme,
    Changelog,
    Guide,
    Api,
    Example,
    Test,
    Config,
    Docs,
    Other,
}

impl Category {
    pub const ALL: [Category; 9] = [
        Category::Readme,
        Category::Changelog,
        Category::Guide,
        Category::Api,
        Category::Example,
        Category::Test,
        Category::Config,
        Category::Docs,
        Category::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Readme => "readme",
            Category::Changelog => "changelog",
            Category::Guide => "guide",
            Category::Api => "api",
            Category::Example => "example",
            Category::Test => "test",
            Category::Config => "config",
            Category::Docs => "docs",
            Category::Other => "other",
        }
    }

    /// Categories that own a slot in the semi-structured layer
    pub fn has_semi_structured_role(&self) -> bool {
        matches!(self, Category::Readme | Category::Changelog | Category::Guide)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One parsed Markdown file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentRecord {
    /// Absolute path on disk
    pub path: PathBuf,
    /// Path relative to the analysis root
    pub relative_path: PathBuf,
    pub content: String,
    pub token_count: usize,
    /// Heuristic score in [0, 100]
    pub priority: u8,
    pub category: Category,
    pub modified: DateTime<Utc>,
    pub size_bytes: u64,
}

impl DocumentRecord {
    /// Number of directories between the root and this file
    pub fn depth(&self) -> usize {
        self.relative_path.components().count().saturating_sub(1)
    }
}

/// Full-text layer: every record plus aggregates
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FullTextLayer {
    pub documents: Vec<DocumentRecord>,
    pub total_tokens: usize,
    pub average_priority: f64,
    pub category_counts: BTreeMap<Category, usize>,
}

impl FullTextLayer {
    pub fn from_documents(documents: Vec<DocumentRecord>) -> Self {
        let mut layer = Self {
            documents,
            ..Self::default()
        };
        layer.recompute();
        layer
    }

    /// Recompute token total, mean priority and category counts
    pub fn recompute(&mut self) {
        self.total_tokens = self.documents.iter().map(|d| d.token_count).sum();
        self.average_priority = if self.documents.is_empty() {
            0.0
        } else {
            let sum: u64 = self.documents.iter().map(|d| d.priority as u64).sum();
            sum as f64 / self.documents.len() as f64
        };
        self.category_counts.clear();
        for doc in &self.documents {
            *self.category_counts.entry(doc.category).or_insert(0) += 1;
        }
    }

    pub fn get(&self, path: &Path) -> Option<&DocumentRecord> {
        self.documents.iter().find(|d| d.path == path)
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.get(path).is_some()
    }

    /// Replace the record with the same path, or append it
    pub fn upsert(&mut self, record: DocumentRecord) {
        match self.documents.iter_mut().find(|d| d.path == record.path) {
            Some(existing) => *existing = record,
            None => self.documents.push(record),
        }
    }

    pub fn remove(&mut self, path: &Path) -> Option<DocumentRecord> {
        let idx = self.documents.iter().position(|d| d.path == path)?;
        Some(self.documents.remove(idx))
    }
}

/// A heading inside a document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub level: u8,
    pub title: String,
}

/// A fenced code sample
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeBlock {
    pub language: Option<String>,
    pub code: String,
}

/// A primary document enriched with derived structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedDocument {
    pub path: PathBuf,
    pub title: String,
    pub sections: Vec<Section>,
    pub code_blocks: Vec<CodeBlock>,
    pub summary: String,
}

impl EnrichedDocument {
    pub fn from_record(record: &DocumentRecord) -> Self {
        Self {
            path: record.path.clone(),
            title: markdown::title(&record.content, &record.path),
            sections: markdown::sections(&record.content),
            code_blocks: markdown::code_blocks(&record.content),
            summary: markdown::summary(&record.content, markdown::SUMMARY_MAX_CHARS),
        }
    }
}

/// Semi-structured layer: at most one document per special role
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SemiStructuredLayer {
    pub readme: Option<EnrichedDocument>,
    pub changelog: Option<EnrichedDocument>,
    pub guide: Option<EnrichedDocument>,
}

impl SemiStructuredLayer {
    /// Pick the shallowest document for each role (highest priority on ties)
    pub fn from_documents(documents: &[DocumentRecord]) -> Self {
        let pick = |category: Category| {
            documents
                .iter()
                .filter(|d| d.category == category)
                .min_by(|a, b| {
                    a.depth()
                        .cmp(&b.depth())
                        .then_with(|| b.priority.cmp(&a.priority))
                        .then_with(|| a.path.cmp(&b.path))
                })
                .map(EnrichedDocument::from_record)
        };

        Self {
            readme: pick(Category::Readme),
            changelog: pick(Category::Changelog),
            guide: pick(Category::Guide),
        }
    }

    pub fn documents(&self) -> impl Iterator<Item = &EnrichedDocument> {
        [&self.readme, &self.changelog, &self.guide]
            .into_iter()
            .flatten()
    }

    pub fn is_empty(&self) -> bool {
        self.documents().next().is_none()
    }
}
