//! Markdown file to `DocumentRecord`

use chrono::{DateTime, Utc};
use std::path::Path;
use std::sync::Arc;

use super::categorizer::categorize;
use super::models::DocumentRecord;
use super::prioritizer::Prioritizer;
use crate::context::token_estimator::TokenEstimator;
use crate::error::{ContextError, Result};
use crate::fs::FileSystem;

/// Reads a file and derives its category, priority and token count
#[derive(Clone)]
pub struct DocumentParser {
    fs: Arc<dyn FileSystem>,
    estimator: Arc<dyn TokenEstimator>,
    prioritizer: Prioritizer,
}

impl DocumentParser {
    pub fn new(
        fs: Arc<dyn FileSystem>,
        estimator: Arc<dyn TokenEstimator>,
        prioritizer: Prioritizer,
    ) -> Self {
        Self {
            fs,
            estimator,
            prioritizer,
        }
    }

    pub fn estimator(&self) -> &Arc<dyn TokenEstimator> {
        &self.estimator
    }

    pub fn prioritizer(&self) -> &Prioritizer {
        &self.prioritizer
    }

    /// Parse `path`; `root` anchors the relative path used for scoring
    pub async fn parse(&self, root: &Path, path: &Path) -> Result<DocumentRecord> {
        let stat = self
            .fs
            .stat(path)
            .await
            .map_err(|e| ContextError::io(path, e))?;
        let content = self
            .fs
            .read_to_string(path)
            .await
            .map_err(|e| ContextError::io(path, e))?;

        let relative_path = path.strip_prefix(root).unwrap_or(path).to_path_buf();
        let category = categorize(&relative_path);
        let priority = self.prioritizer.score(&relative_path, &content);
        let token_count = self.estimator.estimate(&content);

        Ok(DocumentRecord {
            path: path.to_path_buf(),
            relative_path,
            token_count,
            priority,
            category,
            modified: DateTime::<Utc>::from(stat.modified),
            size_bytes: stat.len,
            content,
        })
    }
}
