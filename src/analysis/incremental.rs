//! Incremental analysis updates
//!
//! Patches a prior analysis for a list of changed paths instead of walking
//! the whole tree again. The result must match what a full analysis of the
//! current tree would produce for the same changes.

use chrono::Utc;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::analyzer::ProjectAnalyzer;
use super::models::ProjectAnalysis;
use crate::documents::models::SemiStructuredLayer;
use crate::error::Result;
use crate::manifest;
use crate::metrics::METRICS;

/// What a changed path turned out to be
#[derive(Debug, Clone, PartialEq, Eq)]
enum Change {
    Document(PathBuf),
    Manifest,
    Ignored,
}

impl ProjectAnalyzer {
    /// Apply `changed` paths (absolute or relative to the prior root) to `prior`
    ///
    /// A path that no longer exists triggers a full analysis at the prior
    /// depth. A document that no longer parses is dropped, matching what a
    /// full scan would skip.
    pub async fn update<P: AsRef<Path>>(
        &self,
        prior: &ProjectAnalysis,
        changed: &[P],
    ) -> Result<ProjectAnalysis> {
        crate::time_operation!(
            METRICS.analysis_duration,
            "incremental",
            self.run_update(prior, changed).await
        )
    }

    async fn run_update<P: AsRef<Path>>(
        &self,
        prior: &ProjectAnalysis,
        changed: &[P],
    ) -> Result<ProjectAnalysis> {
        let root = prior.meta.root.as_path();
        let depth = prior.meta.depth;
        let hits_before = self.cache_stats().hits;

        let mut changes = Vec::with_capacity(changed.len());
        for raw in changed {
            let raw = raw.as_ref();
            let path = if raw.is_absolute() {
                raw.to_path_buf()
            } else {
                root.join(raw)
            };

            if !self.fs.exists(&path).await {
                info!("{} no longer exists; running a full analysis", path.display());
                self.cache().invalidate(&path);
                METRICS.record_full_rescan();
                return self.analyze(root, depth).await;
            }
            changes.push(self.classify(root, path, depth.max_depth()));
        }

        let mut next = prior.clone();
        let mut documents_changed = false;
        let mut roles_changed = false;

        for change in &changes {
            let Change::Document(path) = change else {
                continue;
            };
            match self.scanner.reload(root, path).await {
                Ok(record) => {
                    debug!("Re-parsed {}", path.display());
                    roles_changed |= record.category.has_semi_structured_role();
                    next.full_text.upsert(record);
                    documents_changed = true;
                }
                Err(err) => {
                    warn!("Dropping {}: {}", path.display(), err);
                    METRICS.record_parse_failure();
                    self.cache().invalidate(path);
                    if let Some(stale) = next.full_text.remove(path) {
                        roles_changed |= stale.category.has_semi_structured_role();
                        documents_changed = true;
                    }
                }
            }
        }

        if changes.contains(&Change::Manifest) {
            next.structured = self.extractor.extract(root).await;
        }

        if documents_changed {
            next.full_text.documents.sort_by(|a, b| a.path.cmp(&b.path));
            next.full_text.recompute();
            if roles_changed {
                next.semi_structured =
                    SemiStructuredLayer::from_documents(&next.full_text.documents);
            }
        }

        next.meta.analyzed_at = Utc::now();
        next.meta.total_files = next.full_text.documents.len();
        next.meta.cache_hits = self.cache_stats().hits.saturating_sub(hits_before);
        Ok(next)
    }

    fn classify(&self, root: &Path, path: PathBuf, max_depth: usize) -> Change {
        if manifest::is_manifest(&path) && path.parent() == Some(root) {
            return Change::Manifest;
        }
        if !self.scanner.is_markdown(&path) || self.scanner.is_excluded(root, &path) {
            debug!("Ignoring change to {}", path.display());
            return Change::Ignored;
        }
        let dirs_below_root = path
            .strip_prefix(root)
            .map(|rel| rel.components().count().saturating_sub(1))
            .unwrap_or(usize::MAX);
        if dirs_below_root > max_depth {
            debug!("Ignoring {} beyond depth {}", path.display(), max_depth);
            return Change::Ignored;
        }
        Change::Document(path)
    }
}
