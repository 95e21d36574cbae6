//! Corpus scanner: walks a project tree and parses every Markdown file
//!
//! The walk is depth-bounded and skips hidden entries plus a fixed list of
//! build/dependency directories. A file that fails to parse and a directory
//! that cannot be listed are logged and skipped; neither aborts the scan.

use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::cache::DocumentCache;
use super::models::{DocumentRecord, FullTextLayer};
use super::parser::DocumentParser;
use crate::error::{ContextError, Result};
use crate::fs::{DirFilter, FileSystem};
use crate::metrics::METRICS;

/// Directories never descended into
pub const DEFAULT_IGNORED_DIRS: &[&str] = &[
    "node_modules",
    "dist",
    "build",
    "out",
    "target",
    "coverage",
    ".next",
    ".nuxt",
    "vendor",
];

/// Shared flag a caller can set to stop a scan between files
pub type CancelFlag = Arc<AtomicBool>;

/// How deep an analysis pass walks the tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisDepth {
    /// Shallow pass, two directory levels
    Minimal,
    #[default]
    Balanced,
    /// Deep pass, six directory levels
    Comprehensive,
}

impl AnalysisDepth {
    pub fn max_depth(&self) -> usize {
        match self {
            AnalysisDepth::Minimal => 2,
            AnalysisDepth::Balanced => 4,
            AnalysisDepth::Comprehensive => 6,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AnalysisDepth::Minimal => "minimal",
            AnalysisDepth::Balanced => "balanced",
            AnalysisDepth::Comprehensive => "comprehensive",
        }
    }
}

impl fmt::Display for AnalysisDepth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AnalysisDepth {
    type Err = ContextError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "minimal" | "shallow" => Ok(AnalysisDepth::Minimal),
            "balanced" => Ok(AnalysisDepth::Balanced),
            "comprehensive" | "deep" => Ok(AnalysisDepth::Comprehensive),
            other => Err(ContextError::Configuration(format!(
                "unknown analysis depth: {other}"
            ))),
        }
    }
}

/// Scanner configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Extra directory names to skip, on top of [`DEFAULT_IGNORED_DIRS`]
    pub extra_ignored_dirs: Vec<String>,
    /// File extensions treated as Markdown (lower-case, no dot)
    pub markdown_extensions: Vec<String>,
    /// Maximum files read concurrently
    pub concurrency: usize,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            extra_ignored_dirs: vec![],
            markdown_extensions: vec!["md".into(), "markdown".into(), "mdx".into()],
            concurrency: 8,
        }
    }
}

/// Result of one walk
#[derive(Debug, Clone, Default)]
pub struct ScanOutcome {
    pub layer: FullTextLayer,
    /// Markdown files discovered, including ones that failed to parse
    pub files_found: usize,
    pub failures: usize,
    /// Records served from cache during this walk
    pub cache_hits: u64,
}

pub struct CorpusScanner {
    fs: Arc<dyn FileSystem>,
    cache: Arc<DocumentCache>,
    parser: DocumentParser,
    config: ScanConfig,
}

impl CorpusScanner {
    pub fn new(
        fs: Arc<dyn FileSystem>,
        cache: Arc<DocumentCache>,
        parser: DocumentParser,
        config: ScanConfig,
    ) -> Self {
        Self {
            fs,
            cache,
            parser,
            config,
        }
    }

    pub fn cache(&self) -> &Arc<DocumentCache> {
        &self.cache
    }

    pub fn is_markdown(&self, path: &Path) -> bool {
        path.extension()
            .map(|ext| ext.to_string_lossy().to_lowercase())
            .is_some_and(|ext| self.config.markdown_extensions.iter().any(|m| *m == ext))
    }

    fn is_ignored_name(&self, name: &str) -> bool {
        name.starts_with('.')
            || DEFAULT_IGNORED_DIRS.contains(&name)
            || self.config.extra_ignored_dirs.iter().any(|d| d == name)
    }

    /// Whether a path under `root` would be skipped by the walk
    /// (hidden or ignored directory anywhere along the way, or a hidden file).
    pub fn is_excluded(&self, root: &Path, path: &Path) -> bool {
        let Ok(relative) = path.strip_prefix(root) else {
            return true;
        };
        relative.components().any(|c| match c {
            Component::Normal(name) => self.is_ignored_name(&name.to_string_lossy()),
            _ => true,
        })
    }

    /// Parse one file through the cache
    pub async fn load(&self, root: &Path, path: &Path) -> Result<DocumentRecord> {
        self.cache
            .get_or_parse(path, || self.parser.parse(root, path))
            .await
    }

    /// Parse one file bypassing the cache, then store the fresh record
    pub async fn reload(&self, root: &Path, path: &Path) -> Result<DocumentRecord> {
        self.cache
            .refresh(path, || self.parser.parse(root, path))
            .await
    }

    /// Collect Markdown paths up to `max_depth` directory levels below `root`
    pub async fn discover(&self, root: &Path, max_depth: usize) -> Vec<PathBuf> {
        let extra = self.config.extra_ignored_dirs.clone();
        let skip_dir: DirFilter = Arc::new(move |name: &str| {
            DEFAULT_IGNORED_DIRS.contains(&name) || extra.iter().any(|d| d == name)
        });

        match self.fs.walk(root, max_depth, skip_dir).await {
            Ok(paths) => paths.into_iter().filter(|p| self.is_markdown(p)).collect(),
            Err(err) => {
                warn!("Cannot walk {}: {}", root.display(), err);
                Vec::new()
            }
        }
    }

    /// Walk `root` and build the full-text layer
    pub async fn scan(
        &self,
        root: &Path,
        max_depth: usize,
        cancel: Option<&CancelFlag>,
    ) -> Result<ScanOutcome> {
        let paths = self.discover(root, max_depth).await;
        let files_found = paths.len();
        let hits_before = self.cache.stats().hits;
        debug!("Found {} markdown files under {}", files_found, root.display());

        let results: Vec<Option<(PathBuf, Result<DocumentRecord>)>> = stream::iter(paths)
            .map(|path| async move {
                if cancel.is_some_and(|c| c.load(Ordering::Relaxed)) {
                    return None;
                }
                let result = self.load(root, &path).await;
                Some((path, result))
            })
            .buffered(self.config.concurrency.max(1))
            .collect()
            .await;

        if cancel.is_some_and(|c| c.load(Ordering::Relaxed)) {
            info!("Scan of {} cancelled", root.display());
            return Err(ContextError::Cancelled);
        }

        let mut documents = Vec::with_capacity(files_found);
        let mut failures = 0;
        for (path, result) in results.into_iter().flatten() {
            match result {
                Ok(record) => documents.push(record),
                Err(err) => {
                    warn!("Skipping {}: {}", path.display(), err);
                    METRICS.record_parse_failure();
                    failures += 1;
                }
            }
        }

        let cache_hits = self.cache.stats().hits.saturating_sub(hits_before);
        METRICS.record_scan(documents.len(), cache_hits);

        Ok(ScanOutcome {
            layer: FullTextLayer::from_documents(documents),
            files_found,
            failures,
            cache_hits,
        })
    }
}
