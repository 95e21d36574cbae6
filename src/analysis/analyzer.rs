//! Three-layer project analysis
//!
//! One analyzer serves every depth; the depth only bounds how far the corpus
//! walk descends. The document cache and filesystem are injected so several
//! analyzers (or a long-lived service) can share them.

use chrono::Utc;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

use super::models::{AnalysisMeta, ProjectAnalysis};
use crate::config::EngineConfig;
use crate::context::token_estimator::{CharClassEstimator, TiktokenEstimator, TokenEstimator};
use crate::documents::cache::{CacheStats, DocumentCache};
use crate::documents::models::SemiStructuredLayer;
use crate::documents::parser::DocumentParser;
use crate::documents::prioritizer::Prioritizer;
use crate::documents::scanner::{AnalysisDepth, CancelFlag, CorpusScanner};
use crate::error::{ContextError, Result};
use crate::fs::{FileSystem, TokioFileSystem};
use crate::manifest::StructuredExtractor;
use crate::metrics::METRICS;

pub struct ProjectAnalyzer {
    pub(crate) fs: Arc<dyn FileSystem>,
    pub(crate) scanner: CorpusScanner,
    pub(crate) extractor: StructuredExtractor,
    default_depth: AnalysisDepth,
}

impl ProjectAnalyzer {
    /// Analyzer with its own cache
    pub fn new(
        fs: Arc<dyn FileSystem>,
        estimator: Arc<dyn TokenEstimator>,
        config: &EngineConfig,
    ) -> Self {
        let cache = Arc::new(DocumentCache::new(fs.clone()));
        Self::with_cache(fs, cache, estimator, config)
    }

    /// Analyzer sharing an existing cache
    pub fn with_cache(
        fs: Arc<dyn FileSystem>,
        cache: Arc<DocumentCache>,
        estimator: Arc<dyn TokenEstimator>,
        config: &EngineConfig,
    ) -> Self {
        let parser = DocumentParser::new(
            fs.clone(),
            estimator,
            Prioritizer::new(config.scoring.clone()),
        );
        Self {
            scanner: CorpusScanner::new(fs.clone(), cache, parser, config.scan.clone()),
            extractor: StructuredExtractor::new(fs.clone()),
            fs,
            default_depth: config.analysis.default_depth,
        }
    }

    /// Analyzer over the real filesystem
    pub fn from_config(config: &EngineConfig) -> Result<Self> {
        let estimator = estimator_from_config(config)?;
        Ok(Self::new(Arc::new(TokioFileSystem), estimator, config))
    }

    pub fn default_depth(&self) -> AnalysisDepth {
        self.default_depth
    }

    pub fn cache(&self) -> &Arc<DocumentCache> {
        self.scanner.cache()
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache().stats()
    }

    /// Analyze `root` at the given depth
    pub async fn analyze(&self, root: &Path, depth: AnalysisDepth) -> Result<ProjectAnalysis> {
        self.analyze_with_cancel(root, depth, None).await
    }

    /// Analyze `root`, stopping between files once `cancel` is set
    pub async fn analyze_with_cancel(
        &self,
        root: &Path,
        depth: AnalysisDepth,
        cancel: Option<&CancelFlag>,
    ) -> Result<ProjectAnalysis> {
        crate::time_operation!(
            METRICS.analysis_duration,
            "full",
            self.run_full(root, depth, cancel).await
        )
    }

    async fn run_full(
        &self,
        root: &Path,
        depth: AnalysisDepth,
        cancel: Option<&CancelFlag>,
    ) -> Result<ProjectAnalysis> {
        match self.fs.stat(root).await {
            Ok(stat) if stat.is_dir => {}
            Ok(_) => return Err(ContextError::RootNotFound(root.to_path_buf())),
            Err(err) => {
                warn!("Cannot stat analysis root {}: {}", root.display(), err);
                return Err(ContextError::RootNotFound(root.to_path_buf()));
            }
        }

        info!("Analyzing {} ({} depth)", root.display(), depth);
        let (structured, outcome) = tokio::join!(
            self.extractor.extract(root),
            self.scanner.scan(root, depth.max_depth(), cancel)
        );
        let outcome = outcome?;

        let semi_structured = SemiStructuredLayer::from_documents(&outcome.layer.documents);
        info!(
            "Analyzed {}: {} documents, {} tokens, {} cache hits, {} failures",
            root.display(),
            outcome.layer.documents.len(),
            outcome.layer.total_tokens,
            outcome.cache_hits,
            outcome.failures
        );

        Ok(ProjectAnalysis {
            structured,
            semi_structured,
            meta: AnalysisMeta {
                analyzed_at: Utc::now(),
                root: root.to_path_buf(),
                total_files: outcome.layer.documents.len(),
                cache_hits: outcome.cache_hits,
                depth,
            },
            full_text: outcome.layer,
        })
    }
}

/// Token estimator selected by configuration
pub fn estimator_from_config(config: &EngineConfig) -> Result<Arc<dyn TokenEstimator>> {
    if config.analysis.use_tiktoken {
        let estimator = TiktokenEstimator::new()
            .map_err(|e| ContextError::Configuration(format!("tiktoken unavailable: {e}")))?;
        Ok(Arc::new(estimator))
    } else {
        Ok(Arc::new(CharClassEstimator))
    }
}
