//! Metrics collection for observability

use once_cell::sync::Lazy;
use prometheus::{
    register_counter_vec_with_registry, register_counter_with_registry,
    register_histogram_vec_with_registry, Counter, CounterVec, HistogramVec, Opts, Registry,
};
use std::sync::Arc;

/// Global metrics registry
pub static METRICS: Lazy<Arc<Metrics>> =
    Lazy::new(|| Arc::new(Metrics::new().expect("Failed to initialize metrics")));

/// Metrics collector
pub struct Metrics {
    registry: Registry,

    // Corpus metrics
    pub documents_scanned: Counter,
    pub parse_failures: Counter,
    pub cache_hits: Counter,
    pub analysis_duration: HistogramVec,
    pub full_rescans: Counter,

    // Selection metrics
    pub selections: CounterVec,
    pub selection_tokens: HistogramVec,
    pub truncations: Counter,
}

impl Metrics {
    /// Create a new metrics collector
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let documents_scanned = register_counter_with_registry!(
            Opts::new("documents_scanned_total", "Markdown documents parsed or served from cache"),
            registry
        )?;

        let parse_failures = register_counter_with_registry!(
            Opts::new(
                "document_parse_failures_total",
                "Documents skipped after a read or parse error"
            ),
            registry
        )?;

        let cache_hits = register_counter_with_registry!(
            Opts::new("document_cache_hits_total", "Documents served from the cache during scans"),
            registry
        )?;

        let analysis_duration = register_histogram_vec_with_registry!(
            "analysis_duration_seconds",
            "Project analysis duration in seconds",
            &["mode"],
            registry
        )?;

        let full_rescans = register_counter_with_registry!(
            Opts::new(
                "incremental_full_rescans_total",
                "Incremental updates that fell back to a full scan"
            ),
            registry
        )?;

        let selections = register_counter_vec_with_registry!(
            Opts::new("context_selections_total", "Context selections by task type"),
            &["task"],
            registry
        )?;

        let selection_tokens = register_histogram_vec_with_registry!(
            "context_selection_tokens",
            "Tokens consumed per context selection",
            &["task"],
            vec![250.0, 500.0, 1000.0, 2000.0, 4000.0, 6000.0, 8000.0, 10000.0],
            registry
        )?;

        let truncations = register_counter_with_registry!(
            Opts::new("context_truncations_total", "Selections that truncated a document"),
            registry
        )?;

        Ok(Self {
            registry,
            documents_scanned,
            parse_failures,
            cache_hits,
            analysis_duration,
            full_rescans,
            selections,
            selection_tokens,
            truncations,
        })
    }

    /// Get the metrics registry for exporting
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Record a completed corpus scan
    pub fn record_scan(&self, documents: usize, cache_hits: u64) {
        self.documents_scanned.inc_by(documents as f64);
        self.cache_hits.inc_by(cache_hits as f64);
    }

    pub fn record_parse_failure(&self) {
        self.parse_failures.inc();
    }

    pub fn record_full_rescan(&self) {
        self.full_rescans.inc();
    }

    /// Record a context selection
    pub fn record_selection(&self, task: &str, tokens: usize, truncated: bool) {
        self.selections.with_label_values(&[task]).inc();
        self.selection_tokens
            .with_label_values(&[task])
            .observe(tokens as f64);
        if truncated {
            self.truncations.inc();
        }
    }

    /// Export metrics in Prometheus text format
    pub fn export_prometheus(&self) -> String {
        use prometheus::Encoder;

        let encoder = prometheus::TextEncoder::new();
        let metric_families = self.registry.gather();

        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer).unwrap_or_default();

        String::from_utf8(buffer).unwrap_or_default()
    }
}

/// Helper macro to time operations
#[macro_export]
macro_rules! time_operation {
    ($histogram:expr, $label:expr, $operation:expr) => {{
        let timer = $histogram.with_label_values(&[$label]).start_timer();
        let result = $operation;
        timer.observe_duration();
        result
    }};
}
