//! Markdown corpus: discovery, parsing, scoring and caching

pub mod cache;
pub mod categorizer;
pub mod markdown;
pub mod models;
pub mod parser;
pub mod prioritizer;
pub mod scanner;

pub use cache::{CacheStats, DocumentCache};
pub use categorizer::categorize;
pub use models::{Category, DocumentRecord, EnrichedDocument, FullTextLayer, SemiStructuredLayer};
pub use parser::DocumentParser;
pub use prioritizer::{Prioritizer, ScoringWeights};
pub use scanner::{AnalysisDepth, CancelFlag, CorpusScanner, ScanConfig, ScanOutcome};
