//! Token budget management for context selection
//!
//! Greedy, priority-ordered knapsack approximation:
//! - Candidates sorted by (required, weighted priority) descending
//! - Each candidate included while the running total stays within the ceiling
//! - One high-value candidate that does not fit may be truncated into the
//!   remaining space, after which selection stops

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

use super::token_estimator::TokenEstimator;
use crate::documents::models::DocumentRecord;

/// Appended to a truncated document
pub const TRUNCATION_MARKER: &str = "\n\n[... content truncated to fit the token budget ...]";

/// Budget manager configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BudgetConfig {
    /// Weighted priority a document must exceed to be considered for truncation
    pub high_value_threshold: f64,
    /// Truncation only happens while less than this share of the ceiling is used
    pub truncation_usage_ratio: f64,
    /// Truncation needs strictly more than this many tokens left
    pub min_truncation_tokens: usize,
    /// A paragraph break is preferred if it lies at or after this share of the cut
    pub paragraph_cut_ratio: f64,
}

impl Default for BudgetConfig {
    fn default() -> Self {
        Self {
            high_value_threshold: 70.0,
            truncation_usage_ratio: 0.8,
            min_truncation_tokens: 100,
            paragraph_cut_ratio: 0.7,
        }
    }
}

impl BudgetConfig {
    /// Validate that the budget configuration is consistent
    pub fn validate(&self) -> Result<(), BudgetError> {
        if !(0.0..=100.0).contains(&self.high_value_threshold) {
            return Err(BudgetError::ConfigurationInvalid(format!(
                "high_value_threshold {} outside 0-100",
                self.high_value_threshold
            )));
        }
        for (name, ratio) in [
            ("truncation_usage_ratio", self.truncation_usage_ratio),
            ("paragraph_cut_ratio", self.paragraph_cut_ratio),
        ] {
            if !(0.0..=1.0).contains(&ratio) {
                return Err(BudgetError::ConfigurationInvalid(format!(
                    "{name} {ratio} outside 0.0-1.0"
                )));
            }
        }
        Ok(())
    }
}

/// Token budget errors
#[derive(Debug, Error)]
pub enum BudgetError {
    #[error("Configuration invalid: {0}")]
    ConfigurationInvalid(String),
}

/// A document offered to the budget manager
#[derive(Debug, Clone)]
pub struct BudgetCandidate {
    pub record: DocumentRecord,
    /// Priority after the strategy's category multiplier
    pub weighted_priority: f64,
    /// Required-category documents are ordered ahead of optional ones
    pub required: bool,
}

/// Outcome of one budgeting pass
#[derive(Debug, Clone, Default)]
pub struct BudgetSelection {
    pub documents: Vec<DocumentRecord>,
    pub total_tokens: usize,
    pub truncated: Option<PathBuf>,
    /// Candidates left out
    pub skipped: usize,
}

/// Token budget manager
pub struct ContextBudgetManager {
    config: BudgetConfig,
    estimator: Arc<dyn TokenEstimator>,
}

impl ContextBudgetManager {
    /// Create a new budget manager
    pub fn new(
        config: BudgetConfig,
        estimator: Arc<dyn TokenEstimator>,
    ) -> Result<Self, BudgetError> {
        config.validate()?;
        Ok(Self { config, estimator })
    }

    pub fn config(&self) -> &BudgetConfig {
        &self.config
    }

    /// Select candidates under `max_tokens`
    pub fn select(
        &self,
        mut candidates: Vec<BudgetCandidate>,
        max_tokens: usize,
    ) -> BudgetSelection {
        candidates.sort_by(|a, b| {
            b.required
                .cmp(&a.required)
                .then_with(|| b.weighted_priority.total_cmp(&a.weighted_priority))
                .then_with(|| a.record.path.cmp(&b.record.path))
        });

        let total_candidates = candidates.len();
        let mut selection = BudgetSelection::default();

        for candidate in candidates {
            let tokens = candidate.record.token_count;
            if selection.total_tokens + tokens <= max_tokens {
                selection.total_tokens += tokens;
                selection.documents.push(candidate.record);
                continue;
            }

            let truncated = self.try_truncate(&candidate, selection.total_tokens, max_tokens);
            if let Some(record) = truncated {
                debug!(
                    "Truncated {} from {} to {} tokens",
                    record.path.display(),
                    tokens,
                    record.token_count
                );
                selection.total_tokens += record.token_count;
                selection.truncated = Some(record.path.clone());
                selection.documents.push(record);
                break;
            }
        }

        selection.skipped = total_candidates - selection.documents.len();
        selection
    }

    fn try_truncate(
        &self,
        candidate: &BudgetCandidate,
        consumed: usize,
        max_tokens: usize,
    ) -> Option<DocumentRecord> {
        if candidate.weighted_priority <= self.config.high_value_threshold {
            return None;
        }
        if consumed as f64 >= max_tokens as f64 * self.config.truncation_usage_ratio {
            return None;
        }
        let remaining = max_tokens.saturating_sub(consumed);
        if remaining <= self.config.min_truncation_tokens {
            return None;
        }

        let record = &candidate.record;
        let (content, token_count) =
            self.truncate_to_fit(&record.content, record.token_count, remaining)?;
        Some(DocumentRecord {
            content,
            token_count,
            ..candidate.record.clone()
        })
    }

    /// Cut `content` so that it plus the truncation marker costs at most
    /// `remaining` tokens. Returns the new content and its estimate.
    pub fn truncate_to_fit(
        &self,
        content: &str,
        token_count: usize,
        remaining: usize,
    ) -> Option<(String, usize)> {
        let marker_tokens = self.estimator.estimate(TRUNCATION_MARKER);
        let available = remaining.checked_sub(marker_tokens).filter(|a| *a > 0)?;

        let total_chars = content.chars().count();
        let chars_per_token = total_chars as f64 / token_count.max(1) as f64;
        let mut target_chars = ((available as f64 * chars_per_token) as usize).min(total_chars);

        while target_chars > 0 {
            let cut = self.cut_point(content, target_chars);
            let mut truncated = content[..cut].trim_end().to_string();
            truncated.push_str(TRUNCATION_MARKER);

            let tokens = self.estimator.estimate(&truncated);
            if tokens <= remaining {
                return Some((truncated, tokens));
            }
            target_chars = target_chars * 9 / 10;
        }
        None
    }

    /// Byte offset to cut at: the last paragraph break at or after
    /// `paragraph_cut_ratio` of the target, else the target itself
    fn cut_point(&self, content: &str, target_chars: usize) -> usize {
        let target = content
            .char_indices()
            .nth(target_chars)
            .map(|(idx, _)| idx)
            .unwrap_or(content.len());
        let floor = (target as f64 * self.config.paragraph_cut_ratio) as usize;

        match content[..target].rfind("\n\n") {
            Some(idx) if idx >= floor => idx,
            _ => target,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::token_estimator::CharClassEstimator;
    use crate::documents::models::Category;
    use chrono::Utc;

    fn manager() -> ContextBudgetManager {
        ContextBudgetManager::new(BudgetConfig::default(), Arc::new(CharClassEstimator)).unwrap()
    }

    fn candidate(name: &str, tokens: usize, priority: f64, required: bool) -> BudgetCandidate {
        // 4 narrow chars per token
        let content = "abc ".repeat(tokens);
        BudgetCandidate {
            record: DocumentRecord {
                path: PathBuf::from(format!("/p/{name}")),
                relative_path: PathBuf::from(name),
                token_count: CharClassEstimator.estimate(&content),
                content,
                priority: priority as u8,
                category: Category::Docs,
                modified: Utc::now(),
                size_bytes: 0,
            },
            weighted_priority: priority,
            required,
        }
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(BudgetConfig::default().validate().is_ok());
        let bad = BudgetConfig {
            paragraph_cut_ratio: 1.5,
            ..BudgetConfig::default()
        };
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_greedy_selection_in_priority_order() {
        let selection = manager().select(
            vec![
                candidate("low.md", 300, 20.0, false),
                candidate("high.md", 500, 60.0, false),
                candidate("mid.md", 400, 40.0, false),
            ],
            1000,
        );
        let names: Vec<_> = selection
            .documents
            .iter()
            .map(|d| d.relative_path.to_string_lossy().into_owned())
            .collect();
        // high (500) + mid (400) = 900; low (300) does not fit and is not high value
        assert_eq!(names, vec!["high.md", "mid.md"]);
        assert_eq!(selection.total_tokens, 900);
        assert_eq!(selection.skipped, 1);
        assert!(selection.truncated.is_none());
    }

    #[test]
    fn test_required_candidates_come_first() {
        let selection = manager().select(
            vec![
                candidate("optional.md", 800, 90.0, false),
                candidate("required.md", 300, 30.0, true),
            ],
            1000,
        );
        assert_eq!(selection.documents[0].relative_path, PathBuf::from("required.md"));
    }

    #[test]
    fn test_high_value_document_is_truncated() {
        let selection = manager().select(
            vec![
                candidate("first.md", 200, 95.0, false),
                candidate("big.md", 5000, 80.0, false),
                candidate("small.md", 10, 10.0, false),
            ],
            1000,
        );
        assert_eq!(selection.truncated, Some(PathBuf::from("/p/big.md")));
        assert_eq!(selection.documents.len(), 2);
        let big = &selection.documents[1];
        assert!(big.content.ends_with(TRUNCATION_MARKER));
        assert!(selection.total_tokens <= 1000);
        // stops after truncating, so the small document is left out
        assert_eq!(selection.skipped, 1);
    }

    #[test]
    fn test_no_truncation_below_threshold_or_when_nearly_full() {
        let low_value = manager().select(vec![candidate("big.md", 5000, 70.0, false)], 1000);
        assert!(low_value.documents.is_empty());

        let nearly_full = manager().select(
            vec![
                candidate("first.md", 850, 95.0, false),
                candidate("big.md", 5000, 90.0, false),
            ],
            1000,
        );
        assert!(nearly_full.truncated.is_none());
        assert_eq!(nearly_full.total_tokens, 850);
    }

    #[test]
    fn test_no_truncation_with_small_remainder() {
        let selection = manager().select(vec![candidate("big.md", 5000, 90.0, false)], 100);
        assert!(selection.documents.is_empty());
    }

    #[test]
    fn test_truncation_prefers_paragraph_boundary() {
        let m = manager();
        let content = format!("{}\n\n{}", "a".repeat(380), "b".repeat(2000));
        let tokens = CharClassEstimator.estimate(&content);
        let (cut, cut_tokens) = m.truncate_to_fit(&content, tokens, 120).unwrap();
        assert!(cut_tokens <= 120);
        assert_eq!(cut, format!("{}{}", "a".repeat(380), TRUNCATION_MARKER));
    }
}
