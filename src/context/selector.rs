//! Task-driven context selection
//!
//! Filters the full-text layer down to the categories a task cares about,
//! weights priorities per category, and hands the candidates to the budget
//! manager under the strategy's token ceiling.

use std::collections::{BTreeMap, HashMap};
use std::fmt::Write as _;
use std::sync::Arc;
use tracing::{debug, info};

use super::models::{SelectedContext, TaskType};
use super::strategy::{SelectionStrategy, DEFAULT_STRATEGIES};
use super::token_budget::{BudgetCandidate, BudgetConfig, BudgetSelection, ContextBudgetManager};
use super::token_estimator::TokenEstimator;
use crate::analysis::models::ProjectAnalysis;
use crate::documents::models::Category;
use crate::error::Result;
use crate::metrics::METRICS;

pub struct ContextSelector {
    strategies: HashMap<TaskType, SelectionStrategy>,
    budget: ContextBudgetManager,
}

impl ContextSelector {
    /// Selector with the default strategy table
    pub fn new(estimator: Arc<dyn TokenEstimator>, config: BudgetConfig) -> Result<Self> {
        Ok(Self {
            strategies: DEFAULT_STRATEGIES.clone(),
            budget: ContextBudgetManager::new(config, estimator)?,
        })
    }

    /// Replace the strategy used for `task`
    pub fn register_strategy(&mut self, task: TaskType, strategy: SelectionStrategy) {
        self.strategies.insert(task, strategy);
    }

    pub fn with_strategy(mut self, task: TaskType, strategy: SelectionStrategy) -> Self {
        self.register_strategy(task, strategy);
        self
    }

    /// Strategy for `task`, falling back to the general one
    pub fn strategy(&self, task: TaskType) -> SelectionStrategy {
        self.strategies
            .get(&task)
            .or_else(|| self.strategies.get(&TaskType::General))
            .cloned()
            .unwrap_or_default()
    }

    /// Select context for `task` under the strategy's own ceiling
    pub fn select(&self, analysis: &ProjectAnalysis, task: TaskType) -> SelectedContext {
        let strategy = self.strategy(task);
        self.select_with_strategy(analysis, task, strategy)
    }

    /// Select context for `task` under a caller-supplied ceiling
    pub fn select_with_max_tokens(
        &self,
        analysis: &ProjectAnalysis,
        task: TaskType,
        max_tokens: usize,
    ) -> SelectedContext {
        let strategy = SelectionStrategy {
            max_tokens,
            ..self.strategy(task)
        };
        self.select_with_strategy(analysis, task, strategy)
    }

    fn select_with_strategy(
        &self,
        analysis: &ProjectAnalysis,
        task: TaskType,
        strategy: SelectionStrategy,
    ) -> SelectedContext {
        let candidates: Vec<BudgetCandidate> = analysis
            .full_text
            .documents
            .iter()
            .filter(|d| strategy.admits(d.category))
            .map(|d| BudgetCandidate {
                weighted_priority: d.priority as f64 * strategy.weight(d.category),
                required: strategy.is_required(d.category),
                record: d.clone(),
            })
            .collect();
        let candidate_count = candidates.len();
        debug!(
            "{} of {} documents are candidates for {}",
            candidate_count,
            analysis.full_text.documents.len(),
            task
        );

        let selection = self.budget.select(candidates, strategy.max_tokens);
        let rationale = rationale(task, &strategy, &selection, candidate_count);

        METRICS.record_selection(
            task.as_str(),
            selection.total_tokens,
            selection.truncated.is_some(),
        );
        info!("{}", rationale);

        SelectedContext {
            task_type: task,
            structured: strategy
                .include_structured
                .then(|| analysis.structured.clone()),
            semi_structured: strategy
                .include_semi_structured
                .then(|| analysis.semi_structured.clone()),
            documents: selection.documents,
            total_tokens: selection.total_tokens,
            max_tokens: strategy.max_tokens,
            candidate_count,
            truncated_path: selection.truncated,
            rationale,
            strategy,
        }
    }
}

fn rationale(
    task: TaskType,
    strategy: &SelectionStrategy,
    selection: &BudgetSelection,
    candidate_count: usize,
) -> String {
    let selected = selection.documents.len();
    let percent = if candidate_count == 0 {
        0.0
    } else {
        selected as f64 * 100.0 / candidate_count as f64
    };

    let mut breakdown: BTreeMap<Category, usize> = BTreeMap::new();
    for doc in &selection.documents {
        *breakdown.entry(doc.category).or_insert(0) += 1;
    }

    let mut text = format!(
        "Selected {selected}/{candidate_count} documents ({percent:.1}%) for {task}, \
         using {}/{} tokens",
        selection.total_tokens, strategy.max_tokens
    );
    if !breakdown.is_empty() {
        let parts: Vec<String> = breakdown
            .iter()
            .map(|(category, count)| format!("{category}: {count}"))
            .collect();
        let _ = write!(text, ". Categories: {}", parts.join(", "));
    }
    if let Some(path) = &selection.truncated {
        let _ = write!(text, ". Truncated {} to fit the budget", path.display());
    }
    text.push('.');
    text
}
