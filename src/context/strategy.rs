//! Per-task selection strategies
//!
//! A strategy names the categories a task may draw from, how strongly each
//! category counts, the token ceiling and which analysis layers ride along.

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::models::TaskType;
use crate::documents::models::Category;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectionStrategy {
    /// Categories ordered ahead of everything else in the budget pass
    pub required: Vec<Category>,
    /// Categories admitted if the budget allows
    pub optional: Vec<Category>,
    /// Priority multipliers in [0.0, 1.0]; absent categories count 1.0
    pub weights: IndexMap<Category, f64>,
    pub max_tokens: usize,
    pub include_structured: bool,
    pub include_semi_structured: bool,
}

impl SelectionStrategy {
    fn new(
        required: &[Category],
        optional: &[Category],
        weights: &[(Category, f64)],
        max_tokens: usize,
    ) -> Self {
        Self {
            required: required.to_vec(),
            optional: optional.to_vec(),
            weights: weights.iter().copied().collect(),
            max_tokens,
            include_structured: true,
            include_semi_structured: true,
        }
    }

    fn layers(mut self, structured: bool, semi_structured: bool) -> Self {
        self.include_structured = structured;
        self.include_semi_structured = semi_structured;
        self
    }

    /// Built-in strategy for a task
    pub fn for_task(task: TaskType) -> Self {
        DEFAULT_STRATEGIES
            .get(&task)
            .cloned()
            .unwrap_or_else(general)
    }

    pub fn is_required(&self, category: Category) -> bool {
        self.required.contains(&category)
    }

    pub fn admits(&self, category: Category) -> bool {
        self.is_required(category) || self.optional.contains(&category)
    }

    pub fn weight(&self, category: Category) -> f64 {
        self.weights
            .get(&category)
            .copied()
            .unwrap_or(1.0)
            .clamp(0.0, 1.0)
    }
}

impl Default for SelectionStrategy {
    fn default() -> Self {
        general()
    }
}

fn general() -> SelectionStrategy {
    use Category::*;
    SelectionStrategy::new(
        &[Readme],
        &[Guide, Docs, Api, Changelog, Example],
        &[(Readme, 1.0), (Guide, 0.8), (Docs, 0.7), (Api, 0.6), (Changelog, 0.5), (Example, 0.5)],
        4000,
    )
}

/// Default strategy table, one entry per task type
pub static DEFAULT_STRATEGIES: Lazy<HashMap<TaskType, SelectionStrategy>> = Lazy::new(|| {
    use Category::*;

    let mut table = HashMap::new();
    table.insert(
        TaskType::MarketingContent,
        SelectionStrategy::new(
            &[Readme],
            &[Guide, Docs, Changelog],
            &[(Readme, 1.0), (Guide, 0.6), (Docs, 0.5), (Changelog, 0.4)],
            4000,
        ),
    );
    table.insert(
        TaskType::TechnicalDocs,
        SelectionStrategy::new(
            &[Readme, Docs, Api],
            &[Guide, Example, Config, Changelog],
            &[
                (Api, 1.0),
                (Docs, 1.0),
                (Readme, 0.9),
                (Guide, 0.8),
                (Example, 0.7),
                (Config, 0.6),
                (Changelog, 0.4),
            ],
            8000,
        ),
    );
    table.insert(
        TaskType::ApiDocumentation,
        SelectionStrategy::new(
            &[Api],
            &[Readme, Example, Docs],
            &[(Api, 1.0), (Example, 0.8), (Docs, 0.7), (Readme, 0.6)],
            6000,
        )
        .layers(true, false),
    );
    table.insert(
        TaskType::UserGuide,
        SelectionStrategy::new(
            &[Readme, Guide],
            &[Docs, Example, Config],
            &[(Guide, 1.0), (Readme, 0.9), (Example, 0.8), (Docs, 0.7), (Config, 0.5)],
            6000,
        ),
    );
    table.insert(
        TaskType::Changelog,
        SelectionStrategy::new(&[Changelog], &[Readme], &[(Changelog, 1.0), (Readme, 0.5)], 3000)
            .layers(true, false),
    );
    table.insert(
        TaskType::ReadmeEnhancement,
        SelectionStrategy::new(
            &[Readme],
            &[Guide, Docs, Example, Changelog],
            &[(Readme, 1.0), (Guide, 0.7), (Docs, 0.6), (Example, 0.6), (Changelog, 0.4)],
            5000,
        ),
    );
    table.insert(
        TaskType::ProjectAnalysis,
        SelectionStrategy::new(
            &[Readme],
            &[Guide, Docs, Api, Changelog, Example, Config, Test, Other],
            &[
                (Readme, 1.0),
                (Docs, 0.9),
                (Guide, 0.8),
                (Api, 0.8),
                (Changelog, 0.6),
                (Example, 0.6),
                (Config, 0.5),
                (Test, 0.4),
                (Other, 0.3),
            ],
            10000,
        ),
    );
    table.insert(
        TaskType::FeatureExtraction,
        SelectionStrategy::new(
            &[Readme],
            &[Docs, Api, Guide, Changelog, Example],
            &[
                (Readme, 1.0),
                (Docs, 0.9),
                (Api, 0.8),
                (Guide, 0.7),
                (Changelog, 0.7),
                (Example, 0.6),
            ],
            6000,
        )
        .layers(true, false),
    );
    table.insert(TaskType::General, general());
    table
});
