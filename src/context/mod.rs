//! Context selection under token budgets
//!
//! Given a project analysis and a downstream task, picks the documents that
//! best serve the task without exceeding the task's token ceiling.

pub mod models;
pub mod selector;
pub mod strategy;
pub mod token_budget;
pub mod token_estimator;

pub use models::{SelectedContext, TaskType};
pub use selector::ContextSelector;
pub use strategy::{SelectionStrategy, DEFAULT_STRATEGIES};
pub use token_budget::{
    BudgetCandidate, BudgetConfig, BudgetError, BudgetSelection, ContextBudgetManager,
};
pub use token_estimator::{CharClassEstimator, TiktokenEstimator, TokenEstimator};
