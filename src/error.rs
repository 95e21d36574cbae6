//! Crate-wide error type

use std::path::PathBuf;
use thiserror::Error;

use crate::context::token_budget::BudgetError;
use crate::manifest::ManifestError;

/// Result alias used across the engine
pub type Result<T> = std::result::Result<T, ContextError>;

/// Errors surfaced by the context engine.
///
/// Most failures inside a scan are logged and degraded rather than returned;
/// these variants cover what a caller can actually observe.
#[derive(Debug, Error)]
pub enum ContextError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Analysis root is not a directory: {0}")]
    RootNotFound(PathBuf),

    #[error(transparent)]
    Manifest(#[from] ManifestError),

    #[error(transparent)]
    Budget(#[from] BudgetError),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Analysis cancelled")]
    Cancelled,
}

impl ContextError {
    /// Wrap an I/O error with the path it happened on
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

impl From<config::ConfigError> for ContextError {
    fn from(err: config::ConfigError) -> Self {
        Self::Configuration(err.to_string())
    }
}
