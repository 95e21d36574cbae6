//! Engine configuration
//!
//! Layered: built-in defaults, then an optional TOML file, then
//! `CONTEXT_ENGINE__*` environment variables (a `.env` file is read first).
//! Nested keys use a double underscore, e.g.
//! `CONTEXT_ENGINE__BUDGET__HIGH_VALUE_THRESHOLD=75`.

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

use crate::context::token_budget::BudgetConfig;
use crate::documents::prioritizer::ScoringWeights;
use crate::documents::scanner::{AnalysisDepth, ScanConfig};
use crate::error::{ContextError, Result};

/// Environment variable prefix
pub const ENV_PREFIX: &str = "CONTEXT_ENGINE";

/// Top-level engine configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub scan: ScanConfig,
    #[serde(default)]
    pub scoring: ScoringWeights,
    #[serde(default)]
    pub budget: BudgetConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Analyzer settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Depth used when a caller does not pick one
    #[serde(default)]
    pub default_depth: AnalysisDepth,

    /// Count tokens with the cl100k tokenizer instead of the character heuristic
    #[serde(default)]
    pub use_tiktoken: bool,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Filter directive used when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable output
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

impl EngineConfig {
    /// Load configuration from an optional file plus the environment
    pub fn load(path: Option<&Path>) -> Result<Self> {
        if let Ok(env_file) = dotenvy::dotenv() {
            debug!("Loaded environment from {}", env_file.display());
        }

        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(false));
        }
        builder = builder.add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true),
        );

        let config: EngineConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML string, ignoring the environment
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: EngineConfig = config::Config::builder()
            .add_source(config::File::from_str(text, config::FileFormat::Toml))
            .build()?
            .try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.budget.validate()?;
        if self.scan.concurrency == 0 {
            return Err(ContextError::Configuration(
                "scan.concurrency must be at least 1".to_string(),
            ));
        }
        if self.scan.markdown_extensions.is_empty() {
            return Err(ContextError::Configuration(
                "scan.markdown_extensions must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}
