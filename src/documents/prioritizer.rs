//! Heuristic document priority scoring
//!
//! Additive score from six signals, clamped to 0-100:
//! - File name: readme, changelog, guide/tutorial, api/reference, example, test
//! - Path: docs/, doc/, documentation/ directories, or root-level files
//! - Content volume (word count)
//! - Structure (heading count)
//! - Technical keywords (per distinct match, capped)
//! - Code samples (per fenced block, capped)

use serde::{Deserialize, Serialize};
use std::path::Path;

use super::markdown;

/// Keywords whose presence marks a document as technically relevant
pub const TECHNICAL_KEYWORDS: &[&str] = &[
    "api",
    "architecture",
    "installation",
    "setup",
    "configuration",
    "usage",
    "features",
    "getting started",
    "requirements",
    "deployment",
    "integration",
    "performance",
];

/// Scoring constants. Defaults are the hand-tuned values; every field can be
/// overridden through configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringWeights {
    pub readme: u32,
    pub changelog: u32,
    pub guide: u32,
    pub api: u32,
    pub example: u32,
    pub test: u32,

    pub docs_dir: u32,
    pub doc_dir: u32,
    pub documentation_dir: u32,
    pub root_level: u32,

    /// (word threshold, bonus), checked from the first entry down
    pub word_tiers: Vec<(usize, u32)>,
    /// (heading threshold, bonus), checked from the first entry down
    pub heading_tiers: Vec<(usize, u32)>,

    pub keyword_bonus: u32,
    pub keyword_cap: u32,
    pub code_block_bonus: u32,
    pub code_block_cap: u32,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            readme: 20,
            changelog: 15,
            guide: 12,
            api: 10,
            example: 8,
            test: 3,
            docs_dir: 15,
            doc_dir: 12,
            documentation_dir: 10,
            root_level: 8,
            word_tiers: vec![(500, 10), (200, 7), (50, 4)],
            heading_tiers: vec![(5, 15), (2, 10), (0, 5)],
            keyword_bonus: 3,
            keyword_cap: 15,
            code_block_bonus: 2,
            code_block_cap: 10,
        }
    }
}

/// Per-signal breakdown of a score, useful for explaining rankings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub filename: u32,
    pub path: u32,
    pub volume: u32,
    pub structure: u32,
    pub keywords: u32,
    pub code_samples: u32,
}

impl ScoreBreakdown {
    pub fn raw_total(&self) -> u32 {
        self.filename + self.path + self.volume + self.structure + self.keywords + self.code_samples
    }

    /// Total clamped to [0, 100]
    pub fn score(&self) -> u8 {
        self.raw_total().min(100) as u8
    }
}

/// Document prioritizer
#[derive(Debug, Clone, Default)]
pub struct Prioritizer {
    weights: ScoringWeights,
}

impl Prioritizer {
    pub fn new(weights: ScoringWeights) -> Self {
        Self { weights }
    }

    pub fn weights(&self) -> &ScoringWeights {
        &self.weights
    }

    /// Score a document given its root-relative path and raw text
    pub fn score(&self, relative_path: &Path, content: &str) -> u8 {
        self.breakdown(relative_path, content).score()
    }

    pub fn breakdown(&self, relative_path: &Path, content: &str) -> ScoreBreakdown {
        ScoreBreakdown {
            filename: self.filename_signal(relative_path),
            path: self.path_signal(relative_path),
            volume: tier_bonus(&self.weights.word_tiers, markdown::word_count(content)),
            structure: tier_bonus(&self.weights.heading_tiers, markdown::heading_count(content)),
            keywords: self.keyword_signal(content),
            code_samples: (markdown::code_block_count(content) as u32
                * self.weights.code_block_bonus)
                .min(self.weights.code_block_cap),
        }
    }

    fn filename_signal(&self, path: &Path) -> u32 {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        let w = &self.weights;

        if name.contains("readme") {
            w.readme
        } else if name.contains("changelog") {
            w.changelog
        } else if name.contains("guide") || name.contains("tutorial") {
            w.guide
        } else if name.contains("api") || name.contains("reference") {
            w.api
        } else if name.contains("example") {
            w.example
        } else if name.contains("test") {
            w.test
        } else {
            0
        }
    }

    fn path_signal(&self, path: &Path) -> u32 {
        let dirs: Vec<String> = path
            .parent()
            .map(|p| {
                p.components()
                    .map(|c| c.as_os_str().to_string_lossy().to_lowercase())
                    .collect()
            })
            .unwrap_or_default();
        let has = |name: &str| dirs.iter().any(|d| d == name);
        let w = &self.weights;

        if has("docs") {
            w.docs_dir
        } else if has("doc") {
            w.doc_dir
        } else if has("documentation") {
            w.documentation_dir
        } else if dirs.is_empty() {
            w.root_level
        } else {
            0
        }
    }

    fn keyword_signal(&self, content: &str) -> u32 {
        let lower = content.to_lowercase();
        let matched = TECHNICAL_KEYWORDS
            .iter()
            .filter(|kw| lower.contains(*kw))
            .count() as u32;
        (matched * self.weights.keyword_bonus).min(self.weights.keyword_cap)
    }
}

fn tier_bonus(tiers: &[(usize, u32)], value: usize) -> u32 {
    tiers
        .iter()
        .find(|(threshold, _)| value > *threshold)
        .map(|(_, bonus)| *bonus)
        .unwrap_or(0)
}
