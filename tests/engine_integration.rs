//! End-to-end tests over real project directories
//!
//! Each test lays out a small project in a temporary directory, analyzes it
//! through the tokio-backed filesystem and checks the selection results.

use std::fs;
use std::path::Path;

use context_engine::analysis::estimator_from_config;
use context_engine::{
    AnalysisDepth, Category, ContextSelector, EngineConfig, ProjectAnalyzer, TaskType,
};
use tempfile::TempDir;

const FILLER: &[&str] = &[
    "the", "quick", "brown", "fox", "jumps", "over", "lazy", "dog", "and", "runs", "far", "away",
];

fn words(n: usize) -> String {
    let mut text = String::new();
    for i in 0..n {
        if i > 0 {
            text.push(if i % 12 == 0 { '\n' } else { ' ' });
        }
        text.push_str(FILLER[i % FILLER.len()]);
    }
    text
}

fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

/// README: 300 words, two headings, one code block.
/// docs/guide.md: 800 words, six headings.
fn marketing_project() -> TempDir {
    let dir = TempDir::new().unwrap();
    let root = dir.path();

    let readme = format!(
        "# Demo Project\n\n{}\n\n## Usage\n\n```bash\ndemo run\n```\n\n{}\n",
        words(148),
        words(148)
    );
    write(root, "README.md", &readme);

    let mut guide = String::new();
    for section in 1..=6 {
        guide.push_str(&format!("## Part {section}\n\n{}\n\n", words(131)));
    }
    write(root, "docs/guide.md", &guide);
    dir
}

fn analyzer(config: &EngineConfig) -> ProjectAnalyzer {
    ProjectAnalyzer::from_config(config).unwrap()
}

fn selector(config: &EngineConfig) -> ContextSelector {
    ContextSelector::new(estimator_from_config(config).unwrap(), config.budget.clone()).unwrap()
}

#[tokio::test]
async fn test_marketing_selection_under_tight_budget() {
    let dir = marketing_project();
    let config = EngineConfig::default();
    let analysis = analyzer(&config)
        .analyze(dir.path(), AnalysisDepth::Balanced)
        .await
        .unwrap();

    assert_eq!(analysis.full_text.documents.len(), 2);
    assert_eq!(analysis.full_text.category_counts[&Category::Readme], 1);
    assert_eq!(analysis.full_text.category_counts[&Category::Guide], 1);

    let context =
        selector(&config).select_with_max_tokens(&analysis, TaskType::MarketingContent, 1000);

    assert!(context.contains("README.md"));
    assert_eq!(context.candidate_count, 2);
    assert!(context.total_tokens <= 1000);

    let selected = context.documents.len();
    let both_fit = analysis.full_text.total_tokens <= 1000;
    assert_eq!(selected, if both_fit { 2 } else { 1 });
    assert!(
        context.rationale.starts_with(&format!("Selected {selected}/2 documents")),
        "unexpected rationale: {}",
        context.rationale
    );
}

#[tokio::test]
async fn test_every_task_respects_its_ceiling() {
    let dir = marketing_project();
    write(dir.path(), "CHANGELOG.md", &format!("# Changelog\n\n## 1.0.0\n\n{}", words(400)));
    write(dir.path(), "docs/api.md", &format!("# API\n\n{}", words(2000)));
    write(dir.path(), "examples/basic.md", &format!("# Basic\n\n{}", words(600)));

    let config = EngineConfig::default();
    let analysis = analyzer(&config)
        .analyze(dir.path(), AnalysisDepth::Comprehensive)
        .await
        .unwrap();
    let selector = selector(&config);

    for task in TaskType::ALL {
        for ceiling in [150, 700, 2500, 20000] {
            let context = selector.select_with_max_tokens(&analysis, task, ceiling);
            assert!(
                context.total_tokens <= ceiling,
                "{task} used {} of {ceiling}",
                context.total_tokens
            );
            let summed: usize = context.documents.iter().map(|d| d.token_count).sum();
            assert_eq!(summed, context.total_tokens);
            let truncated = context
                .documents
                .iter()
                .filter(|d| d.content.contains("[... content truncated"))
                .count();
            assert!(truncated <= 1);
        }
    }
}

#[tokio::test]
async fn test_high_value_readme_is_truncated_into_budget() {
    let dir = TempDir::new().unwrap();
    let mut readme = String::from(
        "# Demo\n\nInstallation, setup, usage, features and architecture notes.\n\n",
    );
    for section in 1..=7 {
        readme.push_str(&format!(
            "## Section {section}\n\n```sh\nstep {section}\n```\n\n{}\n\n",
            words(400)
        ));
    }
    write(dir.path(), "README.md", &readme);

    let config = EngineConfig::default();
    let analysis = analyzer(&config)
        .analyze(dir.path(), AnalysisDepth::Balanced)
        .await
        .unwrap();
    let record = &analysis.full_text.documents[0];
    assert!(record.priority > 70, "priority {}", record.priority);
    assert!(record.token_count > 2000);

    let context =
        selector(&config).select_with_max_tokens(&analysis, TaskType::ReadmeEnhancement, 1000);
    assert_eq!(context.documents.len(), 1);
    assert!(context.is_truncated());
    assert!(context.total_tokens <= 1000);
    assert!(context.rationale.contains("Truncated"));
}

#[tokio::test]
async fn test_empty_project() {
    let dir = TempDir::new().unwrap();
    let config = EngineConfig::default();
    let analysis = analyzer(&config)
        .analyze(dir.path(), AnalysisDepth::Balanced)
        .await
        .unwrap();

    assert!(analysis.full_text.documents.is_empty());
    assert_eq!(analysis.full_text.total_tokens, 0);
    assert_eq!(analysis.full_text.average_priority, 0.0);
    assert_eq!(analysis.meta.total_files, 0);
    assert!(analysis.semi_structured.is_empty());

    let dir_name = dir.path().file_name().unwrap().to_string_lossy().into_owned();
    assert_eq!(analysis.project_name(), dir_name);

    let context = selector(&config).select(&analysis, TaskType::General);
    assert!(context.documents.is_empty());
    assert_eq!(context.total_tokens, 0);
}

#[tokio::test]
async fn test_invalid_manifest_falls_back_to_directory_name() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "package.json", "{ \"name\": \"broken\", ");
    write(dir.path(), "README.md", "# Broken\n\nStill readable.");

    let config = EngineConfig::default();
    let analysis = analyzer(&config)
        .analyze(dir.path(), AnalysisDepth::Minimal)
        .await
        .unwrap();

    let dir_name = dir.path().file_name().unwrap().to_string_lossy().into_owned();
    assert_eq!(analysis.structured.metadata.name, dir_name);
    assert!(analysis.structured.dependencies.is_empty());
    assert!(analysis.structured.scripts.is_empty());
    assert_eq!(analysis.full_text.documents.len(), 1);
}

#[tokio::test]
async fn test_package_json_layer() {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "package.json",
        r#"{
            "name": "web-app",
            "version": "2.1.0",
            "description": "A web app",
            "dependencies": { "react": "^18.2.0", "express": "^4.18.0" },
            "devDependencies": { "jest": "^29.0.0" },
            "scripts": { "test": "jest", "build": "vite build" }
        }"#,
    );

    let config = EngineConfig::default();
    let analysis = analyzer(&config)
        .analyze(dir.path(), AnalysisDepth::Minimal)
        .await
        .unwrap();
    let structured = &analysis.structured;
    assert_eq!(structured.metadata.name, "web-app");
    assert_eq!(structured.metadata.version.as_deref(), Some("2.1.0"));
    assert_eq!(structured.dependencies.len(), 3);
    assert_eq!(structured.scripts.len(), 2);
    assert!(structured.manifest_path.is_some());
}

#[tokio::test]
async fn test_incremental_update_matches_full_rescan() {
    let dir = marketing_project();
    let config = EngineConfig::default();
    let analyzer = analyzer(&config);
    let prior = analyzer
        .analyze(dir.path(), AnalysisDepth::Balanced)
        .await
        .unwrap();

    write(dir.path(), "docs/guide.md", "# Guide\n\nRewritten from scratch.\n");
    let patched = analyzer.update(&prior, &["docs/guide.md"]).await.unwrap();

    let fresh = ProjectAnalyzer::from_config(&config)
        .unwrap()
        .analyze(dir.path(), AnalysisDepth::Balanced)
        .await
        .unwrap();
    assert_eq!(patched.full_text, fresh.full_text);
    assert_eq!(patched.semi_structured, fresh.semi_structured);
    assert_eq!(
        patched.semi_structured.guide.as_ref().map(|g| g.summary.as_str()),
        Some("Rewritten from scratch.")
    );
}

#[tokio::test]
async fn test_incremental_deletion_rescans() {
    let dir = marketing_project();
    let config = EngineConfig::default();
    let analyzer = analyzer(&config);
    let prior = analyzer
        .analyze(dir.path(), AnalysisDepth::Balanced)
        .await
        .unwrap();

    let guide = dir.path().join("docs/guide.md");
    fs::remove_file(&guide).unwrap();
    let patched = analyzer.update(&prior, &[guide.as_path()]).await.unwrap();

    assert_eq!(patched.full_text.documents.len(), 1);
    assert!(patched.semi_structured.guide.is_none());
    assert!(patched.is_consistent());
}

#[tokio::test]
async fn test_incremental_unreadable_change_matches_full_rescan() {
    let dir = marketing_project();
    write(dir.path(), "docs/notes.md", "# Notes\n\nReadable for now.");
    let config = EngineConfig::default();
    let analyzer = analyzer(&config);
    let prior = analyzer
        .analyze(dir.path(), AnalysisDepth::Balanced)
        .await
        .unwrap();
    assert_eq!(prior.full_text.documents.len(), 3);

    let notes = dir.path().join("docs/notes.md");
    fs::write(&notes, [0xff, 0xfe, 0x00, 0x80]).unwrap();
    let patched = analyzer.update(&prior, &["docs/notes.md"]).await.unwrap();

    let fresh = ProjectAnalyzer::from_config(&config)
        .unwrap()
        .analyze(dir.path(), AnalysisDepth::Balanced)
        .await
        .unwrap();
    assert!(!patched.full_text.contains(&notes));
    assert!(!analyzer.cache().contains(&notes));
    assert_eq!(patched.full_text, fresh.full_text);
    assert_eq!(patched.semi_structured, fresh.semi_structured);
    assert!(patched.is_consistent());
}

#[tokio::test]
async fn test_repeat_analysis_uses_cache() {
    let dir = marketing_project();
    let config = EngineConfig::default();
    let analyzer = analyzer(&config);

    let first = analyzer.analyze(dir.path(), AnalysisDepth::Balanced).await.unwrap();
    let second = analyzer.analyze(dir.path(), AnalysisDepth::Balanced).await.unwrap();
    assert_eq!(first.full_text, second.full_text);
    assert_eq!(second.meta.cache_hits, 2);
    assert_eq!(analyzer.cache_stats().misses, 2);
}

#[test]
fn test_config_file_overrides() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("engine.toml");
    fs::write(
        &path,
        "[scan]\nconcurrency = 2\nextra_ignored_dirs = [\"drafts\"]\n\n[scoring]\nreadme = 30\n",
    )
    .unwrap();

    let config = EngineConfig::load(Some(&path)).unwrap();
    assert_eq!(config.scan.concurrency, 2);
    assert_eq!(config.scan.extra_ignored_dirs, vec!["drafts".to_string()]);
    assert_eq!(config.scoring.readme, 30);
    assert_eq!(config.scoring.changelog, 15);
}
