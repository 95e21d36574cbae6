//! Structured extractor: project manifests to metadata, dependencies, scripts
//!
//! Recognized manifests are checked in order (`package.json`, then
//! `Cargo.toml`). A missing or malformed manifest is never fatal: the layer
//! falls back to the directory name with empty lists.

pub mod categories;
pub mod models;

use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

use crate::fs::FileSystem;
use categories::{categorize_dependency, describe_script};
pub use models::{
    Dependency, DependencyCategory, DependencyKind, ProjectMetadata, Script, StructuredLayer,
};

/// Manifest file names, in lookup order
pub const MANIFEST_FILES: &[&str] = &["package.json", "Cargo.toml"];

/// Manifest errors
#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("Failed to read manifest {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed manifest {path}: {message}")]
    Malformed { path: PathBuf, message: String },

    #[error("Unsupported manifest: {0}")]
    Unsupported(PathBuf),
}

/// Whether a path names a recognized manifest
pub fn is_manifest(path: &Path) -> bool {
    path.file_name()
        .map(|n| n.to_string_lossy())
        .is_some_and(|n| MANIFEST_FILES.iter().any(|m| n == *m))
}

/// Layer used when no manifest could be read
pub fn fallback_layer(root: &Path) -> StructuredLayer {
    let name = root
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| "project".to_string());
    StructuredLayer {
        metadata: ProjectMetadata::named(name),
        ..StructuredLayer::default()
    }
}

pub struct StructuredExtractor {
    fs: Arc<dyn FileSystem>,
}

impl StructuredExtractor {
    pub fn new(fs: Arc<dyn FileSystem>) -> Self {
        Self { fs }
    }

    /// Extract the structured layer for `root`, never failing
    pub async fn extract(&self, root: &Path) -> StructuredLayer {
        for file in MANIFEST_FILES {
            let path = root.join(file);
            if !self.fs.exists(&path).await {
                continue;
            }
            match self.read_manifest(root, &path).await {
                Ok(layer) => return layer,
                Err(err) => warn!("{}; falling back", err),
            }
        }
        debug!("No usable manifest in {}", root.display());
        fallback_layer(root)
    }

    /// Read a single manifest
    pub async fn read_manifest(
        &self,
        root: &Path,
        path: &Path,
    ) -> Result<StructuredLayer, ManifestError> {
        let text = self
            .fs
            .read_to_string(path)
            .await
            .map_err(|source| ManifestError::Read {
                path: path.to_path_buf(),
                source,
            })?;

        let file_name = path.file_name().map(|n| n.to_string_lossy().into_owned());
        let mut layer = match file_name.as_deref() {
            Some("package.json") => parse_package_json(&text),
            Some("Cargo.toml") => parse_cargo_toml(&text),
            _ => return Err(ManifestError::Unsupported(path.to_path_buf())),
        }
        .map_err(|message| ManifestError::Malformed {
            path: path.to_path_buf(),
            message,
        })?;

        if layer.metadata.name.is_empty() {
            layer.metadata.name = fallback_layer(root).metadata.name;
        }
        layer.manifest_path = Some(path.to_path_buf());
        Ok(layer)
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct PackageJson {
    name: Option<String>,
    description: Option<String>,
    version: Option<String>,
    author: Option<Value>,
    license: Option<Value>,
    keywords: Vec<Value>,
    repository: Option<Value>,
    homepage: Option<String>,
    dependencies: BTreeMap<String, Value>,
    dev_dependencies: BTreeMap<String, Value>,
    peer_dependencies: BTreeMap<String, Value>,
    scripts: BTreeMap<String, Value>,
}

/// A string, or the given field of an object
fn string_or_field(value: &Value, field: &str) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Object(map) => map.get(field).and_then(Value::as_str).map(str::to_string),
        _ => None,
    }
}

/// `"Jane Doe <jane@x.io> (https://x.io)"` -> `"Jane Doe"`
fn person_name(raw: &str) -> String {
    raw.split(|c: char| c == '<' || c == '(')
        .next()
        .unwrap_or(raw)
        .trim()
        .to_string()
}

fn json_dependencies(deps: &BTreeMap<String, Value>, kind: DependencyKind) -> Vec<Dependency> {
    deps.iter()
        .map(|(name, version)| Dependency {
            name: name.clone(),
            version: version
                .as_str()
                .map(str::to_string)
                .unwrap_or_else(|| version.to_string()),
            kind,
            category: categorize_dependency(name),
        })
        .collect()
}

fn parse_package_json(text: &str) -> Result<StructuredLayer, String> {
    let pkg: PackageJson = serde_json::from_str(text).map_err(|e| e.to_string())?;

    let metadata = ProjectMetadata {
        name: pkg.name.unwrap_or_default(),
        description: pkg.description,
        version: pkg.version,
        author: pkg
            .author
            .as_ref()
            .and_then(|a| string_or_field(a, "name"))
            .map(|a| person_name(&a)),
        license: pkg.license.as_ref().and_then(|l| string_or_field(l, "type")),
        keywords: pkg
            .keywords
            .iter()
            .filter_map(|k| k.as_str().map(str::to_string))
            .collect(),
        repository: pkg.repository.as_ref().and_then(|r| string_or_field(r, "url")),
        homepage: pkg.homepage,
    };

    let mut dependencies = json_dependencies(&pkg.dependencies, DependencyKind::Production);
    dependencies.extend(json_dependencies(&pkg.dev_dependencies, DependencyKind::Development));
    dependencies.extend(json_dependencies(&pkg.peer_dependencies, DependencyKind::Peer));

    let scripts = pkg
        .scripts
        .iter()
        .filter_map(|(name, command)| {
            let command = command.as_str()?;
            Some(Script {
                name: name.clone(),
                command: command.to_string(),
                description: describe_script(name, command),
            })
        })
        .collect();

    Ok(StructuredLayer {
        metadata,
        dependencies,
        scripts,
        manifest_path: None,
    })
}

fn toml_str(table: &toml::Table, key: &str) -> Option<String> {
    table.get(key).and_then(|v| v.as_str()).map(str::to_string)
}

fn toml_dependencies(table: Option<&toml::Value>, kind: DependencyKind) -> Vec<Dependency> {
    let Some(table) = table.and_then(|t| t.as_table()) else {
        return vec![];
    };
    table
        .iter()
        .map(|(name, spec)| {
            let version = match spec {
                toml::Value::String(v) => v.clone(),
                toml::Value::Table(t) => {
                    if let Some(v) = t.get("version").and_then(|v| v.as_str()) {
                        v.to_string()
                    } else if t.get("workspace").and_then(|v| v.as_bool()) == Some(true) {
                        "workspace".to_string()
                    } else {
                        "*".to_string()
                    }
                }
                other => other.to_string(),
            };
            let package = spec
                .as_table()
                .and_then(|t| t.get("package"))
                .and_then(|p| p.as_str())
                .unwrap_or(name.as_str());
            Dependency {
                name: name.clone(),
                version,
                kind,
                category: categorize_dependency(package),
            }
        })
        .collect()
}

fn parse_cargo_toml(text: &str) -> Result<StructuredLayer, String> {
    let doc: toml::Table = toml::from_str(text).map_err(|e| e.to_string())?;
    let empty = toml::Table::new();
    let package = doc
        .get("package")
        .and_then(|p| p.as_table())
        .unwrap_or(&empty);

    let metadata = ProjectMetadata {
        name: toml_str(package, "name").unwrap_or_default(),
        description: toml_str(package, "description"),
        version: toml_str(package, "version"),
        author: package
            .get("authors")
            .and_then(|a| a.as_array())
            .and_then(|a| a.first())
            .and_then(|a| a.as_str())
            .map(person_name),
        license: toml_str(package, "license"),
        keywords: package
            .get("keywords")
            .and_then(|k| k.as_array())
            .map(|k| k.iter().filter_map(|v| v.as_str().map(str::to_string)).collect())
            .unwrap_or_default(),
        repository: toml_str(package, "repository"),
        homepage: toml_str(package, "homepage"),
    };

    let mut dependencies = toml_dependencies(doc.get("dependencies"), DependencyKind::Production);
    for table in ["dev-dependencies", "build-dependencies"] {
        dependencies.extend(toml_dependencies(doc.get(table), DependencyKind::Development));
    }

    Ok(StructuredLayer {
        metadata,
        dependencies,
        scripts: vec![],
        manifest_path: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::MemoryFileSystem;
    use std::time::SystemTime;

    const PACKAGE_JSON: &str = r#"{
        "name": "site-gen",
        "description": "Static site generator",
        "version": "1.2.3",
        "author": { "name": "Jane Doe", "email": "jane@example.com" },
        "license": "MIT",
        "keywords": ["static", "site", 42],
        "repository": { "type": "git", "url": "https://github.com/x/site-gen" },
        "homepage": "https://site-gen.dev",
        "dependencies": { "react": "^18.0.0", "express": "^4.0.0" },
        "devDependencies": { "jest": "^29.0.0" },
        "peerDependencies": { "lodash": "*" },
        "scripts": { "build": "vite build", "test": "jest" }
    }"#;

    fn extractor_with(files: &[(&str, &str)]) -> StructuredExtractor {
        let fs = Arc::new(MemoryFileSystem::new());
        for (path, content) in files {
            fs.write(*path, *content, SystemTime::UNIX_EPOCH);
        }
        StructuredExtractor::new(fs)
    }

    #[tokio::test]
    async fn test_package_json_extraction() {
        let extractor = extractor_with(&[("/work/site/package.json", PACKAGE_JSON)]);
        let layer = extractor.extract(Path::new("/work/site")).await;

        assert_eq!(layer.metadata.name, "site-gen");
        assert_eq!(layer.metadata.author.as_deref(), Some("Jane Doe"));
        assert_eq!(layer.metadata.keywords, vec!["static", "site"]);
        assert_eq!(
            layer.metadata.repository.as_deref(),
            Some("https://github.com/x/site-gen")
        );
        assert_eq!(layer.dependencies.len(), 4);
        assert_eq!(layer.dependencies_of(DependencyKind::Production).count(), 2);
        let jest = layer.dependencies.iter().find(|d| d.name == "jest").unwrap();
        assert_eq!(jest.kind, DependencyKind::Development);
        assert_eq!(jest.category, DependencyCategory::Testing);
        let lodash = layer.dependencies.iter().find(|d| d.name == "lodash").unwrap();
        assert_eq!(lodash.kind, DependencyKind::Peer);
        assert_eq!(layer.scripts.len(), 2);
        assert_eq!(layer.scripts[0].description, "Build the project for production");
        assert_eq!(layer.manifest_path, Some(PathBuf::from("/work/site/package.json")));
    }

    #[tokio::test]
    async fn test_invalid_manifest_falls_back_to_dir_name() {
        let extractor = extractor_with(&[("/work/my-app/package.json", "{ not json")]);
        let layer = extractor.extract(Path::new("/work/my-app")).await;
        assert_eq!(layer.metadata.name, "my-app");
        assert!(layer.dependencies.is_empty());
        assert!(layer.scripts.is_empty());
        assert!(layer.manifest_path.is_none());
    }

    #[tokio::test]
    async fn test_missing_manifest_falls_back() {
        let extractor = extractor_with(&[]);
        let layer = extractor.extract(Path::new("/work/empty")).await;
        assert_eq!(layer, fallback_layer(Path::new("/work/empty")));
        assert_eq!(layer.metadata.name, "empty");
    }

    #[tokio::test]
    async fn test_cargo_toml_extraction() {
        let cargo = r#"
            [package]
            name = "engine"
            version = "0.3.0"
            authors = ["Sam <sam@example.com>"]
            keywords = ["docs"]

            [dependencies]
            tokio = { version = "1", features = ["full"] }
            axum = "0.7"
            local = { path = "../local" }

            [dev-dependencies]
            proptest = "1"
        "#;
        let extractor = extractor_with(&[("/w/engine/Cargo.toml", cargo)]);
        let layer = extractor.extract(Path::new("/w/engine")).await;

        assert_eq!(layer.metadata.name, "engine");
        assert_eq!(layer.metadata.author.as_deref(), Some("Sam"));
        let axum = layer.dependencies.iter().find(|d| d.name == "axum").unwrap();
        assert_eq!(axum.category, DependencyCategory::BackendFramework);
        let local = layer.dependencies.iter().find(|d| d.name == "local").unwrap();
        assert_eq!(local.version, "*");
        let proptest = layer.dependencies.iter().find(|d| d.name == "proptest").unwrap();
        assert_eq!(proptest.kind, DependencyKind::Development);
        assert!(layer.scripts.is_empty());
    }

    #[tokio::test]
    async fn test_package_json_preferred_over_cargo() {
        let extractor = extractor_with(&[
            ("/w/mixed/package.json", r#"{ "name": "js-side" }"#),
            ("/w/mixed/Cargo.toml", "[package]\nname = \"rust-side\"\n"),
        ]);
        let layer = extractor.extract(Path::new("/w/mixed")).await;
        assert_eq!(layer.metadata.name, "js-side");
    }

    #[tokio::test]
    async fn test_malformed_package_json_falls_through_to_cargo() {
        let extractor = extractor_with(&[
            ("/w/mixed/package.json", "[1, 2"),
            ("/w/mixed/Cargo.toml", "[package]\nname = \"rust-side\"\n"),
        ]);
        let layer = extractor.extract(Path::new("/w/mixed")).await;
        assert_eq!(layer.metadata.name, "rust-side");
    }

    #[test]
    fn test_is_manifest() {
        assert!(is_manifest(Path::new("/p/package.json")));
        assert!(is_manifest(Path::new("Cargo.toml")));
        assert!(!is_manifest(Path::new("/p/package-lock.json")));
    }
}
