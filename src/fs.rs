//! Filesystem access used by the cache and scanners
//!
//! Everything the engine reads goes through [`FileSystem`] so the document
//! cache and scanners can be driven by an in-memory tree in tests.

use async_trait::async_trait;
use dashmap::DashMap;
use ignore::WalkBuilder;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;
use tracing::warn;

/// Metadata the engine needs about a path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileStat {
    pub modified: SystemTime,
    pub len: u64,
    pub is_dir: bool,
}

/// Directory-name predicate for [`FileSystem::walk`]; `true` prunes the directory
pub type DirFilter = Arc<dyn Fn(&str) -> bool + Send + Sync>;

/// Async filesystem abstraction
#[async_trait]
pub trait FileSystem: Send + Sync {
    /// Stat a path
    async fn stat(&self, path: &Path) -> io::Result<FileStat>;

    /// Read a whole file as UTF-8
    async fn read_to_string(&self, path: &Path) -> io::Result<String>;

    /// Files up to `max_depth` directory levels below `root`, sorted.
    ///
    /// Hidden entries and directories rejected by `skip_dir` are pruned;
    /// unreadable directories are logged and skipped.
    async fn walk(&self, root: &Path, max_depth: usize, skip_dir: DirFilter)
        -> io::Result<Vec<PathBuf>>;

    /// Whether the path currently exists
    async fn exists(&self, path: &Path) -> bool {
        self.stat(path).await.is_ok()
    }
}

/// Real filesystem backed by `tokio::fs`
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioFileSystem;

#[async_trait]
impl FileSystem for TokioFileSystem {
    async fn stat(&self, path: &Path) -> io::Result<FileStat> {
        let meta = tokio::fs::metadata(path).await?;
        Ok(FileStat {
            modified: meta.modified()?,
            len: meta.len(),
            is_dir: meta.is_dir(),
        })
    }

    async fn read_to_string(&self, path: &Path) -> io::Result<String> {
        tokio::fs::read_to_string(path).await
    }

    async fn walk(
        &self,
        root: &Path,
        max_depth: usize,
        skip_dir: DirFilter,
    ) -> io::Result<Vec<PathBuf>> {
        let root = root.to_path_buf();
        tokio::task::spawn_blocking(move || {
            let walker = WalkBuilder::new(&root)
                .standard_filters(false)
                .hidden(true)
                .max_depth(Some(max_depth + 1))
                .filter_entry(move |entry| {
                    let is_dir = entry.file_type().is_some_and(|t| t.is_dir());
                    !(is_dir && skip_dir(&entry.file_name().to_string_lossy()))
                })
                .build();

            let mut files = Vec::new();
            for item in walker {
                match item {
                    Ok(entry) if entry.file_type().is_some_and(|t| t.is_file()) => {
                        files.push(entry.into_path())
                    }
                    Ok(_) => {}
                    Err(err) => {
                        warn!("Skipping unreadable entry under {}: {}", root.display(), err)
                    }
                }
            }
            files.sort();
            files
        })
        .await
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e))
    }
}

#[derive(Debug, Clone)]
struct MemoryFile {
    content: String,
    modified: SystemTime,
}

/// In-memory filesystem with caller-controlled modification times.
///
/// Directories are implied by the files stored beneath them.
#[derive(Debug, Default)]
pub struct MemoryFileSystem {
    files: DashMap<PathBuf, MemoryFile>,
}

impl MemoryFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create or replace a file
    pub fn write(
        &self,
        path: impl Into<PathBuf>,
        content: impl Into<String>,
        modified: SystemTime,
    ) {
        self.files.insert(
            path.into(),
            MemoryFile {
                content: content.into(),
                modified,
            },
        );
    }

    /// Delete a file, returning whether it existed
    pub fn remove(&self, path: &Path) -> bool {
        self.files.remove(path).is_some()
    }

    fn is_implied_dir(&self, path: &Path) -> bool {
        self.files
            .iter()
            .any(|f| f.key().starts_with(path) && f.key().as_path() != path)
    }

    fn not_found(path: &Path) -> io::Error {
        io::Error::new(
            io::ErrorKind::NotFound,
            format!("{} not found", path.display()),
        )
    }
}

#[async_trait]
impl FileSystem for MemoryFileSystem {
    async fn stat(&self, path: &Path) -> io::Result<FileStat> {
        if let Some(file) = self.files.get(path) {
            return Ok(FileStat {
                modified: file.modified,
                len: file.content.len() as u64,
                is_dir: false,
            });
        }
        if self.is_implied_dir(path) {
            return Ok(FileStat {
                modified: SystemTime::UNIX_EPOCH,
                len: 0,
                is_dir: true,
            });
        }
        Err(Self::not_found(path))
    }

    async fn read_to_string(&self, path: &Path) -> io::Result<String> {
        self.files
            .get(path)
            .map(|f| f.content.clone())
            .ok_or_else(|| Self::not_found(path))
    }

    async fn walk(
        &self,
        root: &Path,
        max_depth: usize,
        skip_dir: DirFilter,
    ) -> io::Result<Vec<PathBuf>> {
        let mut files: Vec<PathBuf> = self
            .files
            .iter()
            .filter_map(|file| {
                let relative = file.key().strip_prefix(root).ok()?;
                let names: Vec<String> = relative
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy().into_owned())
                    .collect();
                let (name, dirs) = names.split_last()?;
                let visible = !name.starts_with('.')
                    && dirs.iter().all(|d| !d.starts_with('.') && !skip_dir(d));
                (visible && dirs.len() <= max_depth).then(|| file.key().clone())
            })
            .collect();
        files.sort();
        Ok(files)
    }
}
