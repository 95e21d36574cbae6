//! Modification-time based document cache
//!
//! Entries are keyed by absolute path and considered valid while their stored
//! mtime is at or after the file's current mtime. There is no TTL and no
//! capacity eviction: entries leave only through `invalidate`, `clear`, or a
//! newer file replacing them.
//!
//! `get_or_parse` is a check-then-act sequence and is not atomic. Concurrent
//! calls for *different* paths are fine; callers must not race two parses of
//! the same path.

use sha2::{Digest, Sha256};
use std::future::Future;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::SystemTime;

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::models::DocumentRecord;
use crate::error::{ContextError, Result};
use crate::fs::FileSystem;

/// Cached record with the mtime it was parsed at
#[derive(Debug, Clone)]
struct CacheEntry {
    record: DocumentRecord,
    modified: SystemTime,
    content_hash: String,
}

/// Cache statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// SHA-256 of the document text, hex encoded
pub fn content_hash(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hex::encode(hasher.finalize())
}

/// Document cache shared by the scanners of one analyzer
pub struct DocumentCache {
    fs: Arc<dyn FileSystem>,
    entries: DashMap<PathBuf, CacheEntry>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl DocumentCache {
    pub fn new(fs: Arc<dyn FileSystem>) -> Self {
        Self {
            fs,
            entries: DashMap::new(),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Return the cached record if it is still current, else run `parse` and
    /// store the result.
    ///
    /// If the path cannot be stat'ed, any existing entry is returned as-is;
    /// without one the stat error propagates.
    pub async fn get_or_parse<F, Fut>(&self, path: &Path, parse: F) -> Result<DocumentRecord>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<DocumentRecord>>,
    {
        let modified = match self.fs.stat(path).await {
            Ok(stat) => stat.modified,
            Err(err) => return self.fallback(path, err),
        };

        if let Some(entry) = self.entries.get(path) {
            if entry.modified >= modified {
                self.hits.fetch_add(1, Ordering::Relaxed);
                return Ok(entry.record.clone());
            }
            debug!("Cache entry stale for {}", path.display());
        }

        self.parse_and_store(path, modified, parse).await
    }

    /// Re-parse unconditionally and replace any existing entry
    pub async fn refresh<F, Fut>(&self, path: &Path, parse: F) -> Result<DocumentRecord>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<DocumentRecord>>,
    {
        let modified = self
            .fs
            .stat(path)
            .await
            .map_err(|e| ContextError::io(path, e))?
            .modified;
        self.parse_and_store(path, modified, parse).await
    }

    async fn parse_and_store<F, Fut>(
        &self,
        path: &Path,
        modified: SystemTime,
        parse: F,
    ) -> Result<DocumentRecord>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<DocumentRecord>>,
    {
        self.misses.fetch_add(1, Ordering::Relaxed);
        let record = parse().await?;
        let hash = content_hash(&record.content);

        if let Some(previous) = self.entries.get(path) {
            if previous.content_hash == hash {
                debug!("{} touched but content unchanged", path.display());
            }
        }

        self.entries.insert(
            path.to_path_buf(),
            CacheEntry {
                record: record.clone(),
                modified,
                content_hash: hash,
            },
        );
        Ok(record)
    }

    fn fallback(&self, path: &Path, err: io::Error) -> Result<DocumentRecord> {
        match self.entries.get(path) {
            Some(entry) => {
                warn!(
                    "Failed to stat {} ({}), serving cached record",
                    path.display(),
                    err
                );
                self.hits.fetch_add(1, Ordering::Relaxed);
                Ok(entry.record.clone())
            }
            None => Err(ContextError::io(path, err)),
        }
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.entries.contains_key(path)
    }

    /// Remove one entry
    pub fn invalidate(&self, path: &Path) -> bool {
        self.entries.remove(path).is_some()
    }

    /// Remove all entries
    pub fn clear(&self) {
        self.entries.clear();
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.entries.len(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}
