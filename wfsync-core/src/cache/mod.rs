//! Result cache for scenario analyses
//!
//! One pretty-printed JSON file per key under the cache namespace. Keys are
//! content fingerprints, so concurrent writers of the same key write the same
//! value and last-writer-wins needs no locking.
//!
//! Reads fail open: a missing, unreadable, corrupt, incomplete or stale entry
//! is a miss. Writes fail closed: a result that cannot be persisted is an
//! error for the caller.

use crate::fingerprint;
use crate::models::analysis::REQUIRED_SECTIONS;
use crate::models::{AnalysisResult, ScenarioName, StoryRecord, WorkflowCorpus};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

/// Extension of cache entry files
pub const CACHE_EXTENSION: &str = "json";

/// Cache key for one scenario analysis
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CacheKey(String);

impl CacheKey {
    /// Derive the key from everything the analysis depends on
    pub fn for_analysis(
        corpus: &WorkflowCorpus,
        scenario: &ScenarioName,
        stories: &[StoryRecord],
    ) -> crate::Result<Self> {
        Ok(Self(fingerprint::analysis_key(corpus, scenario, stories)?))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for CacheKey {
    fn from(key: &str) -> Self {
        Self(key.to_string())
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Outcome of a prune pass
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PruneStats {
    pub removed: usize,
    pub kept: usize,
    pub failed: usize,
}

/// Statistics about the cache namespace
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct CacheStatistics {
    pub total_entries: usize,
    pub stale_entries: usize,
    pub total_size: u64,
}

/// File-backed analysis cache
#[derive(Debug, Clone)]
pub struct ResultCache {
    cache_dir: PathBuf,
    max_age: Option<Duration>,
}

impl ResultCache {
    /// Cache rooted at `cache_dir`; the directory is created on first write
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
            max_age: None,
        }
    }

    /// Treat entries older than `max_age` as misses and let [`prune`](Self::prune) delete them
    #[must_use]
    pub fn with_max_age(mut self, max_age: Duration) -> Self {
        self.max_age = Some(max_age);
        self
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    fn entry_path(&self, key: &CacheKey) -> PathBuf {
        self.cache_dir.join(format!("{key}.{CACHE_EXTENSION}"))
    }

    fn is_stale(&self, modified: SystemTime) -> bool {
        self.max_age.is_some_and(|max_age| {
            modified.elapsed().unwrap_or(Duration::ZERO) > max_age
        })
    }

    /// Look up a stored result; every failure degrades to `None`
    pub fn get(&self, key: &CacheKey) -> Option<AnalysisResult> {
        let path = self.entry_path(key);
        if !path.exists() {
            tracing::info!("Cache MISS: {key}");
            return None;
        }

        if let Ok(modified) = std::fs::metadata(&path).and_then(|m| m.modified()) {
            if self.is_stale(modified) {
                tracing::info!("Cache entry expired, ignoring: {key}");
                return None;
            }
        }

        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) => {
                tracing::warn!("Cache read error, ignoring {key}: {e}");
                return None;
            }
        };

        let value: serde_json::Value = match serde_json::from_str(&content) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!("Cache entry is not valid JSON, ignoring {key}: {e}");
                return None;
            }
        };

        if let Some(missing) = REQUIRED_SECTIONS.iter().find(|s| value.get(**s).is_none()) {
            tracing::warn!("Cache invalid schema (missing '{missing}'), ignoring: {key}");
            return None;
        }

        match serde_json::from_value(value) {
            Ok(result) => {
                tracing::info!("Cache HIT: {key}");
                Some(result)
            }
            Err(e) => {
                tracing::warn!("Cache invalid schema, ignoring {key}: {e}");
                None
            }
        }
    }

    /// Persist a result, replacing any previous entry for the key
    pub fn put(&self, key: &CacheKey, result: &AnalysisResult) -> crate::Result<()> {
        wfsync_utils::ensure_dir(&self.cache_dir)?;
        let path = self.entry_path(key);
        let staging = path.with_extension(format!("{CACHE_EXTENSION}.tmp"));

        let serialized = serde_json::to_string_pretty(result)?;
        std::fs::write(&staging, serialized)?;
        std::fs::rename(&staging, &path)?;

        tracing::debug!("Saved to cache: {key}");
        Ok(())
    }

    fn entries(&self) -> crate::Result<Vec<(PathBuf, std::fs::Metadata)>> {
        if !self.cache_dir.exists() {
            return Ok(Vec::new());
        }
        let mut entries = Vec::new();
        for entry in std::fs::read_dir(&self.cache_dir)? {
            let entry = entry?;
            let path = entry.path();
            if path.extension().and_then(|s| s.to_str()) == Some(CACHE_EXTENSION) {
                entries.push((path, entry.metadata()?));
            }
        }
        Ok(entries)
    }

    /// Delete entries older than the max age. No-op without a max age.
    pub fn prune(&self) -> crate::Result<PruneStats> {
        let mut stats = PruneStats::default();
        if self.max_age.is_none() {
            return Ok(stats);
        }

        for (path, metadata) in self.entries()? {
            let stale = metadata.modified().is_ok_and(|m| self.is_stale(m));
            if !stale {
                stats.kept += 1;
                continue;
            }
            match std::fs::remove_file(&path) {
                Ok(()) => {
                    tracing::debug!("Pruned stale cache entry {}", path.display());
                    stats.removed += 1;
                }
                Err(e) => {
                    tracing::warn!("Failed to prune {}: {e}", path.display());
                    stats.failed += 1;
                }
            }
        }

        if stats.removed > 0 {
            tracing::info!("Pruned {} stale cache entries", stats.removed);
        }
        Ok(stats)
    }

    /// Get cache statistics
    pub fn statistics(&self) -> crate::Result<CacheStatistics> {
        let mut stats = CacheStatistics::default();
        for (_, metadata) in self.entries()? {
            stats.total_entries += 1;
            stats.total_size += metadata.len();
            if metadata.modified().is_ok_and(|m| self.is_stale(m)) {
                stats.stale_entries += 1;
            }
        }
        Ok(stats)
    }
}
