//! One JSON file per query hash under `<state_root>/env/<env>/cache/query_plans/`.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use grimoire_core::errors::{CacheError, GrimoireResult};
use grimoire_core::models::QueryPlan;
use grimoire_core::traits::{IPlanCache, PlanCacheStats};
use grimoire_observability::tracing_setup::events;
use tracing::{debug, warn};

use super::CacheCounters;

const ENTRY_EXTENSION: &str = "json";
const TEMP_EXTENSION: &str = "json.tmp";

/// File-backed plan cache. A single mutex serialises every operation.
pub struct FilePlanCache {
    dir: PathBuf,
    lock: Mutex<()>,
    counters: CacheCounters,
}

impl FilePlanCache {
    /// Open (creating if needed) the cache directory.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, CacheError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| CacheError::DirectoryUnavailable {
            path: format!("{}: {e}", dir.display()),
        })?;
        Ok(Self {
            dir,
            lock: Mutex::new(()),
            counters: CacheCounters::default(),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn entry_path(&self, query_hash: &str) -> PathBuf {
        self.dir.join(format!("{query_hash}.{ENTRY_EXTENSION}"))
    }

    fn guard(&self, key: &str) -> Result<MutexGuard<'_, ()>, CacheError> {
        self.lock.lock().map_err(|_| CacheError::ReadFailed {
            key: key.to_string(),
            reason: "plan cache lock poisoned".to_string(),
        })
    }

    /// Paths of all persisted entries (temp files excluded).
    fn entry_paths(&self) -> Result<Vec<PathBuf>, CacheError> {
        let entries = fs::read_dir(&self.dir).map_err(|e| CacheError::ReadFailed {
            key: self.dir.display().to_string(),
            reason: e.to_string(),
        })?;
        Ok(entries
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| path.extension().is_some_and(|ext| ext == ENTRY_EXTENSION))
            .collect())
    }

    /// Parse one entry. `Ok(None)` when the file does not exist.
    fn read_entry(&self, path: &Path, key: &str) -> Result<Option<QueryPlan>, CacheError> {
        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(CacheError::ReadFailed {
                    key: key.to_string(),
                    reason: e.to_string(),
                })
            }
        };
        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|e| CacheError::CorruptEntry {
                path: path.display().to_string(),
                reason: e.to_string(),
            })
    }

    fn evict_corrupt(&self, path: &Path, reason: &str) {
        events::cache_entry_corrupt(&path.display().to_string(), reason);
        remove_entry(path, "corrupt");
        self.counters.corrupt();
    }
}

/// Delete one entry file. A missing file is not an error; any other failure is
/// logged and reported as not removed.
fn remove_entry(path: &Path, kind: &str) -> bool {
    match fs::remove_file(path) {
        Ok(()) => true,
        Err(e) if e.kind() == ErrorKind::NotFound => false,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "failed to delete {kind} plan cache entry");
            false
        }
    }
}

impl IPlanCache for FilePlanCache {
    fn get(&self, query_hash: &str) -> GrimoireResult<Option<QueryPlan>> {
        let _guard = self.guard(query_hash)?;
        let path = self.entry_path(query_hash);
        match self.read_entry(&path, query_hash) {
            Ok(Some(plan)) if plan.is_expired() => {
                debug!(query_hash = %query_hash, "plan cache entry expired");
                if remove_entry(&path, "expired") {
                    self.counters.expired(1);
                }
                self.counters.miss();
                Ok(None)
            }
            Ok(Some(plan)) => {
                self.counters.hit();
                Ok(Some(plan))
            }
            Ok(None) => {
                self.counters.miss();
                Ok(None)
            }
            Err(CacheError::CorruptEntry { reason, .. }) => {
                self.evict_corrupt(&path, &reason);
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    fn put(&self, plan: &QueryPlan) -> GrimoireResult<()> {
        let _guard = self.guard(&plan.query_hash)?;
        let json = serde_json::to_string_pretty(plan)?;
        let path = self.entry_path(&plan.query_hash);
        let temp = self.dir.join(format!("{}.{TEMP_EXTENSION}", plan.query_hash));
        let write_failed = |e: std::io::Error| CacheError::WriteFailed {
            key: plan.query_hash.clone(),
            reason: e.to_string(),
        };
        fs::write(&temp, json).map_err(write_failed)?;
        fs::rename(&temp, &path).map_err(write_failed)?;
        Ok(())
    }

    fn remove(&self, query_hash: &str) -> GrimoireResult<bool> {
        let _guard = self.guard(query_hash)?;
        match fs::remove_file(self.entry_path(query_hash)) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(CacheError::WriteFailed {
                key: query_hash.to_string(),
                reason: e.to_string(),
            }
            .into()),
        }
    }

    fn cleanup_expired(&self) -> GrimoireResult<usize> {
        let _guard = self.guard("cleanup")?;
        let mut removed = 0;
        for path in self.entry_paths()? {
            let key = path.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default();
            match self.read_entry(&path, &key) {
                Ok(Some(plan)) if plan.is_expired() => {
                    if remove_entry(&path, "expired") {
                        removed += 1;
                    }
                }
                Ok(_) => {}
                Err(CacheError::CorruptEntry { reason, .. }) => self.evict_corrupt(&path, &reason),
                Err(e) => warn!(path = %path.display(), error = %e, "skipping unreadable plan cache entry"),
            }
        }
        self.counters.expired(removed as u64);
        debug!(removed, "plan cache cleanup complete");
        Ok(removed)
    }

    fn clear(&self) -> GrimoireResult<usize> {
        let _guard = self.guard("clear")?;
        let mut removed = 0;
        for path in self.entry_paths()? {
            if remove_entry(&path, "cached") {
                removed += 1;
            }
        }
        Ok(removed)
    }

    fn stats(&self) -> PlanCacheStats {
        let entries = self.entry_paths().map(|p| p.len()).unwrap_or(0);
        self.counters.snapshot(entries)
    }
}
