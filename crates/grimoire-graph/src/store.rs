//! Graph Artifact Store: resolves ingestion job directories and caches parsed snapshots.
//!
//! Layout: `<ingest_root>/<env>/<job_id>/{graph_snapshot.json, alias_map.json}`.
//! Missing or malformed artifacts yield `None`, never an error.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use grimoire_core::config::GraphConfig;
use grimoire_core::constants::{ALIAS_MAP_FILE, GRAPH_SNAPSHOT_FILE};
use grimoire_core::errors::ArtifactError;
use grimoire_observability::tracing_setup::events;
use moka::sync::Cache;
use tracing::warn;

use crate::model::{AliasMapFile, LoadedGraph, SnapshotFile};

/// Per-environment loader with an in-memory TTL cache keyed by job id.
pub struct GraphArtifactStore {
    ingest_root: PathBuf,
    environment: String,
    pinned_job: Option<String>,
    cache: Cache<String, Arc<LoadedGraph>>,
    disk_loads: AtomicU64,
}

impl GraphArtifactStore {
    pub fn new(ingest_root: impl Into<PathBuf>, environment: impl Into<String>, config: &GraphConfig) -> Self {
        let cache = Cache::builder()
            .max_capacity(config.cache_capacity.max(1))
            .time_to_live(Duration::from_secs(config.cache_ttl_secs))
            .build();
        Self {
            ingest_root: ingest_root.into(),
            environment: environment.into(),
            pinned_job: config.job_id.clone(),
            cache,
            disk_loads: AtomicU64::new(0),
        }
    }

    pub fn environment(&self) -> &str {
        &self.environment
    }

    /// `<ingest_root>/<env>`.
    pub fn environment_dir(&self) -> PathBuf {
        self.ingest_root.join(&self.environment)
    }

    /// Number of times a snapshot was parsed from disk.
    pub fn disk_loads(&self) -> u64 {
        self.disk_loads.load(Ordering::Relaxed)
    }

    pub fn cached_jobs(&self) -> u64 {
        self.cache.run_pending_tasks();
        self.cache.entry_count()
    }

    /// Resolve a job directory: the requested (or pinned) job, else the most recently modified one.
    pub fn resolve_job_dir(&self, job_id: Option<&str>) -> Result<PathBuf, ArtifactError> {
        let env_dir = self.environment_dir();
        if let Some(job) = job_id.or(self.pinned_job.as_deref()) {
            let dir = env_dir.join(job);
            return if dir.is_dir() {
                Ok(dir)
            } else {
                Err(ArtifactError::NotFound {
                    path: dir.display().to_string(),
                })
            };
        }
        latest_job_dir(&env_dir).ok_or_else(|| ArtifactError::NoJob {
            environment: self.environment.clone(),
        })
    }

    /// Load the snapshot for `job_id` (or the latest job), from cache when fresh.
    pub fn load_graph_snapshot(&self, job_id: Option<&str>) -> Option<Arc<LoadedGraph>> {
        let dir = match self.resolve_job_dir(job_id) {
            Ok(dir) => dir,
            Err(err) => {
                warn!(environment = %self.environment, error = %err, "no graph snapshot available");
                return None;
            }
        };
        let key = job_key(&dir);
        self.cache.optionally_get_with(key, || self.load_from_disk(&dir))
    }

    /// Drop any cached copy and parse again from disk.
    pub fn force_reload(&self, job_id: Option<&str>) -> Option<Arc<LoadedGraph>> {
        if let Ok(dir) = self.resolve_job_dir(job_id) {
            self.cache.invalidate(&job_key(&dir));
        }
        self.load_graph_snapshot(job_id)
    }

    pub fn clear_cache(&self) {
        self.cache.invalidate_all();
        self.cache.run_pending_tasks();
    }

    fn load_from_disk(&self, dir: &Path) -> Option<Arc<LoadedGraph>> {
        self.disk_loads.fetch_add(1, Ordering::Relaxed);
        let job_id = job_key(dir);
        match read_artifacts(dir, &job_id) {
            Ok(loaded) => {
                events::graph_snapshot_loaded(
                    loaded.job_id(),
                    loaded.snapshot.node_count(),
                    loaded.snapshot.edge_count(),
                    loaded.snapshot.cross_references.len(),
                );
                Some(Arc::new(loaded))
            }
            Err(err) => {
                warn!(job_id = %job_id, error = %err, "graph artifacts unusable");
                None
            }
        }
    }
}

fn job_key(dir: &Path) -> String {
    dir.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Most recently modified subdirectory; ties broken by name.
fn latest_job_dir(env_dir: &Path) -> Option<PathBuf> {
    let entries = std::fs::read_dir(env_dir).ok()?;
    entries
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_ok_and(|t| t.is_dir()))
        .map(|entry| {
            let modified = entry
                .metadata()
                .and_then(|m| m.modified())
                .unwrap_or(SystemTime::UNIX_EPOCH);
            (modified, entry.path())
        })
        .max_by(|(ma, pa), (mb, pb)| ma.cmp(mb).then_with(|| pa.cmp(pb)))
        .map(|(_, path)| path)
}

/// Parse both artifact files. The snapshot is required; a missing alias map
/// yields an empty alias set, a malformed one makes the whole job unusable.
fn read_artifacts(dir: &Path, job_id: &str) -> Result<LoadedGraph, ArtifactError> {
    let snapshot_path = dir.join(GRAPH_SNAPSHOT_FILE);
    let snapshot: SnapshotFile = read_json(&snapshot_path)?;

    let alias_path = dir.join(ALIAS_MAP_FILE);
    let aliases = if alias_path.exists() {
        Some(read_json::<AliasMapFile>(&alias_path)?)
    } else {
        warn!(path = %alias_path.display(), "alias map missing; continuing without aliases");
        None
    };

    Ok(LoadedGraph::new(snapshot.into_snapshot(job_id, aliases)))
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, ArtifactError> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            ArtifactError::NotFound {
                path: path.display().to_string(),
            }
        } else {
            ArtifactError::Io {
                path: path.display().to_string(),
                reason: e.to_string(),
            }
        }
    })?;
    serde_json::from_str(&content).map_err(|e| ArtifactError::Malformed {
        path: path.display().to_string(),
        reason: e.to_string(),
    })
}
