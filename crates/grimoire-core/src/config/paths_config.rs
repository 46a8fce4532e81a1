use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::defaults;

/// Filesystem layout: where ingestion artifacts are read and state is written.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Environment name, e.g. `dev` or `prod`.
    pub environment: String,
    /// Root of `<env>/<job_id>/` graph artifacts and `<env>/*.json` chunk files.
    pub ingest_root: PathBuf,
    /// Root under which `env/<env>/cache/` state is kept.
    pub state_root: PathBuf,
}

impl PathsConfig {
    /// `<ingest_root>/<environment>`.
    pub fn environment_ingest_dir(&self) -> PathBuf {
        self.ingest_root.join(&self.environment)
    }

    /// `<state_root>/env/<environment>/cache/query_plans`.
    pub fn plan_cache_dir(&self) -> PathBuf {
        self.state_root
            .join("env")
            .join(&self.environment)
            .join("cache")
            .join("query_plans")
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            environment: defaults::DEFAULT_ENVIRONMENT.to_string(),
            ingest_root: PathBuf::from(defaults::DEFAULT_INGEST_ROOT),
            state_root: PathBuf::from(defaults::DEFAULT_STATE_ROOT),
        }
    }
}
