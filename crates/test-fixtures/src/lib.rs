//! Fixture loader for grimoire integration tests.
//!
//! Ships an on-disk ingestion tree (`data/ingest/<env>/...`) with a graph
//! snapshot, alias map, and chunk files in both supported schemas, plus
//! golden evaluation cases under `data/golden/`.

use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};

/// Environment name used by the fixture ingestion tree.
pub const FIXTURE_ENV: &str = "dev";

/// Job id of the fixture graph snapshot.
pub const FIXTURE_JOB_ID: &str = "job-001";

/// Root directory of the fixture data.
pub fn fixtures_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("data")
}

/// Root of the fixture ingestion tree (`<root>/<env>/<job>/...`).
pub fn ingest_root() -> PathBuf {
    fixtures_root().join("ingest")
}

/// Load and deserialize a JSON fixture file.
///
/// # Panics
/// Panics if the file doesn't exist or can't be deserialized.
pub fn load_fixture<T: DeserializeOwned>(relative_path: &str) -> T {
    let path = fixtures_root().join(relative_path);
    let content = std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("Failed to read fixture {}: {}", path.display(), e));
    serde_json::from_str(&content)
        .unwrap_or_else(|e| panic!("Failed to parse fixture {}: {}", path.display(), e))
}

/// Absolute path to a fixture file.
pub fn fixture_path(relative_path: &str) -> PathBuf {
    fixtures_root().join(relative_path)
}

pub fn fixture_exists(relative_path: &str) -> bool {
    fixture_path(relative_path).exists()
}

/// Copy the fixture ingestion tree into `dest`, returning `dest`.
///
/// Tests that mutate artifacts (corrupting files, adding jobs) work on a copy.
///
/// # Panics
/// Panics on any I/O failure.
pub fn stage_ingest_tree(dest: &Path) -> PathBuf {
    copy_dir(&ingest_root(), dest);
    dest.to_path_buf()
}

fn copy_dir(src: &Path, dest: &Path) {
    std::fs::create_dir_all(dest)
        .unwrap_or_else(|e| panic!("Failed to create {}: {}", dest.display(), e));
    let entries = std::fs::read_dir(src)
        .unwrap_or_else(|e| panic!("Failed to read directory {}: {}", src.display(), e));
    for entry in entries {
        let entry = entry.unwrap_or_else(|e| panic!("Bad entry in {}: {}", src.display(), e));
        let path = entry.path();
        let target = dest.join(entry.file_name());
        if path.is_dir() {
            copy_dir(&path, &target);
        } else {
            std::fs::copy(&path, &target).unwrap_or_else(|e| {
                panic!("Failed to copy {} -> {}: {}", path.display(), target.display(), e)
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixtures_root_exists() {
        assert!(fixtures_root().exists(), "fixture data directory not found");
    }

    #[test]
    fn ingest_artifacts_exist() {
        let files = [
            "ingest/dev/job-001/graph_snapshot.json",
            "ingest/dev/job-001/alias_map.json",
            "ingest/dev/phb_chunks.json",
            "ingest/dev/enriched_lore.json",
            "golden/gate_cases.json",
        ];
        for f in &files {
            assert!(fixture_exists(f), "Missing fixture: {}", f);
        }
    }

    #[test]
    fn graph_snapshot_parses_as_json() {
        let snapshot: serde_json::Value = load_fixture("ingest/dev/job-001/graph_snapshot.json");
        assert_eq!(snapshot["job_id"], FIXTURE_JOB_ID);
        assert!(snapshot["nodes"].as_object().is_some_and(|n| !n.is_empty()));
    }

    #[test]
    fn stage_copies_the_whole_tree() {
        let dir = tempfile::tempdir().unwrap();
        let root = stage_ingest_tree(dir.path());
        assert!(root.join("dev/job-001/graph_snapshot.json").exists());
        assert!(root.join("dev/phb_chunks.json").exists());
    }
}
