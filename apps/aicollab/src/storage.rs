//! On-disk layout of stored tool results.
//!
//! ```text
//! <root>/<results_dir>/<domain>/<tool>/latest.json
//! <root>/<results_dir>/<domain>/<tool>/<YYYYmmddTHHMMSSZ>.json   (archive)
//! <root>/<results_dir>/<central_file>
//! <root>/<cache_dir>/<tool>_cache.json                            (legacy)
//! ```

use crate::config::StorageSettings;
use crate::error::StorageError;
use crate::models::{ResultRecord, StoredResult, ToolIdentity};
use chrono::{DateTime, Utc};
use serde_json::Value as Json;
use std::fs;
use std::path::{Component, Path, PathBuf};

pub const LATEST_FILE: &str = "latest.json";

#[derive(Debug, Clone)]
pub struct StorageLayout {
    results_dir: PathBuf,
    cache_dir: PathBuf,
    central_file: PathBuf,
}

impl StorageLayout {
    pub fn new(project_root: &Path, st: &StorageSettings) -> Self {
        let results_dir = project_root.join(&st.results_dir);
        StorageLayout {
            central_file: results_dir.join(&st.central_file),
            cache_dir: project_root.join(&st.cache_dir),
            results_dir,
        }
    }

    pub fn tool_dir(&self, id: &ToolIdentity) -> PathBuf {
        self.results_dir.join(&id.domain).join(&id.tool_name)
    }

    pub fn latest_path(&self, id: &ToolIdentity) -> PathBuf {
        self.tool_dir(id).join(LATEST_FILE)
    }

    pub fn central_path(&self) -> &Path {
        &self.central_file
    }

    pub fn legacy_path(&self, tool: &str) -> PathBuf {
        self.cache_dir.join(format!("{}_cache.json", tool))
    }

    /// Newest archived result for a tool, by file name.
    ///
    /// Archive names embed a sortable timestamp, so the lexicographically
    /// greatest name is the most recent.
    pub fn newest_archive(&self, id: &ToolIdentity) -> Option<PathBuf> {
        let dir = glob::Pattern::escape(&self.tool_dir(id).to_string_lossy());
        let pattern = Path::new(&dir).join("*.json");
        let mut found: Vec<PathBuf> = glob::glob(&pattern.to_string_lossy())
            .ok()?
            .flatten()
            .filter(|p| p.file_name().map(|n| n != LATEST_FILE).unwrap_or(false))
            .collect();
        found.sort();
        found.pop()
    }
}

/// Whether `path` looks like a throwaway test or scratch directory.
pub fn is_disposable_dir(path: &Path) -> bool {
    let tmp = std::env::temp_dir();
    let canon_tmp = tmp.canonicalize().unwrap_or(tmp);
    let canon = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
    if canon.starts_with(&canon_tmp) {
        return true;
    }
    canon.components().any(|c| match c {
        Component::Normal(os) => {
            let s = os.to_string_lossy();
            s == "tmp" || s.starts_with("pytest-") || s.starts_with(".tmp")
        }
        _ => false,
    })
}

pub fn read_json(path: &Path) -> Result<Json, StorageError> {
    let s = fs::read_to_string(path).map_err(|source| StorageError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&s).map_err(|source| StorageError::Json {
        path: path.to_path_buf(),
        source,
    })
}

fn write_json(path: &Path, value: &StoredResult) -> Result<(), StorageError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|source| StorageError::Write {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    let body = serde_json::to_string_pretty(value).map_err(|source| StorageError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    fs::write(path, body).map_err(|source| StorageError::Write {
        path: path.to_path_buf(),
        source,
    })
}

/// Persist a record as the tool's latest result plus a timestamped archive
/// copy. Returns the path of `latest.json`.
pub fn store_result(
    layout: &StorageLayout,
    id: &ToolIdentity,
    record: &ResultRecord,
    generated_by: &str,
    source: Option<&str>,
    at: DateTime<Utc>,
) -> Result<PathBuf, StorageError> {
    let mut stored = StoredResult::from_record(record, generated_by, &at.to_rfc3339());
    stored.source = source.map(|s| s.to_string());
    let latest = layout.latest_path(id);
    write_json(&latest, &stored)?;
    let archive = layout
        .tool_dir(id)
        .join(format!("{}.json", at.format("%Y%m%dT%H%M%SZ")));
    write_json(&archive, &stored)?;
    tracing::debug!(tool = %id.tool_name, domain = %id.domain, path = %latest.display(), "stored result");
    Ok(latest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::tempdir;

    #[test]
    fn test_store_writes_latest_and_archive() {
        let dir = tempdir().unwrap();
        let layout = StorageLayout::new(dir.path(), &StorageSettings::default());
        let id = ToolIdentity::infer("unused_imports");
        let at = Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap();
        let latest = store_result(&layout, &id, &ResultRecord::empty(), "test", None, at).unwrap();
        assert!(latest.ends_with(".aicollab/results/imports/unused_imports/latest.json"));
        let archive = layout.newest_archive(&id).unwrap();
        assert!(archive.ends_with("20260102T030405Z.json"));
        let v = read_json(&latest).unwrap();
        assert_eq!(v["generated_by"], "test");
        assert_eq!(v["summary"]["total_issues"], 0);
    }

    #[test]
    fn test_newest_archive_with_glob_metacharacters_in_root() {
        let dir = tempdir().unwrap();
        let root = dir.path().join("proj[1]*?");
        let layout = StorageLayout::new(&root, &StorageSettings::default());
        let id = ToolIdentity::infer("doc_drift");
        let tool_dir = layout.tool_dir(&id);
        fs::create_dir_all(&tool_dir).unwrap();
        fs::write(tool_dir.join("20250101T000000Z.json"), "{}").unwrap();
        fs::write(tool_dir.join(LATEST_FILE), "{}").unwrap();
        let newest = layout.newest_archive(&id).unwrap();
        assert!(newest.ends_with("20250101T000000Z.json"));
    }

    #[test]
    fn test_newest_archive_picks_greatest_name() {
        let dir = tempdir().unwrap();
        let layout = StorageLayout::new(dir.path(), &StorageSettings::default());
        let id = ToolIdentity::infer("doc_drift");
        let tool_dir = layout.tool_dir(&id);
        fs::create_dir_all(&tool_dir).unwrap();
        for name in ["20250101T000000Z.json", "20250301T000000Z.json", "20250201T000000Z.json"] {
            fs::write(tool_dir.join(name), "{}").unwrap();
        }
        let newest = layout.newest_archive(&id).unwrap();
        assert!(newest.ends_with("20250301T000000Z.json"));
    }

    #[test]
    fn test_disposable_dir_detection() {
        let dir = tempdir().unwrap();
        assert!(is_disposable_dir(dir.path()));
        assert!(is_disposable_dir(Path::new("/home/u/pytest-of-u/pytest-3/proj")));
        assert!(!is_disposable_dir(Path::new("/home/u/projects/app")));
    }
}
