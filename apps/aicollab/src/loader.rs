//! Tool result loader: resolves the single best available result for a tool
//! by walking the storage tiers in order.
//!
//! 1. in-run cache (only tools that ran in this pass)
//! 2. standardized per-tool storage (`latest.json`, else newest archive)
//! 3. central aggregation file (skipped inside disposable directories)
//! 4. tool-specific legacy cache
//!
//! The first tier that yields a valid record wins; tiers are never merged.
//! Unreadable or malformed files are logged and treated as a miss, so the
//! caller always gets a record (empty when nothing exists).

use crate::context::AggregationContext;
use crate::models::{ResultRecord, ToolIdentity};
use crate::normalize::normalize;
use crate::storage::{self, StorageLayout};
use serde::Serialize;
use serde_json::Value as Json;
use std::cell::OnceCell;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadTier {
    InRun,
    Stored,
    Central,
    Legacy,
}

impl LoadTier {
    pub const ORDER: [LoadTier; 4] = [
        LoadTier::InRun,
        LoadTier::Stored,
        LoadTier::Central,
        LoadTier::Legacy,
    ];

    pub fn label(self) -> &'static str {
        match self {
            LoadTier::InRun => "current run",
            LoadTier::Stored => "stored",
            LoadTier::Central => "central",
            LoadTier::Legacy => "legacy cache",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Loaded {
    pub record: ResultRecord,
    /// `None` when no tier had anything.
    pub origin: Option<LoadTier>,
}

pub struct ToolResultLoader<'a> {
    ctx: &'a AggregationContext,
    layout: StorageLayout,
    central_enabled: bool,
    central_doc: OnceCell<Option<Json>>,
}

impl<'a> ToolResultLoader<'a> {
    pub fn new(ctx: &'a AggregationContext) -> Self {
        let layout = StorageLayout::new(&ctx.project_root, &ctx.settings.storage);
        let central_enabled = ctx.settings.storage.central_in_temp
            || !storage::is_disposable_dir(&ctx.project_root);
        if !central_enabled {
            tracing::debug!(root = %ctx.project_root.display(), "central results disabled in disposable directory");
        }
        ToolResultLoader {
            ctx,
            layout,
            central_enabled,
            central_doc: OnceCell::new(),
        }
    }

    /// Best available record, or an empty one.
    pub fn load(&self, tool: &str, domain: Option<&str>) -> ResultRecord {
        self.load_with_origin(tool, domain).record
    }

    pub fn load_with_origin(&self, tool: &str, domain: Option<&str>) -> Loaded {
        for tier in LoadTier::ORDER {
            if let Some(record) = self.load_tier(tool, domain, tier) {
                tracing::debug!(tool, tier = tier.label(), "loaded tool result");
                return Loaded {
                    record,
                    origin: Some(tier),
                };
            }
        }
        tracing::debug!(tool, "no result at any tier");
        Loaded {
            record: ResultRecord::empty(),
            origin: None,
        }
    }

    /// Look at a single tier only.
    pub fn load_tier(&self, tool: &str, domain: Option<&str>, tier: LoadTier) -> Option<ResultRecord> {
        match tier {
            LoadTier::InRun => self.ctx.run_cache.get(tool).cloned(),
            LoadTier::Stored => {
                let id = ToolIdentity::resolve(tool, domain);
                self.from_storage(&id)
            }
            LoadTier::Central => self.from_central(tool),
            LoadTier::Legacy => {
                let path = self.layout.legacy_path(tool);
                read_record(tool, &path)
            }
        }
    }

    fn from_storage(&self, id: &ToolIdentity) -> Option<ResultRecord> {
        let latest = self.layout.latest_path(id);
        if latest.exists() {
            if let Some(rec) = read_record(&id.tool_name, &latest) {
                return Some(rec);
            }
        }
        let archived = self.layout.newest_archive(id)?;
        read_record(&id.tool_name, &archived)
    }

    fn from_central(&self, tool: &str) -> Option<ResultRecord> {
        if !self.central_enabled {
            return None;
        }
        let doc = self.central_doc.get_or_init(|| self.read_central()).as_ref()?;
        let entry = doc
            .get("tools")
            .and_then(Json::as_object)
            .and_then(|m| m.get(tool))
            .or_else(|| doc.get(tool))?;
        match normalize(tool, entry) {
            Ok(rec) => Some(rec),
            Err(e) => {
                tracing::warn!(tool, error = %e, "central entry rejected");
                None
            }
        }
    }

    fn read_central(&self) -> Option<Json> {
        let path = self.layout.central_path();
        let meta = fs::metadata(path).ok()?;
        let cap = self.ctx.settings.storage.central_max_bytes;
        if meta.len() > cap {
            tracing::warn!(path = %path.display(), size = meta.len(), cap, "central results file too large, skipping");
            return None;
        }
        match storage::read_json(path) {
            Ok(v) if v.is_object() => Some(v),
            Ok(_) => {
                tracing::warn!(path = %path.display(), "central results file is not an object");
                None
            }
            Err(e) => {
                tracing::warn!(error = %e, "central results file unreadable");
                None
            }
        }
    }
}

/// Read and normalize one stored file; any failure is a miss.
fn read_record(tool: &str, path: &Path) -> Option<ResultRecord> {
    if !path.exists() {
        return None;
    }
    let raw = match storage::read_json(path) {
        Ok(v) => v,
        Err(e) => {
            tracing::warn!(tool, error = %e, "stored result unreadable");
            return None;
        }
    };
    match normalize(tool, &raw) {
        Ok(rec) => Some(rec),
        Err(e) => {
            tracing::warn!(tool, path = %path.display(), error = %e, "stored result rejected");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::models::tier::AuditTier;
    use serde_json::json;
    use tempfile::tempdir;

    fn ctx(root: &Path) -> AggregationContext {
        let mut settings = Settings::default();
        settings.storage.central_in_temp = true;
        AggregationContext::new(root.to_path_buf(), AuditTier::Full, settings)
    }

    fn put(path: &Path, body: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, body).unwrap();
    }

    fn summary(n: u64) -> String {
        json!({"summary": {"total_issues": n, "files_affected": 1}}).to_string()
    }

    #[test]
    fn test_missing_everywhere_yields_empty_record() {
        let dir = tempdir().unwrap();
        let c = ctx(dir.path());
        let loaded = ToolResultLoader::new(&c).load_with_origin("nonexistent_tool", None);
        assert_eq!(loaded.origin, None);
        assert_eq!(loaded.record.summary.total_issues, 0);
        assert_eq!(loaded.record.summary.files_affected, 0);
        assert!(loaded.record.details.is_empty());
    }

    #[test]
    fn test_in_run_beats_storage() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        put(&root.join(".aicollab/results/imports/unused_imports/latest.json"), &summary(9));
        let mut c = ctx(root);
        c.run_cache
            .record("unused_imports", &json!({"summary": {"total_issues": 1, "files_affected": 1}}))
            .unwrap();
        let loaded = ToolResultLoader::new(&c).load_with_origin("unused_imports", None);
        assert_eq!(loaded.origin, Some(LoadTier::InRun));
        assert_eq!(loaded.record.summary.total_issues, 1);
    }

    #[test]
    fn test_stale_cache_entry_is_ignored() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        put(&root.join(".aicollab/results/imports/unused_imports/latest.json"), &summary(9));
        let mut c = ctx(root);
        c.run_cache.retain_stale("unused_imports", ResultRecord::empty());
        let loaded = ToolResultLoader::new(&c).load_with_origin("unused_imports", None);
        assert_eq!(loaded.origin, Some(LoadTier::Stored));
        assert_eq!(loaded.record.summary.total_issues, 9);
    }

    #[test]
    fn test_malformed_storage_falls_through_to_central() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        put(&root.join(".aicollab/results/docs/doc_drift/latest.json"), "{not json");
        put(
            &root.join(".aicollab/results/all_results.json"),
            &json!({"tools": {"doc_drift": {"summary": {"total_issues": 4, "files_affected": 2}}}})
                .to_string(),
        );
        let c = ctx(root);
        let loaded = ToolResultLoader::new(&c).load_with_origin("doc_drift", None);
        assert_eq!(loaded.origin, Some(LoadTier::Central));
        assert_eq!(loaded.record.summary.total_issues, 4);
    }

    #[test]
    fn test_central_top_level_index_and_legacy_fallback() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        put(
            &root.join(".aicollab/results/all_results.json"),
            &json!({"error_handling": {"summary": {"total_issues": 2, "files_affected": 2}}})
                .to_string(),
        );
        put(
            &root.join(".aicollab/cache/check_docstrings_cache.json"),
            &json!({"file_mtimes": {}, "data": {"summary": {"total_issues": 7, "files_affected": 3}}})
                .to_string(),
        );
        let c = ctx(root);
        let loader = ToolResultLoader::new(&c);
        assert_eq!(loader.load("error_handling", None).summary.total_issues, 2);
        let legacy = loader.load_with_origin("check_docstrings", None);
        assert_eq!(legacy.origin, Some(LoadTier::Legacy));
        assert_eq!(legacy.record.summary.total_issues, 7);
    }

    #[test]
    fn test_central_skipped_in_disposable_dir_by_default() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        put(
            &root.join(".aicollab/results/all_results.json"),
            &json!({"doc_drift": {"summary": {"total_issues": 4, "files_affected": 2}}}).to_string(),
        );
        let c = AggregationContext::new(root.to_path_buf(), AuditTier::Full, Settings::default());
        let loaded = ToolResultLoader::new(&c).load_with_origin("doc_drift", None);
        assert_eq!(loaded.origin, None);
    }

    #[test]
    fn test_archive_used_when_latest_missing() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        let tool_dir = root.join(".aicollab/results/tests/test_coverage");
        put(&tool_dir.join("20250101T000000Z.json"), &summary(1));
        put(&tool_dir.join("20250102T000000Z.json"), &summary(2));
        let c = ctx(root);
        let rec = ToolResultLoader::new(&c).load("test_coverage", None);
        assert_eq!(rec.summary.total_issues, 2);
    }

    #[test]
    fn test_explicit_domain_overrides_inference() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        put(&root.join(".aicollab/results/custom/unused_imports/latest.json"), &summary(5));
        let c = ctx(root);
        let loader = ToolResultLoader::new(&c);
        assert_eq!(loader.load("unused_imports", Some("custom")).summary.total_issues, 5);
        assert_eq!(loader.load("unused_imports", None).summary.total_issues, 0);
    }
}
