//! Configuration discovery and effective settings resolution.
//!
//! aicollab reads `aicollab.toml|yaml|yml` from the project root (or closest
//! ancestor) and merges it with CLI flags to produce an `Effective` config.
//! Defaults:
//! - `output`: `human`
//! - `audit_tier`: `standard`
//! - `out_dir`: project root
//! - `storage.results_dir`: `.aicollab/results`
//! - `storage.cache_dir`: `.aicollab/cache`
//! - `storage.central_file`: `all_results.json` (inside `results_dir`)
//! - `thresholds.registry_floor`: 100
//!
//! Overrides precedence: CLI > config file > defaults.

use crate::models::tier::AuditTier;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Default, Deserialize, Clone)]
/// Storage layout section under `[storage]`.
pub struct StorageCfg {
    pub results_dir: Option<String>,
    pub cache_dir: Option<String>,
    pub central_file: Option<String>,
    /// Read the central file even when the project lives in a temp directory.
    pub central_in_temp: Option<bool>,
    pub central_max_bytes: Option<u64>,
}

#[derive(Debug, Default, Deserialize, Clone)]
/// Rule thresholds under `[thresholds]`.
pub struct ThresholdsCfg {
    pub registry_floor: Option<u64>,
    pub unused_imports_critical: Option<u64>,
    pub unused_imports_quick_win: Option<u64>,
    pub doc_coverage_target: Option<f64>,
    pub test_coverage_target: Option<f64>,
    pub moderate_complexity_watch: Option<u64>,
    pub examples_limit: Option<usize>,
    pub recommendations_limit: Option<usize>,
}

#[derive(Debug, Default, Deserialize, Clone)]
/// Plausibility hint for one rule (`[hints.<rule>]`).
pub struct HintCfg {
    pub expected_minimum: Option<u64>,
}

#[derive(Debug, Default, Deserialize, Clone)]
/// Root configuration loaded from `aicollab.toml|yaml`.
pub struct CollabConfig {
    pub output: Option<String>,
    pub audit_tier: Option<String>,
    pub out_dir: Option<String>,
    #[serde(default)]
    pub storage: Option<StorageCfg>,
    #[serde(default)]
    pub thresholds: Option<ThresholdsCfg>,
    #[serde(default)]
    pub hints: Option<HashMap<String, HintCfg>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StorageSettings {
    pub results_dir: String,
    pub cache_dir: String,
    pub central_file: String,
    pub central_in_temp: bool,
    pub central_max_bytes: u64,
}

impl Default for StorageSettings {
    fn default() -> Self {
        StorageSettings {
            results_dir: ".aicollab/results".to_string(),
            cache_dir: ".aicollab/cache".to_string(),
            central_file: "all_results.json".to_string(),
            central_in_temp: false,
            central_max_bytes: 32 * 1024 * 1024,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Thresholds {
    /// Registry totals at or below this are treated as degenerate.
    pub registry_floor: u64,
    pub unused_imports_critical: u64,
    pub unused_imports_quick_win: u64,
    pub doc_coverage_target: f64,
    pub test_coverage_target: f64,
    pub moderate_complexity_watch: u64,
    pub examples_limit: usize,
    pub recommendations_limit: usize,
}

impl Default for Thresholds {
    fn default() -> Self {
        Thresholds {
            registry_floor: 100,
            unused_imports_critical: 50,
            unused_imports_quick_win: 10,
            doc_coverage_target: 80.0,
            test_coverage_target: 80.0,
            moderate_complexity_watch: 25,
            examples_limit: 5,
            recommendations_limit: 5,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
/// Settings consumed by the aggregation core.
pub struct Settings {
    pub storage: StorageSettings,
    pub thresholds: Thresholds,
    /// rule id -> expected minimum count
    pub hints: HashMap<String, u64>,
}

#[derive(Debug, Clone)]
/// Fully-resolved configuration used by commands after applying precedence.
pub struct Effective {
    pub project_root: PathBuf,
    pub output: String,
    pub audit_tier: AuditTier,
    pub out_dir: PathBuf,
    pub settings: Settings,
}

const CONFIG_NAMES: [&str; 3] = ["aicollab.toml", "aicollab.yaml", "aicollab.yml"];

/// Walk upward from `start` to detect the project root.
///
/// Stops when an `aicollab.toml|yaml|yml` or a `.git` directory is found.
pub fn detect_project_root(start: &Path) -> PathBuf {
    let mut cur = start;
    loop {
        if CONFIG_NAMES.iter().any(|n| cur.join(n).exists()) || cur.join(".git").exists() {
            return cur.to_path_buf();
        }
        match cur.parent() {
            Some(p) => cur = p,
            None => return start.to_path_buf(),
        }
    }
}

/// Load `CollabConfig` from `aicollab.toml` or `aicollab.yaml|yml` if present.
///
/// A config file that fails to parse is reported and ignored.
pub fn load_config(root: &Path) -> Option<CollabConfig> {
    let toml_path = root.join("aicollab.toml");
    if toml_path.exists() {
        let s = fs::read_to_string(&toml_path).ok()?;
        return match toml::from_str::<CollabConfig>(&s) {
            Ok(cfg) => Some(cfg),
            Err(e) => {
                tracing::warn!(path = %toml_path.display(), error = %e, "ignoring invalid config");
                None
            }
        };
    }
    for yml in ["aicollab.yaml", "aicollab.yml"] {
        let p = root.join(yml);
        if p.exists() {
            let s = fs::read_to_string(&p).ok()?;
            return match serde_yaml::from_str::<CollabConfig>(&s) {
                Ok(cfg) => Some(cfg),
                Err(e) => {
                    tracing::warn!(path = %p.display(), error = %e, "ignoring invalid config");
                    None
                }
            };
        }
    }
    None
}

fn resolve_settings(cfg: &CollabConfig) -> Settings {
    let sd = StorageSettings::default();
    let st = cfg.storage.clone().unwrap_or_default();
    let storage = StorageSettings {
        results_dir: st.results_dir.unwrap_or(sd.results_dir),
        cache_dir: st.cache_dir.unwrap_or(sd.cache_dir),
        central_file: st.central_file.unwrap_or(sd.central_file),
        central_in_temp: st.central_in_temp.unwrap_or(sd.central_in_temp),
        central_max_bytes: st.central_max_bytes.unwrap_or(sd.central_max_bytes),
    };

    let td = Thresholds::default();
    let th = cfg.thresholds.clone().unwrap_or_default();
    let thresholds = Thresholds {
        registry_floor: th.registry_floor.unwrap_or(td.registry_floor),
        unused_imports_critical: th
            .unused_imports_critical
            .unwrap_or(td.unused_imports_critical),
        unused_imports_quick_win: th
            .unused_imports_quick_win
            .unwrap_or(td.unused_imports_quick_win),
        doc_coverage_target: th.doc_coverage_target.unwrap_or(td.doc_coverage_target),
        test_coverage_target: th.test_coverage_target.unwrap_or(td.test_coverage_target),
        moderate_complexity_watch: th
            .moderate_complexity_watch
            .unwrap_or(td.moderate_complexity_watch),
        examples_limit: th.examples_limit.unwrap_or(td.examples_limit),
        recommendations_limit: th.recommendations_limit.unwrap_or(td.recommendations_limit),
    };

    let hints = cfg
        .hints
        .clone()
        .unwrap_or_default()
        .into_iter()
        .filter_map(|(rule, h)| h.expected_minimum.map(|m| (rule, m)))
        .collect::<HashMap<_, _>>();

    Settings {
        storage,
        thresholds,
        hints,
    }
}

/// Resolve `Effective` by merging CLI flags, discovered config, and defaults.
///
/// An unrecognized audit tier (CLI or config) falls back to `standard` with a
/// warning.
pub fn resolve_effective(
    cli_project_root: Option<&str>,
    cli_output: Option<&str>,
    cli_audit_tier: Option<&str>,
    cli_out_dir: Option<&str>,
) -> Effective {
    let start = PathBuf::from(cli_project_root.unwrap_or("."));
    let project_root = detect_project_root(&start);
    let cfg = load_config(&project_root).unwrap_or_default();

    let output = cli_output
        .map(|s| s.to_string())
        .or(cfg.output.clone())
        .unwrap_or_else(|| "human".to_string());

    let tier_src = cli_audit_tier
        .map(|s| s.to_string())
        .or(cfg.audit_tier.clone());
    let audit_tier = match tier_src.as_deref() {
        Some(s) => AuditTier::parse(s).unwrap_or_else(|| {
            tracing::warn!(value = s, "unknown audit tier, using standard");
            AuditTier::Standard
        }),
        None => AuditTier::default(),
    };

    let out_dir = cli_out_dir
        .map(|s| s.to_string())
        .or(cfg.out_dir.clone())
        .map(|d| {
            let p = PathBuf::from(d);
            if p.is_absolute() {
                p
            } else {
                project_root.join(p)
            }
        })
        .unwrap_or_else(|| project_root.clone());

    let settings = resolve_settings(&cfg);

    Effective {
        project_root,
        output,
        audit_tier,
        out_dir,
        settings,
    }
}
