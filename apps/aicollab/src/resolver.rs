//! Canonical metrics resolver.
//!
//! Several tools report overlapping numbers (three of them count functions).
//! `METRIC_TABLE` declares, once, where each canonical metric may come from
//! and in which order. Resolution is strict first-match:
//!
//! - tiers are scanned in loader order (in-run, stored, central, legacy), so
//!   a value computed in the current pass always beats anything on disk;
//! - within a tier, candidates are tried in table order;
//! - each tool is consulted only at the tier its loader answered from;
//! - a candidate must be present, type-correct and plausible to be accepted;
//! - nothing accepted anywhere gives `MetricValue::Unknown`.
//!
//! No state is kept between calls; each renderer resolves on its own.

use crate::config::Thresholds;
use crate::context::AggregationContext;
use crate::loader::{LoadTier, Loaded, ToolResultLoader};
use crate::models::metrics::{CanonicalMetrics, MetricValue};
use crate::models::ResultRecord;
use serde::Serialize;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Plausibility {
    Any,
    /// Must exceed `thresholds.registry_floor`.
    AboveRegistryFloor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Which count a ratio source reports in its numerator.
pub enum Numerator {
    Covered,
    /// covered = denominator - numerator
    Uncovered,
}

#[derive(Debug, Clone, Copy)]
pub enum Source {
    /// Integer at `path` in the tool's details.
    Field {
        tool: &'static str,
        path: &'static str,
        check: Plausibility,
    },
    /// The tool's `summary.total_issues`.
    Issues { tool: &'static str },
    /// Percentage reported directly by the tool.
    Percent { tool: &'static str, path: &'static str },
    /// Percentage derived from two counts of the same tool.
    Ratio {
        tool: &'static str,
        numerator: &'static str,
        denominator: &'static str,
        kind: Numerator,
    },
}

impl Source {
    pub fn tool(&self) -> &'static str {
        match *self {
            Source::Field { tool, .. }
            | Source::Issues { tool }
            | Source::Percent { tool, .. }
            | Source::Ratio { tool, .. } => tool,
        }
    }
}

pub struct MetricSpec {
    pub name: &'static str,
    pub sources: &'static [Source],
}

pub const TOTAL_FUNCTIONS: &str = "total_functions";
pub const HIGH_COMPLEXITY: &str = "high_complexity";
pub const MODERATE_COMPLEXITY: &str = "moderate_complexity";
pub const UNDOCUMENTED_FUNCTIONS: &str = "undocumented_functions";
pub const DOC_COVERAGE: &str = "doc_coverage";
pub const ERROR_HANDLING_COVERAGE: &str = "error_handling_coverage";
pub const TEST_COVERAGE: &str = "test_coverage";
pub const UNUSED_IMPORTS: &str = "unused_imports";
pub const DOC_DRIFT_ISSUES: &str = "doc_drift_issues";

pub const METRIC_TABLE: &[MetricSpec] = &[
    MetricSpec {
        name: TOTAL_FUNCTIONS,
        sources: &[
            Source::Field {
                tool: "analyze_functions",
                path: "total_functions",
                check: Plausibility::Any,
            },
            Source::Field {
                tool: "decision_support",
                path: "function_metrics.total_functions",
                check: Plausibility::Any,
            },
            Source::Field {
                tool: "analyze_function_registry",
                path: "total_functions",
                check: Plausibility::AboveRegistryFloor,
            },
        ],
    },
    MetricSpec {
        name: HIGH_COMPLEXITY,
        sources: &[
            Source::Field {
                tool: "analyze_functions",
                path: "complexity.high",
                check: Plausibility::Any,
            },
            Source::Field {
                tool: "decision_support",
                path: "function_metrics.high_complexity",
                check: Plausibility::Any,
            },
        ],
    },
    MetricSpec {
        name: MODERATE_COMPLEXITY,
        sources: &[
            Source::Field {
                tool: "analyze_functions",
                path: "complexity.moderate",
                check: Plausibility::Any,
            },
            Source::Field {
                tool: "decision_support",
                path: "function_metrics.moderate_complexity",
                check: Plausibility::Any,
            },
        ],
    },
    MetricSpec {
        name: UNDOCUMENTED_FUNCTIONS,
        sources: &[
            Source::Field {
                tool: "analyze_functions",
                path: "undocumented",
                check: Plausibility::Any,
            },
            Source::Field {
                tool: "check_docstrings",
                path: "missing_docstrings",
                check: Plausibility::Any,
            },
        ],
    },
    MetricSpec {
        name: DOC_COVERAGE,
        sources: &[
            Source::Ratio {
                tool: "analyze_functions",
                numerator: "undocumented",
                denominator: "total_functions",
                kind: Numerator::Uncovered,
            },
            Source::Ratio {
                tool: "check_docstrings",
                numerator: "documented",
                denominator: "total_items",
                kind: Numerator::Covered,
            },
        ],
    },
    MetricSpec {
        name: ERROR_HANDLING_COVERAGE,
        sources: &[Source::Ratio {
            tool: "error_handling",
            numerator: "functions_with_handling",
            denominator: "total_functions",
            kind: Numerator::Covered,
        }],
    },
    MetricSpec {
        name: TEST_COVERAGE,
        sources: &[Source::Percent {
            tool: "test_coverage",
            path: "coverage_percent",
        }],
    },
    MetricSpec {
        name: UNUSED_IMPORTS,
        sources: &[
            Source::Field {
                tool: "unused_imports",
                path: "obvious_unused",
                check: Plausibility::Any,
            },
            Source::Issues {
                tool: "unused_imports",
            },
        ],
    },
    MetricSpec {
        name: DOC_DRIFT_ISSUES,
        sources: &[Source::Issues { tool: "doc_drift" }],
    },
];

#[derive(Debug, Clone, PartialEq, Serialize)]
/// A resolved metric together with where it came from.
pub struct Resolution {
    pub name: &'static str,
    pub value: MetricValue,
    pub tool: Option<&'static str>,
    pub tier: Option<LoadTier>,
}

/// Percentage `covered / total * 100`, or `None` when the inputs are
/// degenerate or the result leaves `[0, 100]`.
pub fn coverage_percent(covered: u64, total: u64) -> Option<f64> {
    if total == 0 {
        return None;
    }
    let pct = covered as f64 / total as f64 * 100.0;
    if (0.0..=100.0).contains(&pct) {
        Some(pct)
    } else {
        None
    }
}

/// Evaluate one candidate against one record.
pub fn evaluate(source: &Source, rec: &ResultRecord, th: &Thresholds) -> Option<MetricValue> {
    match *source {
        Source::Field { path, check, .. } => {
            let v = rec.detail_u64(path)?;
            match check {
                Plausibility::Any => Some(MetricValue::Count(v)),
                Plausibility::AboveRegistryFloor if v > th.registry_floor => {
                    Some(MetricValue::Count(v))
                }
                Plausibility::AboveRegistryFloor => {
                    tracing::debug!(value = v, floor = th.registry_floor, "registry total below plausibility floor");
                    None
                }
            }
        }
        Source::Issues { .. } => Some(MetricValue::Count(rec.summary.total_issues)),
        Source::Percent { path, .. } => {
            let p = rec.detail_f64(path)?;
            (0.0..=100.0).contains(&p).then_some(MetricValue::Percent(p))
        }
        Source::Ratio {
            numerator,
            denominator,
            kind,
            ..
        } => {
            let num = rec.detail_u64(numerator)?;
            let total = rec.detail_u64(denominator)?;
            let covered = match kind {
                Numerator::Covered => num,
                Numerator::Uncovered => total.checked_sub(num)?,
            };
            coverage_percent(covered, total).map(MetricValue::Percent)
        }
    }
}

/// Per-call memo of each tool's answering tier.
///
/// A tool is visible only at the tier that answered for it; its lower tiers
/// never fill fields the winning record lacks.
struct TierView<'l, 'c> {
    loader: &'l ToolResultLoader<'c>,
    seen: HashMap<&'static str, Loaded>,
}

impl<'l, 'c> TierView<'l, 'c> {
    fn record(&mut self, tool: &'static str, tier: LoadTier) -> Option<&ResultRecord> {
        let loader = self.loader;
        let loaded = self
            .seen
            .entry(tool)
            .or_insert_with(|| loader.load_with_origin(tool, None));
        (loaded.origin == Some(tier)).then_some(&loaded.record)
    }
}

fn resolve_spec(spec: &MetricSpec, view: &mut TierView<'_, '_>, th: &Thresholds) -> Resolution {
    for tier in LoadTier::ORDER {
        for source in spec.sources {
            let Some(rec) = view.record(source.tool(), tier) else {
                continue;
            };
            if let Some(value) = evaluate(source, rec, th) {
                return Resolution {
                    name: spec.name,
                    value,
                    tool: Some(source.tool()),
                    tier: Some(tier),
                };
            }
        }
    }
    Resolution {
        name: spec.name,
        value: MetricValue::Unknown,
        tool: None,
        tier: None,
    }
}

/// Resolve every canonical metric with its provenance, in table order.
pub fn resolve_detailed(ctx: &AggregationContext) -> Vec<Resolution> {
    let loader = ToolResultLoader::new(ctx);
    let mut view = TierView {
        loader: &loader,
        seen: HashMap::new(),
    };
    let th = &ctx.settings.thresholds;
    METRIC_TABLE
        .iter()
        .map(|spec| resolve_spec(spec, &mut view, th))
        .collect()
}

pub fn resolve_metrics(ctx: &AggregationContext) -> CanonicalMetrics {
    let mut out = CanonicalMetrics::default();
    for r in resolve_detailed(ctx) {
        out.insert(r.name, r.value);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::models::tier::AuditTier;
    use serde_json::json;
    use std::fs;
    use std::path::Path;
    use tempfile::tempdir;

    fn record(details: serde_json::Value) -> ResultRecord {
        crate::normalize::normalize(
            "t",
            &json!({"summary": {"total_issues": 0, "files_affected": 0}, "details": details}),
        )
        .unwrap()
    }

    fn store(root: &Path, domain: &str, tool: &str, details: serde_json::Value) {
        let dir = root.join(".aicollab/results").join(domain).join(tool);
        fs::create_dir_all(&dir).unwrap();
        fs::write(
            dir.join("latest.json"),
            json!({"summary": {"total_issues": 0, "files_affected": 0}, "details": details})
                .to_string(),
        )
        .unwrap();
    }

    #[test]
    fn test_percentage_outside_range_is_rejected() {
        let th = Thresholds::default();
        let src = Source::Ratio {
            tool: "check_docstrings",
            numerator: "documented",
            denominator: "total_items",
            kind: Numerator::Covered,
        };
        let corrupt = record(json!({"documented": 150, "total_items": 100}));
        assert_eq!(evaluate(&src, &corrupt, &th), None);
        let zero = record(json!({"documented": 0, "total_items": 0}));
        assert_eq!(evaluate(&src, &zero, &th), None);
        let ok = record(json!({"documented": 45, "total_items": 50}));
        assert_eq!(evaluate(&src, &ok, &th), Some(MetricValue::Percent(90.0)));
    }

    #[test]
    fn test_uncovered_numerator_larger_than_total_is_rejected() {
        let th = Thresholds::default();
        let src = METRIC_TABLE
            .iter()
            .find(|m| m.name == DOC_COVERAGE)
            .unwrap()
            .sources[0];
        let rec = record(json!({"undocumented": 10, "total_functions": 5}));
        assert_eq!(evaluate(&src, &rec, &th), None);
    }

    #[test]
    fn test_registry_floor_applies() {
        let mut th = Thresholds::default();
        let src = Source::Field {
            tool: "analyze_function_registry",
            path: "total_functions",
            check: Plausibility::AboveRegistryFloor,
        };
        assert_eq!(evaluate(&src, &record(json!({"total_functions": 3})), &th), None);
        assert_eq!(evaluate(&src, &record(json!({"total_functions": 100})), &th), None);
        assert_eq!(
            evaluate(&src, &record(json!({"total_functions": 101})), &th),
            Some(MetricValue::Count(101))
        );
        th.registry_floor = 2;
        assert_eq!(
            evaluate(&src, &record(json!({"total_functions": 3})), &th),
            Some(MetricValue::Count(3))
        );
    }

    #[test]
    fn test_direct_percent_range_checked() {
        let th = Thresholds::default();
        let src = Source::Percent {
            tool: "test_coverage",
            path: "coverage_percent",
        };
        assert_eq!(
            evaluate(&src, &record(json!({"coverage_percent": 72.5})), &th),
            Some(MetricValue::Percent(72.5))
        );
        assert_eq!(evaluate(&src, &record(json!({"coverage_percent": 140.0})), &th), None);
    }

    #[test]
    fn test_first_match_and_fallback_to_lower_priority() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        store(
            root,
            "decisions",
            "decision_support",
            json!({"function_metrics": {"total_functions": 420, "high_complexity": 7}}),
        );
        store(root, "functions", "analyze_function_registry", json!({"total_functions": 999}));
        let ctx = AggregationContext::new(root.to_path_buf(), AuditTier::Full, Settings::default());
        let resolved = resolve_detailed(&ctx);
        let total = resolved.iter().find(|r| r.name == TOTAL_FUNCTIONS).unwrap();
        assert_eq!(total.value, MetricValue::Count(420));
        assert_eq!(total.tool, Some("decision_support"));
        assert_eq!(total.tier, Some(LoadTier::Stored));
        let metrics = resolve_metrics(&ctx);
        assert_eq!(metrics.count(HIGH_COMPLEXITY), Some(7));
        assert!(metrics.get(DOC_COVERAGE).is_unknown());
        assert!(metrics.get(TEST_COVERAGE).is_unknown());
    }

    #[test]
    fn test_in_run_value_beats_stored_value() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        store(root, "functions", "analyze_functions", json!({"total_functions": 200}));
        let mut ctx =
            AggregationContext::new(root.to_path_buf(), AuditTier::Full, Settings::default());
        ctx.run_cache
            .record(
                "decision_support",
                &json!({
                    "summary": {"total_issues": 0, "files_affected": 0},
                    "details": {"function_metrics": {"total_functions": 150}}
                }),
            )
            .unwrap();
        let metrics = resolve_metrics(&ctx);
        assert_eq!(metrics.count(TOTAL_FUNCTIONS), Some(150));
    }

    #[test]
    fn test_fresh_tool_never_falls_back_to_its_stored_fields() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        store(
            root,
            "functions",
            "analyze_functions",
            json!({"total_functions": 900, "complexity": {"high": 77}}),
        );
        let mut ctx =
            AggregationContext::new(root.to_path_buf(), AuditTier::Full, Settings::default());
        ctx.run_cache
            .record(
                "analyze_functions",
                &json!({
                    "summary": {"total_issues": 0, "files_affected": 0},
                    "details": {"total_functions": 500}
                }),
            )
            .unwrap();
        let resolved = resolve_detailed(&ctx);
        let total = resolved.iter().find(|r| r.name == TOTAL_FUNCTIONS).unwrap();
        assert_eq!(total.value, MetricValue::Count(500));
        assert_eq!(total.tier, Some(LoadTier::InRun));
        let high = resolved.iter().find(|r| r.name == HIGH_COMPLEXITY).unwrap();
        assert!(high.value.is_unknown());
        assert_eq!(high.tool, None);
    }
}
