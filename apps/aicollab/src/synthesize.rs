//! Priority synthesis: turns resolved metrics and tool issue lists into a
//! ranked list of action items plus quick wins and a watch list.
//!
//! Rules run in a fixed sequence and each proposes at most one outcome.
//! Ranked items get `insertion_order` from a per-tier counter at emission
//! time and are sorted by `tier * 100 + insertion_order`, so tiers never
//! interleave and ties follow rule order.

use crate::config::Thresholds;
use crate::context::AggregationContext;
use crate::dedup::dedupe;
use crate::loader::ToolResultLoader;
use crate::models::metrics::CanonicalMetrics;
use crate::models::priority::{Effort, ItemDraft, PriorityItem, QuickWin, Synthesis, WatchItem};
use crate::models::tier::PriorityTier;
use crate::models::ResultRecord;
use crate::resolver::{
    DOC_COVERAGE, DOC_DRIFT_ISSUES, ERROR_HANDLING_COVERAGE, HIGH_COMPLEXITY, MODERATE_COMPLEXITY,
    TEST_COVERAGE, UNDOCUMENTED_FUNCTIONS, UNUSED_IMPORTS,
};
use serde_json::Value as Json;
use std::collections::HashMap;

/// Read-only view handed to every rule.
pub struct RuleInput<'a> {
    pub metrics: &'a CanonicalMetrics,
    pub loader: &'a ToolResultLoader<'a>,
    pub thresholds: &'a Thresholds,
}

impl RuleInput<'_> {
    fn tool(&self, name: &str) -> ResultRecord {
        self.loader.load(name, None)
    }

    fn examples(&self, sources: &[(&str, &str)]) -> Vec<String> {
        for (tool, path) in sources {
            let rec = self.tool(tool);
            if let Some(list) = rec.detail_list(path) {
                let out = format_examples(list, self.thresholds.examples_limit);
                if !out.is_empty() {
                    return out;
                }
            }
        }
        Vec::new()
    }
}

pub enum Outcome {
    Item {
        tier: PriorityTier,
        draft: ItemDraft,
        /// Magnitude checked against the rule's expected-minimum hint.
        count: Option<u64>,
    },
    QuickWin(QuickWin),
    Watch(WatchItem),
    Skip,
}

pub struct Rule {
    pub id: &'static str,
    pub eval: fn(&RuleInput<'_>) -> Outcome,
}

pub const RULES: &[Rule] = &[
    Rule {
        id: "error_handling",
        eval: rule_error_handling,
    },
    Rule {
        id: "unused_imports",
        eval: rule_unused_imports,
    },
    Rule {
        id: "high_complexity",
        eval: rule_high_complexity,
    },
    Rule {
        id: "missing_docstrings",
        eval: rule_missing_docstrings,
    },
    Rule {
        id: "test_coverage",
        eval: rule_test_coverage,
    },
    Rule {
        id: "doc_drift",
        eval: rule_doc_drift,
    },
    Rule {
        id: "config_recommendations",
        eval: rule_config_recommendations,
    },
    Rule {
        id: "moderate_complexity",
        eval: rule_moderate_complexity,
    },
    Rule {
        id: "ascii_compliance",
        eval: rule_ascii_compliance,
    },
];

/// Render example entries as `` `name` (file:line) ``; plain strings pass
/// through.
pub fn format_examples(list: &[Json], limit: usize) -> Vec<String> {
    list.iter()
        .filter_map(|v| match v {
            Json::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            Json::Object(o) => {
                let name = o
                    .get("name")
                    .or_else(|| o.get("function"))
                    .and_then(Json::as_str)?;
                let file = o.get("file").and_then(Json::as_str);
                let line = o.get("line").and_then(Json::as_u64);
                Some(match (file, line) {
                    (Some(f), Some(l)) => format!("`{}` ({}:{})", name, f, l),
                    (Some(f), None) => format!("`{}` ({})", name, f),
                    _ => format!("`{}`", name),
                })
            }
            _ => None,
        })
        .take(limit)
        .collect()
}

fn rule_error_handling(input: &RuleInput<'_>) -> Outcome {
    let rec = input.tool("error_handling");
    let count = rec
        .detail_u64("missing_handling")
        .unwrap_or(rec.summary.total_issues);
    if count == 0 {
        return Outcome::Skip;
    }
    let coverage = match input.metrics.percent(ERROR_HANDLING_COVERAGE) {
        Some(p) => format!(" (coverage {:.1}%)", p),
        None => String::new(),
    };
    Outcome::Item {
        tier: PriorityTier::Critical,
        draft: ItemDraft {
            title: "Add missing error handling".into(),
            reason: format!(
                "{} functions perform risky operations without error handling{}",
                count, coverage
            ),
            examples: input.examples(&[("error_handling", "missing_examples")]),
            action: "Wrap file, subprocess and parsing calls in explicit error handling that logs the failure".into(),
            effort: Effort::Medium,
            why: "Unhandled failures abort analysis runs and hide the root cause.".into(),
        },
        count: Some(count),
    }
}

fn rule_unused_imports(input: &RuleInput<'_>) -> Outcome {
    let Some(count) = input.metrics.count(UNUSED_IMPORTS).filter(|c| *c > 0) else {
        return Outcome::Skip;
    };
    let th = input.thresholds;
    if count <= th.unused_imports_quick_win {
        return Outcome::QuickWin(QuickWin {
            title: "Remove unused imports".into(),
            detail: format!("{} obviously unused imports; a few minutes of cleanup", count),
        });
    }
    let tier = if count > th.unused_imports_critical {
        PriorityTier::Critical
    } else {
        PriorityTier::High
    };
    Outcome::Item {
        tier,
        draft: ItemDraft {
            title: "Clean up unused imports".into(),
            reason: format!("{} imports are never used", count),
            examples: input.examples(&[("unused_imports", "examples")]),
            action: "Delete the unused imports, starting with the files that have the most".into(),
            effort: Effort::Small,
            why: "Dead imports slow startup and obscure real dependencies.".into(),
        },
        count: Some(count),
    }
}

fn rule_high_complexity(input: &RuleInput<'_>) -> Outcome {
    let Some(count) = input.metrics.count(HIGH_COMPLEXITY).filter(|c| *c > 0) else {
        return Outcome::Skip;
    };
    Outcome::Item {
        tier: PriorityTier::High,
        draft: ItemDraft {
            title: "Refactor high-complexity functions".into(),
            reason: format!("{} functions exceed the high complexity threshold", count),
            examples: input.examples(&[
                ("analyze_functions", "complex_functions"),
                ("decision_support", "complex_functions"),
            ]),
            action: "Split the most complex functions into smaller helpers with focused tests".into(),
            effort: Effort::Large,
            why: "Complex functions are where most regressions and review misses happen.".into(),
        },
        count: Some(count),
    }
}

fn rule_missing_docstrings(input: &RuleInput<'_>) -> Outcome {
    let Some(count) = input.metrics.count(UNDOCUMENTED_FUNCTIONS).filter(|c| *c > 0) else {
        return Outcome::Skip;
    };
    let coverage = input.metrics.percent(DOC_COVERAGE);
    let target = input.thresholds.doc_coverage_target;
    let tier = match coverage {
        Some(p) if p < target => PriorityTier::High,
        _ => PriorityTier::Medium,
    };
    let coverage_text = match coverage {
        Some(p) => format!("documentation coverage {:.1}%, target {:.0}%", p, target),
        None => "documentation coverage unknown".to_string(),
    };
    Outcome::Item {
        tier,
        draft: ItemDraft {
            title: "Document undocumented functions".into(),
            reason: format!("{} functions lack docstrings ({})", count, coverage_text),
            examples: input.examples(&[
                ("analyze_functions", "undocumented_examples"),
                ("check_docstrings", "missing_examples"),
            ]),
            action: "Add docstrings to public functions first, then internal helpers".into(),
            effort: Effort::Medium,
            why: "Agents and reviewers rely on docstrings to understand intent.".into(),
        },
        count: Some(count),
    }
}

fn rule_test_coverage(input: &RuleInput<'_>) -> Outcome {
    let Some(pct) = input.metrics.percent(TEST_COVERAGE) else {
        return Outcome::Skip;
    };
    let target = input.thresholds.test_coverage_target;
    let tier = if pct < target / 2.0 {
        PriorityTier::High
    } else if pct < target {
        PriorityTier::Medium
    } else {
        return Outcome::Skip;
    };
    Outcome::Item {
        tier,
        draft: ItemDraft {
            title: "Raise test coverage".into(),
            reason: format!("Test coverage is {:.1}%, below the {:.0}% target", pct, target),
            examples: input.examples(&[("test_coverage", "lowest_files")]),
            action: "Add tests for the least covered modules".into(),
            effort: Effort::Large,
            why: "Untested code paths break silently during refactors.".into(),
        },
        count: None,
    }
}

fn rule_doc_drift(input: &RuleInput<'_>) -> Outcome {
    let Some(count) = input.metrics.count(DOC_DRIFT_ISSUES).filter(|c| *c > 0) else {
        return Outcome::Skip;
    };
    Outcome::Item {
        tier: PriorityTier::Medium,
        draft: ItemDraft {
            title: "Fix documentation drift".into(),
            reason: format!("{} documentation references no longer match the code", count),
            examples: input.examples(&[("doc_drift", "drift_examples")]),
            action: "Update or remove the stale references in the docs".into(),
            effort: Effort::Small,
            why: "Stale docs send readers and agents to code that no longer exists.".into(),
        },
        count: Some(count),
    }
}

fn rule_config_recommendations(input: &RuleInput<'_>) -> Outcome {
    let rec = input.tool("config_audit");
    let texts: Vec<&str> = rec
        .detail_list("recommendations")
        .map(|l| l.iter().filter_map(Json::as_str).collect())
        .unwrap_or_default();
    let d = dedupe(&texts, input.thresholds.recommendations_limit);
    if d.distinct == 0 {
        return Outcome::Skip;
    }
    let mut examples = d.shown.clone();
    if let Some(more) = d.more_line() {
        examples.push(more);
    }
    if d.duplicates > 0 {
        examples.push(format!("({} duplicate recommendations merged)", d.duplicates));
    }
    Outcome::Item {
        tier: PriorityTier::Medium,
        draft: ItemDraft {
            title: "Apply configuration recommendations".into(),
            reason: format!("{} distinct configuration recommendations are open", d.distinct),
            examples,
            action: "Move hard-coded settings into the shared config module".into(),
            effort: Effort::Small,
            why: "Scattered configuration drifts between tools and breaks reproducibility.".into(),
        },
        count: Some(d.distinct as u64),
    }
}

fn rule_moderate_complexity(input: &RuleInput<'_>) -> Outcome {
    let Some(count) = input.metrics.count(MODERATE_COMPLEXITY).filter(|c| *c > 0) else {
        return Outcome::Skip;
    };
    if count <= input.thresholds.moderate_complexity_watch {
        return Outcome::Watch(WatchItem {
            title: "Moderate complexity functions".into(),
            detail: format!(
                "{} functions of moderate complexity (threshold {})",
                count, input.thresholds.moderate_complexity_watch
            ),
        });
    }
    Outcome::Item {
        tier: PriorityTier::Low,
        draft: ItemDraft {
            title: "Simplify moderate-complexity functions".into(),
            reason: format!("{} functions sit in the moderate complexity band", count),
            examples: Vec::new(),
            action: "Simplify these opportunistically when touching the code".into(),
            effort: Effort::Medium,
            why: "Today's moderate functions become tomorrow's high-complexity ones.".into(),
        },
        count: Some(count),
    }
}

fn rule_ascii_compliance(input: &RuleInput<'_>) -> Outcome {
    let rec = input.tool("ascii_compliance");
    if rec.summary.total_issues == 0 {
        return Outcome::Skip;
    }
    Outcome::QuickWin(QuickWin {
        title: "Replace non-ASCII characters".into(),
        detail: format!(
            "{} occurrences in {} files",
            rec.summary.total_issues, rec.summary.files_affected
        ),
    })
}

/// Warn when a count is far above what the rule's data source suggests.
/// Returns whether the warning fired; the item is emitted either way.
fn check_plausibility(rule: &str, count: Option<u64>, hints: &HashMap<String, u64>) -> bool {
    let (Some(count), Some(hint)) = (count, hints.get(rule)) else {
        return false;
    };
    if *hint == 0 || count <= hint.saturating_mul(10) {
        return false;
    }
    tracing::warn!(
        rule,
        count,
        expected_minimum = *hint,
        "recommendation magnitude is implausibly large, emitting anyway"
    );
    true
}

/// Run `rules` in order and assemble the ranked synthesis.
pub fn run_rules(rules: &[Rule], ctx: &AggregationContext, metrics: &CanonicalMetrics) -> Synthesis {
    let loader = ToolResultLoader::new(ctx);
    let input = RuleInput {
        metrics,
        loader: &loader,
        thresholds: &ctx.settings.thresholds,
    };
    let mut out = Synthesis::default();
    let mut counters: HashMap<PriorityTier, u32> = HashMap::new();
    for rule in rules {
        match (rule.eval)(&input) {
            Outcome::Item { tier, draft, count } => {
                check_plausibility(rule.id, count, &ctx.settings.hints);
                let next = counters.get(&tier).copied().unwrap_or(0);
                match PriorityItem::new(tier, next, draft) {
                    Some(item) => {
                        counters.insert(tier, next + 1);
                        out.items.push(item);
                    }
                    None => tracing::debug!(rule = rule.id, "item without reason or action suppressed"),
                }
            }
            Outcome::QuickWin(q) => out.quick_wins.push(q),
            Outcome::Watch(w) => out.watch_list.push(w),
            Outcome::Skip => {}
        }
    }
    out.items.sort_by_key(PriorityItem::sort_key);
    out
}

pub fn synthesize(ctx: &AggregationContext, metrics: &CanonicalMetrics) -> Synthesis {
    run_rules(RULES, ctx, metrics)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::models::metrics::MetricValue;
    use crate::models::tier::AuditTier;
    use serde_json::json;
    use tempfile::tempdir;

    fn draft(title: &str, reason: &str) -> ItemDraft {
        ItemDraft {
            title: title.into(),
            reason: reason.into(),
            examples: Vec::new(),
            action: "act".into(),
            effort: Effort::Small,
            why: String::new(),
        }
    }

    fn low_a(_: &RuleInput<'_>) -> Outcome {
        Outcome::Item { tier: PriorityTier::Low, draft: draft("low-a", "r"), count: None }
    }
    fn crit_a(_: &RuleInput<'_>) -> Outcome {
        Outcome::Item { tier: PriorityTier::Critical, draft: draft("crit-a", "r"), count: None }
    }
    fn high_a(_: &RuleInput<'_>) -> Outcome {
        Outcome::Item { tier: PriorityTier::High, draft: draft("high-a", "r"), count: None }
    }
    fn crit_b(_: &RuleInput<'_>) -> Outcome {
        Outcome::Item { tier: PriorityTier::Critical, draft: draft("crit-b", "r"), count: None }
    }
    fn empty_reason(_: &RuleInput<'_>) -> Outcome {
        Outcome::Item { tier: PriorityTier::Critical, draft: draft("silent", ""), count: None }
    }
    fn huge(_: &RuleInput<'_>) -> Outcome {
        Outcome::Item { tier: PriorityTier::High, draft: draft("huge", "r"), count: Some(5000) }
    }

    fn ctx() -> (tempfile::TempDir, AggregationContext) {
        let dir = tempdir().unwrap();
        let c = AggregationContext::new(dir.path().to_path_buf(), AuditTier::Full, Settings::default());
        (dir, c)
    }

    #[test]
    fn test_tier_then_rule_order() {
        let (_d, c) = ctx();
        let rules = [
            Rule { id: "a", eval: low_a },
            Rule { id: "b", eval: crit_a },
            Rule { id: "c", eval: high_a },
            Rule { id: "d", eval: crit_b },
        ];
        let s = run_rules(&rules, &c, &CanonicalMetrics::default());
        let titles: Vec<&str> = s.items.iter().map(|i| i.title.as_str()).collect();
        assert_eq!(titles, vec!["crit-a", "crit-b", "high-a", "low-a"]);
        assert_eq!(s.items[1].insertion_order, 1);
        assert_eq!(s.items[1].sort_key(), 101);
    }

    #[test]
    fn test_empty_reason_is_suppressed_and_does_not_consume_order() {
        let (_d, c) = ctx();
        let rules = [
            Rule { id: "x", eval: empty_reason },
            Rule { id: "b", eval: crit_a },
        ];
        let s = run_rules(&rules, &c, &CanonicalMetrics::default());
        assert_eq!(s.items.len(), 1);
        assert_eq!(s.items[0].title, "crit-a");
        assert_eq!(s.items[0].insertion_order, 0);
    }

    #[test]
    fn test_implausible_magnitude_still_emitted() {
        let (_d, mut c) = ctx();
        c.settings.hints.insert("huge".into(), 10);
        let rules = [Rule { id: "huge", eval: huge }];
        let s = run_rules(&rules, &c, &CanonicalMetrics::default());
        assert_eq!(s.items.len(), 1);
        assert_eq!(s.items[0].title, "huge");

        assert!(check_plausibility("huge", Some(5000), &c.settings.hints));
        assert!(!check_plausibility("huge", Some(100), &c.settings.hints));
        assert!(!check_plausibility("huge", None, &c.settings.hints));
        assert!(!check_plausibility("unhinted", Some(5000), &c.settings.hints));
    }

    #[test]
    fn test_unused_imports_tiering() {
        let (_d, c) = ctx();
        let mut m = CanonicalMetrics::default();
        m.insert(UNUSED_IMPORTS, MetricValue::Count(51));
        let s = synthesize(&c, &m);
        assert_eq!(s.items[0].tier, PriorityTier::Critical);

        m.insert(UNUSED_IMPORTS, MetricValue::Count(50));
        let s = synthesize(&c, &m);
        assert_eq!(s.items[0].tier, PriorityTier::High);

        m.insert(UNUSED_IMPORTS, MetricValue::Count(4));
        let s = synthesize(&c, &m);
        assert!(s.items.is_empty());
        assert_eq!(s.quick_wins.len(), 1);
    }

    #[test]
    fn test_docstring_tier_depends_on_coverage() {
        let (_d, c) = ctx();
        let mut m = CanonicalMetrics::default();
        m.insert(UNDOCUMENTED_FUNCTIONS, MetricValue::Count(50));
        m.insert(DOC_COVERAGE, MetricValue::Percent(90.0));
        let s = synthesize(&c, &m);
        assert_eq!(s.items[0].tier, PriorityTier::Medium);
        m.insert(DOC_COVERAGE, MetricValue::Percent(40.0));
        let s = synthesize(&c, &m);
        assert_eq!(s.items[0].tier, PriorityTier::High);
        assert!(s.items[0].reason.contains("40.0%"));
    }

    #[test]
    fn test_moderate_complexity_watch_vs_item() {
        let (_d, c) = ctx();
        let mut m = CanonicalMetrics::default();
        m.insert(MODERATE_COMPLEXITY, MetricValue::Count(3));
        let s = synthesize(&c, &m);
        assert_eq!(s.watch_list.len(), 1);
        assert!(s.items.is_empty());
        m.insert(MODERATE_COMPLEXITY, MetricValue::Count(300));
        let s = synthesize(&c, &m);
        assert_eq!(s.items[0].tier, PriorityTier::Low);
    }

    #[test]
    fn test_format_examples_shapes() {
        let list = vec![
            json!({"name": "parse", "file": "a.py", "line": 10}),
            json!({"function": "load", "file": "b.py"}),
            json!("plain text"),
            json!(42),
            json!({"file": "nameless.py"}),
        ];
        let out = format_examples(&list, 10);
        assert_eq!(out, vec!["`parse` (a.py:10)", "`load` (b.py)", "plain text"]);
        assert_eq!(format_examples(&list, 1).len(), 1);
    }
}
