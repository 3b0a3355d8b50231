//! `AI_CONSOLIDATED_REPORT.md`: long-form report with metric provenance and
//! per-tool detail sections.

use super::{header, metric_label, metric_text, ReportKind};
use crate::context::AggregationContext;
use crate::loader::ToolResultLoader;
use crate::models::metrics::CanonicalMetrics;
use crate::models::tier::AuditTier;
use crate::models::ToolIdentity;
use crate::resolver::resolve_detailed;
use crate::synthesize::synthesize;
use serde_json::Value as Json;

fn describe(v: &Json) -> String {
    match v {
        Json::Array(a) => format!("{} entries", a.len()),
        Json::Object(o) => format!("{} fields", o.len()),
        Json::String(s) => s.clone(),
        Json::Null => "null".to_string(),
        other => other.to_string(),
    }
}

pub fn render_consolidated(ctx: &AggregationContext, last_generated: Option<&str>) -> String {
    let resolved = resolve_detailed(ctx);
    let mut metrics = CanonicalMetrics::default();
    for r in &resolved {
        metrics.insert(r.name, r.value);
    }
    let synthesis = synthesize(ctx, &metrics);
    let loader = ToolResultLoader::new(ctx);

    let mut out = header(ReportKind::Consolidated, ctx, last_generated);

    out.push_str("## Canonical Metrics\n\n| Metric | Value | Source |\n| --- | --- | --- |\n");
    for r in &resolved {
        let source = match (r.tool, r.tier) {
            (Some(tool), Some(tier)) => format!("`{}` ({})", tool, tier.label()),
            _ => "none".to_string(),
        };
        out.push_str(&format!(
            "| {} | {} | {} |\n",
            metric_label(r.name),
            metric_text(&r.value),
            source
        ));
    }
    out.push('\n');

    out.push_str("## Tool Details\n\n");
    for tool in AuditTier::Full.tools() {
        let id = ToolIdentity::infer(tool);
        out.push_str(&format!("### `{}` ({})\n\n", tool, id.domain));
        let loaded = loader.load_with_origin(tool, None);
        let Some(origin) = loaded.origin else {
            out.push_str(&format!("Data unavailable, run `{}`.\n\n", tool));
            continue;
        };
        let rec = &loaded.record;
        out.push_str(&format!("- Origin: {}\n", origin.label()));
        if let Some(s) = rec.summary.status.as_ref() {
            out.push_str(&format!("- Status: {}\n", s.as_str()));
        }
        out.push_str(&format!("- Total issues: {}\n", rec.summary.total_issues));
        out.push_str(&format!("- Files affected: {}\n", rec.summary.files_affected));
        for (key, value) in &rec.details {
            out.push_str(&format!("- {}: {}\n", key, describe(value)));
        }
        out.push('\n');
    }

    out.push_str("## Priority Summary\n\n");
    if synthesis.items.is_empty() {
        out.push_str("No ranked priorities.\n");
    }
    for (i, item) in synthesis.items.iter().enumerate() {
        out.push_str(&format!(
            "{}. [{}] {}: {}\n",
            i + 1,
            item.tier.label(),
            item.title,
            item.reason
        ));
    }
    if !synthesis.quick_wins.is_empty() {
        out.push_str(&format!("\nQuick wins: {}\n", synthesis.quick_wins.len()));
    }
    if !synthesis.watch_list.is_empty() {
        out.push_str(&format!("Watch list entries: {}\n", synthesis.watch_list.len()));
    }
    out
}
