//! `AI_STATUS.md`: one-shot snapshot of metric values and tool freshness.

use super::{header, metric_label, metric_text, ReportKind};
use crate::context::AggregationContext;
use crate::loader::ToolResultLoader;
use crate::models::tier::PriorityTier;
use crate::resolver::resolve_metrics;
use crate::synthesize::synthesize;

pub fn render_status(ctx: &AggregationContext, last_generated: Option<&str>) -> String {
    let metrics = resolve_metrics(ctx);
    let synthesis = synthesize(ctx, &metrics);
    let loader = ToolResultLoader::new(ctx);

    let mut out = header(ReportKind::Status, ctx, last_generated);

    out.push_str("## Metrics\n\n| Metric | Value |\n| --- | --- |\n");
    for (name, value) in metrics.iter() {
        out.push_str(&format!("| {} | {} |\n", metric_label(name), metric_text(value)));
    }
    out.push('\n');

    out.push_str(&format!("## Tools ({} audit)\n\n", ctx.audit_tier));
    for tool in ctx.audit_tier.tools() {
        let loaded = loader.load_with_origin(tool, None);
        match loaded.origin {
            Some(origin) => {
                let status = loaded
                    .record
                    .summary
                    .status
                    .as_ref()
                    .map(|s| format!(", status {}", s.as_str()))
                    .unwrap_or_default();
                out.push_str(&format!(
                    "- `{}`: {} issues in {} files ({}{})\n",
                    tool,
                    loaded.record.summary.total_issues,
                    loaded.record.summary.files_affected,
                    origin.label(),
                    status
                ));
            }
            None => out.push_str(&format!("- `{}`: Data unavailable, run `{}`\n", tool, tool)),
        }
    }
    out.push('\n');

    out.push_str("## Open Priorities\n\n");
    if synthesis.items.is_empty() {
        out.push_str("No ranked priorities.\n");
    } else {
        for tier in PriorityTier::ALL {
            let n = synthesis.items.iter().filter(|i| i.tier == tier).count();
            if n > 0 {
                out.push_str(&format!("- {}: {}\n", tier.label(), n));
            }
        }
        out.push_str("\nSee AI_PRIORITIES.md for details.\n");
    }
    out
}
