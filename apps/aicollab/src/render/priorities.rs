//! `AI_PRIORITIES.md`: ranked action items, quick wins and watch list.

use super::{header, ReportKind};
use crate::context::AggregationContext;
use crate::models::tier::PriorityTier;
use crate::resolver::resolve_metrics;
use crate::synthesize::synthesize;

pub fn render_priorities(ctx: &AggregationContext, last_generated: Option<&str>) -> String {
    let metrics = resolve_metrics(ctx);
    let synthesis = synthesize(ctx, &metrics);

    let mut out = header(ReportKind::Priorities, ctx, last_generated);

    out.push_str("## Ranked Priorities\n\n");
    if synthesis.items.is_empty() {
        out.push_str("No ranked priorities. All tracked metrics are within thresholds or unavailable.\n\n");
    }
    let mut rank = 0usize;
    for tier in PriorityTier::ALL {
        let items: Vec<_> = synthesis.items.iter().filter(|i| i.tier == tier).collect();
        if items.is_empty() {
            continue;
        }
        out.push_str(&format!("### Tier {}: {}\n\n", tier.rank(), tier.label()));
        for item in items {
            rank += 1;
            out.push_str(&format!("#### {}. {}\n\n", rank, item.title));
            out.push_str(&format!("**Why now**: {}\n\n", item.reason));
            for b in item.bullets() {
                out.push_str(&format!("- {}\n", b));
            }
            out.push('\n');
        }
    }

    out.push_str("## Quick Wins\n\n");
    if synthesis.quick_wins.is_empty() {
        out.push_str("No quick wins identified.\n");
    }
    for q in &synthesis.quick_wins {
        out.push_str(&format!("- **{}**: {}\n", q.title, q.detail));
    }
    out.push('\n');

    out.push_str("## Watch List\n\n");
    if synthesis.watch_list.is_empty() {
        out.push_str("Nothing on the watch list.\n");
    }
    for w in &synthesis.watch_list {
        out.push_str(&format!("- **{}**: {}\n", w.title, w.detail));
    }
    out
}
