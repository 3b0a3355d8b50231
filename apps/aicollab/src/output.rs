//! Terminal output for metrics, priorities and report writes.
//!
//! Supports `human` (default) and `json` outputs. JSON shapes come from the
//! pure `compose_*` functions so they can be asserted in tests.

use crate::models::priority::Synthesis;
use crate::models::tier::PriorityTier;
use crate::render::metric_label;
use crate::resolver::Resolution;
use crate::utils::rel_to;
use owo_colors::OwoColorize;
use serde_json::json;
use serde_json::Value as JsonVal;
use std::path::{Path, PathBuf};

fn use_colors(output: &str) -> bool {
    output != "json" && std::env::var_os("NO_COLOR").is_none()
}

fn print_json(v: &JsonVal) {
    match serde_json::to_string_pretty(v) {
        Ok(s) => println!("{}", s),
        Err(e) => eprintln!("{} {}", crate::utils::error_prefix(), e),
    }
}

/// Compose resolved metrics with provenance.
pub fn compose_metrics_json(resolved: &[Resolution]) -> JsonVal {
    let metrics: serde_json::Map<String, JsonVal> = resolved
        .iter()
        .map(|r| {
            (
                r.name.to_string(),
                json!({
                    "value": r.value,
                    "tool": r.tool,
                    "tier": r.tier,
                }),
            )
        })
        .collect();
    let unknown = resolved.iter().filter(|r| r.value.is_unknown()).count();
    json!({"metrics": metrics, "summary": {"total": resolved.len(), "unknown": unknown}})
}

/// Compose the synthesized priorities with derived sort keys and bullets.
pub fn compose_priorities_json(s: &Synthesis) -> JsonVal {
    let items: Vec<_> = s
        .items
        .iter()
        .map(|i| {
            json!({
                "tier": i.tier,
                "sort_key": i.sort_key(),
                "title": i.title,
                "reason": i.reason,
                "bullets": i.bullets(),
            })
        })
        .collect();
    json!({
        "items": items,
        "quick_wins": s.quick_wins,
        "watch_list": s.watch_list,
        "summary": {
            "items": s.items.len(),
            "quick_wins": s.quick_wins.len(),
            "watch_list": s.watch_list.len(),
        }
    })
}

pub fn print_metrics(resolved: &[Resolution], output: &str) {
    if output == "json" {
        print_json(&compose_metrics_json(resolved));
        return;
    }
    let color = use_colors(output);
    for r in resolved {
        let label = metric_label(r.name);
        let value = r.value.to_string();
        let source = match (r.tool, r.tier) {
            (Some(t), Some(tier)) => format!("{} ({})", t, tier.label()),
            _ => "no source".to_string(),
        };
        if color {
            let v = if r.value.is_unknown() {
                value.yellow().to_string()
            } else {
                value.bold().to_string()
            };
            println!("{:<32} {} {}", label, v, source.bright_black());
        } else {
            println!("{:<32} {} {}", label, value, source);
        }
    }
}

pub fn print_priorities(s: &Synthesis, output: &str) {
    if output == "json" {
        print_json(&compose_priorities_json(s));
        return;
    }
    let color = use_colors(output);
    for (n, i) in s.items.iter().enumerate() {
        let tag = format!("⟦{}⟧", i.tier.label().to_ascii_lowercase());
        let tag = if !color {
            tag
        } else {
            match i.tier {
                PriorityTier::Critical => tag.red().bold().to_string(),
                PriorityTier::High => tag.yellow().bold().to_string(),
                PriorityTier::Medium => tag.blue().bold().to_string(),
                PriorityTier::Low => tag.bright_black().to_string(),
            }
        };
        println!("{:>2}. {} {} — {}", n + 1, tag, i.title, i.reason);
    }
    for q in &s.quick_wins {
        println!("    quick win: {} — {}", q.title, q.detail);
    }
    for w in &s.watch_list {
        println!("    watch: {} — {}", w.title, w.detail);
    }
    let summary = format!(
        "— Summary — items={} quick_wins={} watch={}",
        s.items.len(),
        s.quick_wins.len(),
        s.watch_list.len()
    );
    if color {
        println!("{}", summary.bold());
    } else {
        println!("{}", summary);
    }
}

pub fn print_written(paths: &[PathBuf], root: &Path, output: &str) {
    if output == "json" {
        let files: Vec<String> = paths.iter().map(|p| rel_to(root, p)).collect();
        print_json(&json!({"written": files}));
        return;
    }
    let color = use_colors(output);
    for p in paths {
        let rel = rel_to(root, p);
        if color {
            println!("{} {}", "📝 wrote:".green().bold(), rel.bold());
        } else {
            println!("📝 wrote: {}", rel);
        }
    }
}
