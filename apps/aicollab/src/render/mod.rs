//! Markdown report renderers.
//!
//! Each renderer resolves metrics and synthesizes priorities on its own; the
//! three documents agree because the algorithms are deterministic, not
//! because they share state.

pub mod consolidated;
pub mod priorities;
pub mod status;

use crate::context::AggregationContext;
use crate::error::StorageError;
use crate::models::metrics::MetricValue;
use std::fs;
use std::path::{Path, PathBuf};

pub const UNKNOWN_HINT: &str = "Unknown (run audit for details)";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportKind {
    Status,
    Priorities,
    Consolidated,
}

impl ReportKind {
    pub const ALL: [ReportKind; 3] = [
        ReportKind::Status,
        ReportKind::Priorities,
        ReportKind::Consolidated,
    ];

    pub fn file_name(self) -> &'static str {
        match self {
            ReportKind::Status => "AI_STATUS.md",
            ReportKind::Priorities => "AI_PRIORITIES.md",
            ReportKind::Consolidated => "AI_CONSOLIDATED_REPORT.md",
        }
    }

    fn title(self) -> &'static str {
        match self {
            ReportKind::Status => "AI Status",
            ReportKind::Priorities => "AI Priorities",
            ReportKind::Consolidated => "AI Consolidated Report",
        }
    }

    fn command(self) -> &'static str {
        match self {
            ReportKind::Status => "status",
            ReportKind::Priorities => "priorities",
            ReportKind::Consolidated => "consolidated",
        }
    }
}

/// Metric text for Markdown; `Unknown` never renders as a number.
pub fn metric_text(v: &MetricValue) -> String {
    if v.is_unknown() {
        UNKNOWN_HINT.to_string()
    } else {
        v.to_string()
    }
}

pub fn metric_label(name: &str) -> &str {
    match name {
        "total_functions" => "Total functions",
        "high_complexity" => "High complexity functions",
        "moderate_complexity" => "Moderate complexity functions",
        "undocumented_functions" => "Undocumented functions",
        "doc_coverage" => "Documentation coverage",
        "error_handling_coverage" => "Error handling coverage",
        "test_coverage" => "Test coverage",
        "unused_imports" => "Unused imports",
        "doc_drift_issues" => "Documentation drift issues",
        other => other,
    }
}

/// Provenance header block every document starts with.
pub fn header(kind: ReportKind, ctx: &AggregationContext, last_generated: Option<&str>) -> String {
    let mut out = String::new();
    out.push_str(&format!("# {}\n\n", kind.title()));
    out.push_str(&format!("> **File**: {}\n", kind.file_name()));
    out.push_str(&format!("> **Generated**: {}\n", ctx.generated_stamp()));
    out.push_str(&format!(
        "> **Last Generated**: {}\n",
        last_generated.unwrap_or("never")
    ));
    out.push_str(&format!(
        "> **Source**: aicollab {} (audit tier: {})\n\n",
        kind.command(),
        ctx.audit_tier
    ));
    out
}

/// `Generated` value of an existing report, if any.
pub fn previous_generated(path: &Path) -> Option<String> {
    let s = fs::read_to_string(path).ok()?;
    s.lines()
        .find_map(|l| l.strip_prefix("> **Generated**:"))
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub fn render(kind: ReportKind, ctx: &AggregationContext, last_generated: Option<&str>) -> String {
    match kind {
        ReportKind::Status => status::render_status(ctx, last_generated),
        ReportKind::Priorities => priorities::render_priorities(ctx, last_generated),
        ReportKind::Consolidated => consolidated::render_consolidated(ctx, last_generated),
    }
}

/// Render `kinds` into `out_dir`, carrying each file's previous timestamp.
pub fn write_reports(
    ctx: &AggregationContext,
    out_dir: &Path,
    kinds: &[ReportKind],
) -> Result<Vec<PathBuf>, StorageError> {
    fs::create_dir_all(out_dir).map_err(|source| StorageError::Write {
        path: out_dir.to_path_buf(),
        source,
    })?;
    let mut written = Vec::new();
    for kind in kinds {
        let path = out_dir.join(kind.file_name());
        let last = previous_generated(&path);
        let body = render(*kind, ctx, last.as_deref());
        fs::write(&path, body).map_err(|source| StorageError::Write {
            path: path.clone(),
            source,
        })?;
        tracing::info!(report = kind.file_name(), path = %path.display(), "report written");
        written.push(path);
    }
    Ok(written)
}
