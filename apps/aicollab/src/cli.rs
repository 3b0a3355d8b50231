//! CLI argument parsing via `clap`.

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "aicollab",
    version,
    about = "Aggregate analyzer results into AI status and priority reports",
    long_about = "aicollab — loads results from independent analysis tools, reconciles overlapping metrics and renders AI_STATUS.md, AI_PRIORITIES.md and AI_CONSOLIDATED_REPORT.md.\n\nConfiguration precedence: CLI > aicollab.toml > defaults.",
    after_help = "Examples:\n  aicollab report\n  aicollab priorities --output json\n  aicollab metrics --fresh unused_imports=out/unused.json\n  aicollab ingest --tool analyze_functions results/functions.json",
    arg_required_else_help = true
)]
/// Top-level CLI options and subcommands.
pub struct Cli {
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Args, Clone, Default)]
/// Flags shared by every aggregation command.
pub struct CommonArgs {
    #[arg(long, help = "Project root (default: current dir)")]
    pub project_root: Option<String>,
    #[arg(long, help = "Output mode: human|json (default: human)")]
    pub output: Option<String>,
    #[arg(long, help = "Audit tier: quick|standard|full (default: standard)")]
    pub audit_tier: Option<String>,
    #[arg(
        long = "fresh",
        value_name = "TOOL=PATH",
        help = "Treat PATH as TOOL's result from the current run (repeatable)"
    )]
    pub fresh: Vec<String>,
}

#[derive(Subcommand)]
/// Supported subcommands.
pub enum Commands {
    /// Show version
    #[command(about = "Show version", long_about = "Print the current aicollab version.")]
    Version,
    /// Print resolved canonical metrics
    #[command(
        about = "Print resolved metrics",
        long_about = "Resolve every canonical metric across tools and print its value and source.",
        after_help = "Examples:\n  aicollab metrics\n  aicollab metrics --output json"
    )]
    Metrics {
        #[command(flatten)]
        common: CommonArgs,
    },
    /// Print ranked priorities
    #[command(
        about = "Print ranked priorities",
        long_about = "Synthesize ranked priority items, quick wins and the watch list."
    )]
    Priorities {
        #[command(flatten)]
        common: CommonArgs,
        #[arg(long, action = clap::ArgAction::SetTrue, help = "Also write AI_PRIORITIES.md")]
        write: bool,
        #[arg(long, help = "Directory for written reports (default: project root)")]
        out_dir: Option<String>,
    },
    /// Write AI_STATUS.md
    Status {
        #[command(flatten)]
        common: CommonArgs,
        #[arg(long, help = "Directory for written reports (default: project root)")]
        out_dir: Option<String>,
    },
    /// Write AI_CONSOLIDATED_REPORT.md
    Consolidated {
        #[command(flatten)]
        common: CommonArgs,
        #[arg(long, help = "Directory for written reports (default: project root)")]
        out_dir: Option<String>,
    },
    /// Write all three reports
    #[command(
        about = "Write all reports",
        long_about = "Render AI_STATUS.md, AI_PRIORITIES.md and AI_CONSOLIDATED_REPORT.md in one pass."
    )]
    Report {
        #[command(flatten)]
        common: CommonArgs,
        #[arg(long, help = "Directory for written reports (default: project root)")]
        out_dir: Option<String>,
    },
    /// Store a tool result in standardized storage
    #[command(
        about = "Ingest a tool result",
        long_about = "Validate a tool's JSON output and store it as the tool's latest result with provenance.",
        after_help = "Examples:\n  aicollab ingest --tool unused_imports out/unused.json\n  aicollab ingest --tool my_tool --domain custom out/my_tool.json"
    )]
    Ingest {
        #[arg(long, help = "Project root (default: current dir)")]
        project_root: Option<String>,
        #[arg(long, help = "Tool name")]
        tool: String,
        #[arg(long, help = "Storage domain (default: inferred from tool)")]
        domain: Option<String>,
        #[arg(long, help = "Value for generated_by (default: tool name)")]
        generated_by: Option<String>,
        #[arg(help = "Path to the tool's JSON output")]
        file: String,
    },
}

/// Split a `TOOL=PATH` argument.
pub fn parse_fresh(arg: &str) -> Option<(&str, &str)> {
    let (tool, path) = arg.split_once('=')?;
    let (tool, path) = (tool.trim(), path.trim());
    if tool.is_empty() || path.is_empty() {
        return None;
    }
    Some((tool, path))
}
