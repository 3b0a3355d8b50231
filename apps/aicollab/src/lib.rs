//! aicollab core library.
//!
//! Aggregates results from independent analysis tools, reconciles overlapping
//! metrics into one canonical set, and synthesizes ranked priorities rendered
//! as Markdown reports.
//!
//! High-level modules:
//! - `cli`: CLI argument parsing (binary uses this).
//! - `config`: Discovery and effective configuration resolution.
//! - `context`: Per-pass aggregation context and in-run result cache.
//! - `normalize`: Tool payload validation into `ResultRecord`.
//! - `storage` / `loader`: Result storage layout and tiered lookup.
//! - `resolver`: Canonical metric resolution across tools.
//! - `synthesize` / `dedup`: Priority rules and recommendation merging.
//! - `render`: `AI_STATUS.md`, `AI_PRIORITIES.md`, `AI_CONSOLIDATED_REPORT.md`.
//! - `models`: Data models for records, metrics and priorities.
//! - `output`: Human/JSON terminal printers.
//! - `utils`: Supporting helpers.
pub mod cli;
pub mod config;
pub mod context;
pub mod dedup;
pub mod error;
pub mod loader;
pub mod models;
pub mod normalize;
pub mod output;
pub mod render;
pub mod resolver;
pub mod storage;
pub mod synthesize;
pub mod utils;
