//! Explicit per-pass state handed to the loader, resolver and renderers.

use crate::config::{Effective, Settings};
use crate::error::NormalizeError;
use crate::models::tier::AuditTier;
use crate::models::ResultRecord;
use crate::normalize::normalize;
use chrono::{DateTime, Utc};
use serde_json::Value as Json;
use std::collections::{BTreeSet, HashMap};
use std::path::PathBuf;

#[derive(Debug, Default, Clone)]
/// Results produced by tools that actually ran during the current pass.
///
/// Written only by the driver that executes tools; the aggregation core reads
/// it through [`RunCache::get`].
pub struct RunCache {
    entries: HashMap<String, ResultRecord>,
    ran: BTreeSet<String>,
}

impl RunCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a fresh result, normalizing it once at insertion.
    pub fn record(&mut self, tool: &str, payload: &Json) -> Result<(), NormalizeError> {
        let rec = normalize(tool, payload)?;
        self.entries.insert(tool.to_string(), rec);
        self.ran.insert(tool.to_string());
        Ok(())
    }

    /// Seed an entry without marking the tool as run in this pass.
    ///
    /// Such entries are never served by `get`.
    #[cfg(test)]
    pub fn retain_stale(&mut self, tool: &str, record: ResultRecord) {
        self.entries.insert(tool.to_string(), record);
    }

    pub fn has_run(&self, tool: &str) -> bool {
        self.ran.contains(tool)
    }

    pub fn get(&self, tool: &str) -> Option<&ResultRecord> {
        if !self.has_run(tool) {
            return None;
        }
        self.entries.get(tool)
    }
}

#[derive(Debug, Clone)]
/// Everything one aggregation pass needs; build a fresh one per pass.
pub struct AggregationContext {
    pub project_root: PathBuf,
    pub audit_tier: AuditTier,
    pub run_cache: RunCache,
    pub settings: Settings,
    pub generated_at: DateTime<Utc>,
}

impl AggregationContext {
    pub fn new(project_root: PathBuf, audit_tier: AuditTier, settings: Settings) -> Self {
        AggregationContext {
            project_root,
            audit_tier,
            run_cache: RunCache::new(),
            settings,
            generated_at: Utc::now(),
        }
    }

    pub fn from_effective(eff: &Effective) -> Self {
        Self::new(
            eff.project_root.clone(),
            eff.audit_tier,
            eff.settings.clone(),
        )
    }

    pub fn with_run_cache(mut self, cache: RunCache) -> Self {
        self.run_cache = cache;
        self
    }

    pub fn with_generated_at(mut self, at: DateTime<Utc>) -> Self {
        self.generated_at = at;
        self
    }

    pub fn generated_stamp(&self) -> String {
        self.generated_at.format("%Y-%m-%d %H:%M:%S UTC").to_string()
    }
}
