//! Synthesized action items.

use super::tier::PriorityTier;
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Effort {
    Small,
    Medium,
    Large,
}

impl fmt::Display for Effort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Effort::Small => "Small",
            Effort::Medium => "Medium",
            Effort::Large => "Large",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
/// A ranked action item. Created per aggregation pass, never persisted.
///
/// Construction goes through [`PriorityItem::new`], which refuses items
/// without a reason or an action.
pub struct PriorityItem {
    pub tier: PriorityTier,
    pub insertion_order: u32,
    pub title: String,
    pub reason: String,
    pub examples: Vec<String>,
    pub action: String,
    pub effort: Effort,
    pub why: String,
}

impl PriorityItem {
    pub fn new(
        tier: PriorityTier,
        insertion_order: u32,
        draft: ItemDraft,
    ) -> Option<PriorityItem> {
        if draft.reason.trim().is_empty() || draft.action.trim().is_empty() {
            return None;
        }
        Some(PriorityItem {
            tier,
            insertion_order,
            title: draft.title,
            reason: draft.reason,
            examples: draft.examples,
            action: draft.action,
            effort: draft.effort,
            why: draft.why,
        })
    }

    pub fn sort_key(&self) -> u32 {
        self.tier.rank() * 100 + self.insertion_order
    }

    /// Presentation bullets: examples first, then action, effort, rationale.
    pub fn bullets(&self) -> Vec<String> {
        let mut out = self.examples.clone();
        out.push(format!("Action: {}", self.action));
        out.push(format!("Effort: {}", self.effort));
        if !self.why.trim().is_empty() {
            out.push(format!("Why this matters: {}", self.why));
        }
        out
    }
}

#[derive(Debug, Clone, PartialEq)]
/// What a rule proposes before tiering and ordering are assigned.
pub struct ItemDraft {
    pub title: String,
    pub reason: String,
    pub examples: Vec<String>,
    pub action: String,
    pub effort: Effort,
    pub why: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
/// Trivial fix kept out of the ranked list.
pub struct QuickWin {
    pub title: String,
    pub detail: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
/// Sub-threshold finding worth noting.
pub struct WatchItem {
    pub title: String,
    pub detail: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
/// Output of one synthesis pass.
pub struct Synthesis {
    pub items: Vec<PriorityItem>,
    pub quick_wins: Vec<QuickWin>,
    pub watch_list: Vec<WatchItem>,
}
