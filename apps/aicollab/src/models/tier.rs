//! Two unrelated notions of "tier".
//!
//! - `PriorityTier`: urgency of a synthesized action item (1 critical .. 4 low).
//! - `AuditTier`: depth of an audit pass, deciding which tools are expected
//!   to run. It never influences ranking.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum PriorityTier {
    Critical = 1,
    High = 2,
    Medium = 3,
    Low = 4,
}

impl PriorityTier {
    pub const ALL: [PriorityTier; 4] = [
        PriorityTier::Critical,
        PriorityTier::High,
        PriorityTier::Medium,
        PriorityTier::Low,
    ];

    pub fn rank(self) -> u32 {
        self as u32
    }

    pub fn label(self) -> &'static str {
        match self {
            PriorityTier::Critical => "Critical",
            PriorityTier::High => "High",
            PriorityTier::Medium => "Medium",
            PriorityTier::Low => "Low",
        }
    }
}

impl From<PriorityTier> for u8 {
    fn from(t: PriorityTier) -> u8 {
        t as u8
    }
}

impl TryFrom<u8> for PriorityTier {
    type Error = String;

    fn try_from(v: u8) -> Result<Self, Self::Error> {
        match v {
            1 => Ok(PriorityTier::Critical),
            2 => Ok(PriorityTier::High),
            3 => Ok(PriorityTier::Medium),
            4 => Ok(PriorityTier::Low),
            other => Err(format!("priority tier must be 1-4, got {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditTier {
    Quick,
    #[default]
    Standard,
    Full,
}

impl AuditTier {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "quick" => Some(AuditTier::Quick),
            "standard" => Some(AuditTier::Standard),
            "full" => Some(AuditTier::Full),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AuditTier::Quick => "quick",
            AuditTier::Standard => "standard",
            AuditTier::Full => "full",
        }
    }

    /// Tools expected to have produced results at this depth.
    pub fn tools(self) -> &'static [&'static str] {
        match self {
            AuditTier::Quick => &["unused_imports", "check_docstrings", "ascii_compliance"],
            AuditTier::Standard => &[
                "unused_imports",
                "check_docstrings",
                "ascii_compliance",
                "analyze_functions",
                "error_handling",
                "doc_drift",
            ],
            AuditTier::Full => &[
                "unused_imports",
                "check_docstrings",
                "ascii_compliance",
                "analyze_functions",
                "error_handling",
                "doc_drift",
                "decision_support",
                "analyze_function_registry",
                "test_coverage",
                "config_audit",
            ],
        }
    }
}

impl fmt::Display for AuditTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
