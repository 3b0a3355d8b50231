//! Shared data models: canonical tool results, on-disk stored results,
//! priority items and resolved metrics.

pub mod metrics;
pub mod priority;
pub mod tier;

use crate::utils::get_json_path;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as Json};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
/// Tool-reported status. Unknown spellings are kept verbatim.
pub enum ToolStatus {
    Pass,
    Fail,
    Good,
    Poor,
    NeedsAttention,
    Other(String),
}

impl ToolStatus {
    pub fn as_str(&self) -> &str {
        match self {
            ToolStatus::Pass => "PASS",
            ToolStatus::Fail => "FAIL",
            ToolStatus::Good => "GOOD",
            ToolStatus::Poor => "POOR",
            ToolStatus::NeedsAttention => "NEEDS_ATTENTION",
            ToolStatus::Other(s) => s.as_str(),
        }
    }
}

impl From<String> for ToolStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "PASS" => ToolStatus::Pass,
            "FAIL" => ToolStatus::Fail,
            "GOOD" => ToolStatus::Good,
            "POOR" => ToolStatus::Poor,
            "NEEDS_ATTENTION" => ToolStatus::NeedsAttention,
            _ => ToolStatus::Other(s),
        }
    }
}

impl From<ToolStatus> for String {
    fn from(s: ToolStatus) -> Self {
        s.as_str().to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// Required summary block of every tool result.
pub struct Summary {
    pub total_issues: u64,
    pub files_affected: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ToolStatus>,
    /// Remaining summary keys, carried through untouched.
    #[serde(flatten)]
    pub extra: Map<String, Json>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// Canonical shape every tool's output is normalized into.
///
/// Built by the normalizer and read-only afterwards; `details` has no fixed
/// schema, so consumers go through the `detail*` accessors which tolerate
/// absence.
pub struct ResultRecord {
    pub summary: Summary,
    #[serde(default)]
    pub details: Map<String, Json>,
}

impl ResultRecord {
    /// Record returned when no tier has anything for a tool.
    pub fn empty() -> Self {
        ResultRecord {
            summary: Summary {
                total_issues: 0,
                files_affected: 0,
                status: None,
                extra: Map::new(),
            },
            details: Map::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.summary.total_issues == 0
            && self.summary.files_affected == 0
            && self.summary.status.is_none()
            && self.summary.extra.is_empty()
            && self.details.is_empty()
    }

    /// Look up a dotted path (`complexity.high`) inside `details`.
    pub fn detail(&self, path: &str) -> Option<&Json> {
        let (head, rest) = match path.split_once('.') {
            Some((h, r)) => (h, Some(r)),
            None => (path, None),
        };
        let first = self.details.get(head)?;
        match rest {
            Some(r) => get_json_path(first, r),
            None => Some(first),
        }
    }

    /// Non-negative integer detail; integral floats are accepted.
    pub fn detail_u64(&self, path: &str) -> Option<u64> {
        json_as_u64(self.detail(path)?)
    }

    pub fn detail_f64(&self, path: &str) -> Option<f64> {
        self.detail(path)?.as_f64().filter(|v| v.is_finite())
    }

    pub fn detail_list(&self, path: &str) -> Option<&Vec<Json>> {
        self.detail(path)?.as_array()
    }
}

/// Coerce a JSON value into a non-negative integer.
///
/// Integers, integral non-negative floats and decimal strings qualify.
pub fn json_as_u64(v: &Json) -> Option<u64> {
    match v {
        Json::Number(n) => n.as_u64().or_else(|| {
            n.as_f64()
                .filter(|f| *f >= 0.0 && *f < u64::MAX as f64 && f.fract() == 0.0)
                .map(|f| f as u64)
        }),
        Json::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
/// A tool and the storage namespace its results live under.
pub struct ToolIdentity {
    pub tool_name: String,
    pub domain: String,
}

const KNOWN_DOMAINS: &[(&str, &str)] = &[
    ("analyze_functions", "functions"),
    ("analyze_function_registry", "functions"),
    ("decision_support", "decisions"),
    ("check_docstrings", "docs"),
    ("doc_drift", "docs"),
    ("unused_imports", "imports"),
    ("error_handling", "errors"),
    ("test_coverage", "tests"),
    ("config_audit", "config"),
    ("ascii_compliance", "style"),
];

impl ToolIdentity {
    pub fn new(tool_name: &str, domain: &str) -> Self {
        ToolIdentity {
            tool_name: tool_name.to_string(),
            domain: domain.to_string(),
        }
    }

    /// Resolve the domain from the known-tools table; unknown tools land in
    /// `general`.
    pub fn infer(tool_name: &str) -> Self {
        let domain = KNOWN_DOMAINS
            .iter()
            .find(|(t, _)| *t == tool_name)
            .map(|(_, d)| *d)
            .unwrap_or("general");
        ToolIdentity::new(tool_name, domain)
    }

    /// Explicit domain when given, inferred otherwise.
    pub fn resolve(tool_name: &str, domain: Option<&str>) -> Self {
        match domain {
            Some(d) if !d.trim().is_empty() => ToolIdentity::new(tool_name, d.trim()),
            _ => ToolIdentity::infer(tool_name),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
/// On-disk document: a result record plus provenance.
///
/// Legacy writers nest the payload under `data` instead of carrying a
/// top-level `summary`.
pub struct StoredResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<Summary>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub details: Map<String, Json>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generated_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Json>,
}

impl StoredResult {
    pub fn from_record(record: &ResultRecord, generated_by: &str, timestamp: &str) -> Self {
        StoredResult {
            summary: Some(record.summary.clone()),
            details: record.details.clone(),
            generated_by: Some(generated_by.to_string()),
            timestamp: Some(timestamp.to_string()),
            source: None,
            note: None,
            data: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_status_roundtrips_known_and_custom_values() {
        let s: ToolStatus = serde_json::from_value(json!("NEEDS_ATTENTION")).unwrap();
        assert_eq!(s, ToolStatus::NeedsAttention);
        let custom: ToolStatus = serde_json::from_value(json!("WARN")).unwrap();
        assert_eq!(custom, ToolStatus::Other("WARN".into()));
        assert_eq!(serde_json::to_value(&custom).unwrap(), json!("WARN"));
    }

    #[test]
    fn test_detail_accessors_tolerate_absence() {
        let details = json!({
            "total_functions": 12,
            "complexity": {"high": 3.0, "ratio": 0.25},
            "examples": ["a", "b"]
        });
        let rec = ResultRecord {
            summary: Summary {
                total_issues: 1,
                files_affected: 1,
                status: None,
                extra: Map::new(),
            },
            details: details.as_object().unwrap().clone(),
        };
        assert_eq!(rec.detail_u64("total_functions"), Some(12));
        assert_eq!(rec.detail_u64("complexity.high"), Some(3));
        assert_eq!(rec.detail_u64("complexity.ratio"), None);
        assert_eq!(rec.detail_list("examples").map(|v| v.len()), Some(2));
        assert!(rec.detail("missing.path").is_none());
        assert!(ResultRecord::empty().is_empty());
    }

    #[test]
    fn test_json_as_u64_rejects_out_of_range_floats() {
        assert_eq!(json_as_u64(&json!(7.0)), Some(7));
        assert_eq!(json_as_u64(&json!(" 12 ")), Some(12));
        assert_eq!(json_as_u64(&json!(1e30)), None);
        assert_eq!(json_as_u64(&json!(-2.0)), None);
        assert_eq!(json_as_u64(&json!(2.5)), None);
    }

    #[test]
    fn test_identity_inference() {
        assert_eq!(ToolIdentity::infer("unused_imports").domain, "imports");
        assert_eq!(ToolIdentity::infer("brand_new_tool").domain, "general");
        assert_eq!(
            ToolIdentity::resolve("unused_imports", Some("custom")).domain,
            "custom"
        );
    }
}
