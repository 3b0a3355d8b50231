//! Resolved canonical metrics.

use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

pub const UNKNOWN: &str = "Unknown";

#[derive(Debug, Clone, Copy, PartialEq)]
/// One authoritative value per metric and run.
///
/// `Unknown` is deliberately distinct from zero: renderers must print a hint
/// instead of a number.
pub enum MetricValue {
    Count(u64),
    Percent(f64),
    Unknown,
}

impl MetricValue {
    pub fn is_unknown(&self) -> bool {
        matches!(self, MetricValue::Unknown)
    }

    pub fn as_count(&self) -> Option<u64> {
        match self {
            MetricValue::Count(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_percent(&self) -> Option<f64> {
        match self {
            MetricValue::Percent(p) => Some(*p),
            _ => None,
        }
    }
}

impl fmt::Display for MetricValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetricValue::Count(n) => write!(f, "{}", n),
            MetricValue::Percent(p) => write!(f, "{:.1}%", p),
            MetricValue::Unknown => f.write_str(UNKNOWN),
        }
    }
}

impl Serialize for MetricValue {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        match self {
            MetricValue::Count(n) => s.serialize_u64(*n),
            MetricValue::Percent(p) => s.serialize_f64(*p),
            MetricValue::Unknown => s.serialize_str(UNKNOWN),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(transparent)]
/// Metric name to resolved value, iterated in name order.
pub struct CanonicalMetrics {
    values: BTreeMap<String, MetricValue>,
}

impl CanonicalMetrics {
    pub fn insert(&mut self, name: &str, value: MetricValue) {
        self.values.insert(name.to_string(), value);
    }

    /// Missing names read as `Unknown`.
    pub fn get(&self, name: &str) -> MetricValue {
        self.values.get(name).copied().unwrap_or(MetricValue::Unknown)
    }

    pub fn count(&self, name: &str) -> Option<u64> {
        self.get(name).as_count()
    }

    pub fn percent(&self, name: &str) -> Option<f64> {
        self.get(name).as_percent()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &MetricValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_serializes_as_string() {
        let mut m = CanonicalMetrics::default();
        m.insert("total_functions", MetricValue::Count(5));
        m.insert("doc_coverage", MetricValue::Unknown);
        let v = serde_json::to_value(&m).unwrap();
        assert_eq!(v["total_functions"], 5);
        assert_eq!(v["doc_coverage"], "Unknown");
        assert_eq!(m.get("never_set"), MetricValue::Unknown);
        assert_eq!(MetricValue::Percent(90.0).to_string(), "90.0%");
    }
}
