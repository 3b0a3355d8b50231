//! Deduplication of free-text recommendations.
//!
//! Recommendations about the same subject and the same kind of problem are
//! often phrased differently by different tools. Each text is reduced to a
//! `(normalized_subject, issue_category)` key; texts sharing a key collapse
//! into the first one seen.

use regex::Regex;
use serde::Serialize;
use std::collections::HashSet;
use std::sync::OnceLock;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecommendationKey {
    pub subject: String,
    pub category: String,
}

enum Category {
    Fixed(&'static str),
    /// Category prefix followed by the first word of capture group 2.
    Prefixed(&'static str),
}

fn patterns() -> &'static [(Regex, Category)] {
    static PATTERNS: OnceLock<Vec<(Regex, Category)>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        let table: [(&str, Category); 4] = [
            (
                r"(?i)^update\s+(\S+?)\s+to\s+(?:use|import)\s+(?:the\s+)?(\S+)",
                Category::Prefixed("import"),
            ),
            (
                r"(?i)^fix\s+(?:\d+\s+)?issues?\s+in\s+([^\s:]+)",
                Category::Fixed("fix_issues"),
            ),
            (
                r"(?i)^(\S+?)\s+(?:has|uses|contains)\s+(?:\d+\s+)?hard-?coded\s+(\w+)",
                Category::Prefixed("hardcoded"),
            ),
            (
                r"(?i)^(?:add|create)\s+(?:an?\s+)?config(?:uration)?\s+(?:entry|section)\s+for\s+(\S+)",
                Category::Fixed("missing_config_section"),
            ),
        ];
        table
            .into_iter()
            .map(|(re, cat)| (Regex::new(re).expect("recommendation pattern is valid"), cat))
            .collect()
    })
}

fn subject_token() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"[A-Za-z_][\w./-]*\.py\b|\b[a-z][a-z0-9]*(?:_[a-z0-9]+)+\b")
            .expect("subject pattern is valid")
    })
}

/// Lowercase, drop path and `.py`, trim punctuation.
fn normalize_subject(raw: &str) -> String {
    let s = raw
        .trim()
        .trim_matches(|c: char| matches!(c, ':' | ',' | '.' | '`' | '\'' | '"'));
    let s = s.rsplit('/').next().unwrap_or(s);
    let s = s.strip_suffix(".py").unwrap_or(s);
    s.to_ascii_lowercase()
}

fn normalize_text(raw: &str) -> String {
    raw.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .trim_end_matches(|c: char| c == '.' || c == '!')
        .to_ascii_lowercase()
}

/// Map a recommendation to its dedup key.
pub fn recommendation_key(text: &str) -> RecommendationKey {
    let t = text.trim();
    for (re, cat) in patterns() {
        if let Some(caps) = re.captures(t) {
            let subject = caps.get(1).map(|m| normalize_subject(m.as_str())).unwrap_or_default();
            let category = match cat {
                Category::Fixed(c) => c.to_string(),
                Category::Prefixed(prefix) => {
                    let obj = caps
                        .get(2)
                        .map(|m| normalize_subject(m.as_str()))
                        .unwrap_or_default();
                    format!("{}:{}", prefix, obj)
                }
            };
            return RecommendationKey { subject, category };
        }
    }
    let subject = subject_token()
        .find(t)
        .map(|m| normalize_subject(m.as_str()))
        .unwrap_or_else(|| "general".to_string());
    RecommendationKey {
        subject,
        category: normalize_text(t),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Deduped {
    /// First text of each distinct key, in input order, up to the limit.
    pub shown: Vec<String>,
    pub distinct: usize,
    /// Distinct keys not listed in `shown`.
    pub remaining: usize,
    /// Inputs collapsed into an earlier key.
    pub duplicates: usize,
}

impl Deduped {
    /// `...and N more` when keys were left out.
    pub fn more_line(&self) -> Option<String> {
        (self.remaining > 0).then(|| format!("...and {} more", self.remaining))
    }
}

pub fn dedupe<S: AsRef<str>>(texts: &[S], limit: usize) -> Deduped {
    let mut seen: HashSet<RecommendationKey> = HashSet::new();
    let mut firsts: Vec<String> = Vec::new();
    for t in texts {
        let text = t.as_ref().trim();
        if text.is_empty() {
            continue;
        }
        if seen.insert(recommendation_key(text)) {
            firsts.push(text.to_string());
        }
    }
    let non_empty = texts.iter().filter(|t| !t.as_ref().trim().is_empty()).count();
    let distinct = firsts.len();
    let shown: Vec<String> = firsts.into_iter().take(limit).collect();
    Deduped {
        remaining: distinct - shown.len(),
        duplicates: non_empty - distinct,
        distinct,
        shown,
    }
}
