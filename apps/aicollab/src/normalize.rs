//! Normalization of raw tool payloads into `ResultRecord`.
//!
//! Payloads come in exactly two shapes: the standard one with a top-level
//! `summary`, and a legacy one nesting the standard payload under `data`.
//! The shape is classified once here so nothing downstream sniffs keys.

use crate::error::NormalizeError;
use crate::models::{json_as_u64, ResultRecord, Summary, ToolStatus};
use serde_json::{Map, Value as Json};

/// Shape of a raw payload, resolved before validation.
pub enum Payload<'a> {
    /// Legacy files: the real payload sits under `data`.
    Wrapped { data: &'a Json },
    Direct(&'a Map<String, Json>),
}

impl<'a> Payload<'a> {
    pub fn classify(tool: &str, raw: &'a Json) -> Result<Payload<'a>, NormalizeError> {
        let obj = as_object(tool, raw)?;
        if !obj.contains_key("summary") {
            if let Some(data) = obj.get("data") {
                return Ok(Payload::Wrapped { data });
            }
        }
        Ok(Payload::Direct(obj))
    }

    /// The object that must carry `summary`. Unwraps a single level only.
    fn body(&self, tool: &str) -> Result<&'a Map<String, Json>, NormalizeError> {
        match self {
            Payload::Wrapped { data } => as_object(tool, data),
            Payload::Direct(obj) => Ok(obj),
        }
    }
}

fn kind_of(v: &Json) -> &'static str {
    match v {
        Json::Null => "null",
        Json::Bool(_) => "boolean",
        Json::Number(_) => "number",
        Json::String(_) => "string",
        Json::Array(_) => "array",
        Json::Object(_) => "object",
    }
}

fn as_object<'a>(tool: &str, v: &'a Json) -> Result<&'a Map<String, Json>, NormalizeError> {
    v.as_object().ok_or_else(|| NormalizeError::NotAnObject {
        tool: tool.to_string(),
        kind: kind_of(v),
    })
}

fn required_count(
    tool: &str,
    summary: &Map<String, Json>,
    field: &'static str,
) -> Result<u64, NormalizeError> {
    let v = summary.get(field).ok_or_else(|| NormalizeError::MissingField {
        tool: tool.to_string(),
        field,
    })?;
    json_as_u64(v).ok_or_else(|| NormalizeError::InvalidField {
        tool: tool.to_string(),
        field,
        value: v.to_string(),
    })
}

/// Validate `payload` and build a fresh `ResultRecord`.
///
/// Fails hard when the payload is not an object or when `summary` lacks a
/// valid `total_issues` / `files_affected`. `details` defaults to `{}`.
pub fn normalize(tool_name: &str, payload: &Json) -> Result<ResultRecord, NormalizeError> {
    let body = Payload::classify(tool_name, payload)?.body(tool_name)?;
    let summary = body
        .get("summary")
        .and_then(Json::as_object)
        .ok_or_else(|| NormalizeError::MissingSummary {
            tool: tool_name.to_string(),
        })?;
    let total_issues = required_count(tool_name, summary, "total_issues")?;
    let files_affected = required_count(tool_name, summary, "files_affected")?;
    let status = summary
        .get("status")
        .and_then(Json::as_str)
        .map(|s| ToolStatus::from(s.to_string()));
    // A non-string status stays in `extra` verbatim.
    let extra: Map<String, Json> = summary
        .iter()
        .filter(|(k, v)| match k.as_str() {
            "total_issues" | "files_affected" => false,
            "status" => !v.is_string(),
            _ => true,
        })
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();
    let details = body
        .get("details")
        .and_then(Json::as_object)
        .cloned()
        .unwrap_or_default();
    Ok(ResultRecord {
        summary: Summary {
            total_issues,
            files_affected,
            status,
            extra,
        },
        details,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_rejects_non_objects() {
        for bad in [json!([1, 2]), json!(3), json!(null), json!("x")] {
            let err = normalize("x", &bad).unwrap_err();
            assert!(matches!(err, NormalizeError::NotAnObject { .. }));
        }
    }

    #[test]
    fn test_missing_summary_fails() {
        let err = normalize("x", &json!({"foo": 1})).unwrap_err();
        assert_eq!(err, NormalizeError::MissingSummary { tool: "x".into() });
        assert!(err.to_string().contains("'x'"));
    }

    #[test]
    fn test_missing_files_affected_fails() {
        let err = normalize("x", &json!({"summary": {"total_issues": 1}})).unwrap_err();
        assert_eq!(
            err,
            NormalizeError::MissingField {
                tool: "x".into(),
                field: "files_affected"
            }
        );
    }

    #[test]
    fn test_negative_count_is_invalid() {
        let err = normalize("x", &json!({"summary": {"total_issues": -1, "files_affected": 0}}))
            .unwrap_err();
        assert!(matches!(err, NormalizeError::InvalidField { field: "total_issues", .. }));
    }

    #[test]
    fn test_valid_payload_roundtrips() {
        let payload = json!({"summary": {"total_issues": 1, "files_affected": 2}});
        let rec = normalize("x", &payload).unwrap();
        assert_eq!(rec.summary.total_issues, 1);
        assert_eq!(rec.summary.files_affected, 2);
        assert!(rec.details.is_empty());
        assert_eq!(serde_json::to_value(&rec).unwrap()["summary"], payload["summary"]);
    }

    #[test]
    fn test_extra_summary_keys_roundtrip() {
        let payload = json!({
            "summary": {"total_issues": 1, "files_affected": 2, "coverage": 80, "status": "PASS"},
            "details": {"k": [1, 2]}
        });
        let rec = normalize("x", &payload).unwrap();
        assert_eq!(rec.summary.extra.get("coverage"), Some(&json!(80)));
        assert_eq!(serde_json::to_value(&rec).unwrap(), payload);

        let odd_status = json!({"summary": {"total_issues": 0, "files_affected": 0, "status": 3}});
        let rec = normalize("x", &odd_status).unwrap();
        assert_eq!(rec.summary.status, None);
        assert_eq!(serde_json::to_value(&rec).unwrap()["summary"], odd_status["summary"]);
    }

    #[test]
    fn test_coercible_counts_accepted() {
        let rec = normalize(
            "x",
            &json!({"summary": {"total_issues": "4", "files_affected": 2.0, "status": "POOR"}}),
        )
        .unwrap();
        assert_eq!(rec.summary.total_issues, 4);
        assert_eq!(rec.summary.files_affected, 2);
        assert_eq!(rec.summary.status, Some(ToolStatus::Poor));
    }

    #[test]
    fn test_wrapped_payload_unwraps_one_level() {
        let legacy = json!({
            "generated_by": "old",
            "data": {"summary": {"total_issues": 3, "files_affected": 1}, "details": {"k": 1}}
        });
        let rec = normalize("legacy", &legacy).unwrap();
        assert_eq!(rec.summary.total_issues, 3);
        assert_eq!(rec.detail_u64("k"), Some(1));

        let doubly = json!({"data": {"data": {"summary": {"total_issues": 0, "files_affected": 0}}}});
        assert!(normalize("legacy", &doubly).is_err());
    }

    #[test]
    fn test_input_not_mutated() {
        let payload = json!({"summary": {"total_issues": 0, "files_affected": 0}, "extra": true});
        let before = payload.clone();
        let _ = normalize("x", &payload).unwrap();
        assert_eq!(payload, before);
    }
}
