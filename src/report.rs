//! Structured report contract — JSON answer of the structured final reduce.

use serde::{Deserialize, Serialize};

use crate::{RcaError, RcaResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionItem {
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub assignee: Option<String>,
    pub priority: String,
    #[serde(alias = "type")]
    pub category: String,
    pub confidence: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuredReport {
    pub summary: String,
    pub action_items: Vec<ActionItem>,
    pub categories: Vec<String>,
    pub confidence: f64,
}

impl StructuredReport {
    /// Fallback when the structured final call fails: plain summary text, nothing extracted.
    pub fn degraded(summary: String) -> Self {
        Self {
            summary,
            action_items: Vec::new(),
            categories: Vec::new(),
            confidence: 0.0,
        }
    }

    pub fn to_json_pretty(&self) -> RcaResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Parse the model's answer and drop action items below `min_confidence`.
///
/// The JSON object is taken from the first `{` to the last `}`, which tolerates
/// prose or code fences around it.
pub fn parse_structured(response: &str, min_confidence: f64) -> RcaResult<StructuredReport> {
    let json_str = match (response.find('{'), response.rfind('}')) {
        (Some(start), Some(end)) if start < end => &response[start..=end],
        _ => return Err(RcaError::Parse("no JSON object in response".into())),
    };

    let mut report: StructuredReport = serde_json::from_str(json_str)
        .map_err(|e| RcaError::Parse(format!("Failed to parse structured report: {}", e)))?;

    let before = report.action_items.len();
    report.action_items.retain(|item| item.confidence >= min_confidence);
    if report.action_items.len() < before {
        tracing::info!(
            dropped = before - report.action_items.len(),
            kept = report.action_items.len(),
            min_confidence,
            "Low-confidence action items filtered"
        );
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ANSWER: &str = r#"Here is the report:
```json
{
  "summary": "Connection pool exhausted after deploy",
  "action_items": [
    {"title": "Raise pool size", "description": "Set to 50", "assignee": "alice", "priority": "high", "category": "dev", "confidence": 0.9},
    {"title": "Load test", "description": "Before release", "priority": "medium", "type": "qa", "confidence": 0.6},
    {"title": "Maybe DNS", "description": "Unclear", "priority": "low", "category": "ops", "confidence": 0.2}
  ],
  "categories": ["database", "deploy"],
  "confidence": 0.8
}
```"#;

    #[test]
    fn test_filters_by_confidence() {
        let report = parse_structured(ANSWER, 0.5).unwrap();
        assert_eq!(report.action_items.len(), 2);
        assert_eq!(report.action_items[0].assignee.as_deref(), Some("alice"));
        assert_eq!(report.categories, vec!["database", "deploy"]);
    }

    #[test]
    fn test_type_is_alias_for_category() {
        let report = parse_structured(ANSWER, 0.0).unwrap();
        assert_eq!(report.action_items[1].category, "qa");
        assert_eq!(report.action_items.len(), 3);
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let report = parse_structured(ANSWER, 0.6).unwrap();
        assert_eq!(report.action_items.len(), 2);
    }

    #[test]
    fn test_schema_mismatch_is_parse_error() {
        let err = parse_structured(r#"{"summary": "x"}"#, 0.5).unwrap_err();
        assert!(matches!(err, RcaError::Parse(_)));
        assert!(matches!(parse_structured("no json here", 0.5), Err(RcaError::Parse(_))));
    }

    #[test]
    fn test_degraded_report_serializes() {
        let report = StructuredReport::degraded("alpha\n\nbeta".into());
        let json = report.to_json_pretty().unwrap();
        let back: StructuredReport = serde_json::from_str(&json).unwrap();
        assert_eq!(back, report);
        assert!(json.contains("\"action_items\": []"));
    }
}
