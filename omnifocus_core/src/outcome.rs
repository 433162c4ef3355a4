// src/outcome.rs
// Discriminated tool outcomes. Errors never cross the tool boundary as
// thrown errors; every primitive's result is serialized into one of the
// shapes below and wrapped in a CallToolResult.

use rmcp::model::{CallToolResult, Content};
use serde::Serialize;
use serde_json::{json, Map as JsonMap, Value as JsonValue};

use crate::error::{OmniFocusError, DISAMBIGUATION_CODE};

/// Per-item outcome inside an aggregate batch response.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchItemResult {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item_name: Option<String>,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matching_ids: Option<Vec<String>>,
}

impl BatchItemResult {
    pub fn ok(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            item_id: Some(id.into()),
            item_name: Some(name.into()),
            success: true,
            error: None,
            code: None,
            matching_ids: None,
        }
    }

    /// A failed item. Disambiguation is surfaced inline, never escalated
    /// to an aggregate failure.
    pub fn failed(
        id: Option<String>,
        name: Option<String>,
        err: &OmniFocusError,
    ) -> Self {
        let (code, matching_ids) = match err {
            OmniFocusError::Disambiguation { matching_ids, .. } => {
                (Some(DISAMBIGUATION_CODE), Some(matching_ids.clone()))
            }
            _ => (None, None),
        };
        Self {
            item_id: id,
            item_name: name,
            success: false,
            error: Some(err.to_string()),
            code,
            matching_ids,
        }
    }
}

/// Aggregate batch response. `success` is true when at least one item
/// succeeded ("the batch did something"); callers inspect `results` for
/// per-item status.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchOutcome {
    pub success: bool,
    pub results: Vec<BatchItemResult>,
}

impl BatchOutcome {
    pub fn from_results(results: Vec<BatchItemResult>) -> Self {
        let success = results.iter().any(|r| r.success);
        Self { success, results }
    }
}

/// Serialize an error into the wire error shape. Disambiguation carries
/// the retry-protocol fields; everything else is `{success, error}`.
pub fn error_payload(err: &OmniFocusError) -> JsonValue {
    match err {
        OmniFocusError::Disambiguation { matching_ids, .. } => json!({
            "success": false,
            "error": err.to_string(),
            "code": DISAMBIGUATION_CODE,
            "matchingIds": matching_ids,
        }),
        _ => json!({
            "success": false,
            "error": err.to_string(),
        }),
    }
}

fn to_object(value: JsonValue) -> JsonMap<String, JsonValue> {
    match value {
        JsonValue::Object(m) => m,
        other => {
            let mut m = JsonMap::new();
            m.insert("data".to_string(), other);
            m
        }
    }
}

/// Build a successful CallToolResult carrying both structured JSON and a
/// readable text rendering of the same payload.
pub fn success_result<T: Serialize>(data: &T) -> Result<CallToolResult, OmniFocusError> {
    let value = serde_json::to_value(data)?;
    let text = serde_json::to_string_pretty(&value).unwrap_or_default();
    Ok(CallToolResult {
        content: vec![Content::text(text)],
        structured_content: Some(JsonValue::Object(to_object(value))),
        is_error: Some(false),
        meta: None,
    })
}

/// Build a failed CallToolResult from a domain error. The transport
/// envelope carries `isError: true`; the structured payload is the
/// StandardError / DisambiguationError shape.
pub fn failure_result(err: &OmniFocusError) -> CallToolResult {
    let payload = error_payload(err);
    let text = payload
        .get("error")
        .and_then(|v| v.as_str())
        .map(|s| format!("Error: {}", s))
        .unwrap_or_else(|| "Error".to_string());
    CallToolResult {
        content: vec![Content::text(text)],
        structured_content: Some(payload),
        is_error: Some(true),
        meta: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disambiguation_payload_carries_all_ids() {
        let err = OmniFocusError::Disambiguation {
            entity: "Project",
            name: "Home".to_string(),
            matching_ids: vec!["p1".into(), "p2".into()],
        };
        let payload = error_payload(&err);
        assert_eq!(payload["success"], json!(false));
        assert_eq!(payload["code"], json!("DISAMBIGUATION_REQUIRED"));
        assert_eq!(payload["matchingIds"], json!(["p1", "p2"]));
    }

    #[test]
    fn standard_error_payload_has_no_code() {
        let err = OmniFocusError::NotFound {
            entity: "Tag",
            identifier: "waiting".to_string(),
        };
        let payload = error_payload(&err);
        assert_eq!(payload["success"], json!(false));
        assert!(payload.get("code").is_none());
        assert!(payload.get("matchingIds").is_none());
    }

    #[test]
    fn batch_outcome_any_success_wins() {
        let results = vec![
            BatchItemResult::ok("t1", "one"),
            BatchItemResult::failed(
                None,
                Some("two".into()),
                &OmniFocusError::NotFound {
                    entity: "Task",
                    identifier: "two".into(),
                },
            ),
        ];
        let agg = BatchOutcome::from_results(results);
        assert!(agg.success);
        assert_eq!(agg.results.len(), 2);

        let all_failed = BatchOutcome::from_results(vec![BatchItemResult::failed(
            None,
            None,
            &OmniFocusError::External("boom".into()),
        )]);
        assert!(!all_failed.success);
    }
}
