// src/error.rs
use serde_json::json;

/// Wire code for the disambiguation retry protocol. A client that sees this
/// code is expected to pick an id from `matchingIds` and retry the same call.
pub const DISAMBIGUATION_CODE: &str = "DISAMBIGUATION_REQUIRED";

/// Closed error taxonomy carried through every primitive's return value.
/// Callers match on variants, never on message text.
#[derive(Debug, thiserror::Error)]
pub enum OmniFocusError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serde JSON error: {0}")]
    SerdeJson(#[from] serde_json::Error),

    /// Malformed or conflicting input, caught before any lookup is attempted.
    #[error("{0}")]
    Validation(String),

    /// The resolver found zero matches for an id or name lookup.
    #[error("{entity} '{identifier}' not found")]
    NotFound {
        entity: &'static str,
        identifier: String,
    },

    /// A name lookup matched two or more entities. `matching_ids` always
    /// holds every match, never a truncated list; by construction it has
    /// at least two entries.
    #[error("Ambiguous {} name '{name}': found {} matches", entity.to_lowercase(), matching_ids.len())]
    Disambiguation {
        entity: &'static str,
        name: String,
        matching_ids: Vec<String>,
    },

    /// The script executor reported a failure (OmniFocus not running,
    /// scripting permission denied, an exception inside the generated
    /// script). Surfaced verbatim; never retried here.
    #[error("{0}")]
    External(String),

    #[error("Resource not found")]
    ResourceNotFound,

    #[error("Tool not found")]
    ToolNotFound,

    #[error("Invalid params: {0}")]
    InvalidParams(String),

    #[error("Method not found")]
    MethodNotFound,

    #[error("Parse error")]
    ParseError,

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl OmniFocusError {
    pub fn code_str(&self) -> &'static str {
        match self {
            OmniFocusError::Validation(_) => "validation_error",
            OmniFocusError::NotFound { .. } => "not_found",
            OmniFocusError::Disambiguation { .. } => "disambiguation_required",
            OmniFocusError::External(_) => "external_error",
            OmniFocusError::ResourceNotFound => "not_found",
            OmniFocusError::ToolNotFound => "tool_not_found",
            OmniFocusError::InvalidParams(_) => "invalid_params",
            OmniFocusError::MethodNotFound => "method_not_found",
            OmniFocusError::ParseError => "parse_error",
            _ => "internal_error",
        }
    }

    pub fn to_jsonrpc_error(&self) -> serde_json::Value {
        let (code, message) = match self {
            OmniFocusError::ResourceNotFound => (-32602, "Resource not found".to_string()),
            OmniFocusError::ToolNotFound => (-32602, "Tool not found".to_string()),
            OmniFocusError::InvalidParams(msg) => (-32602, msg.to_string()),
            OmniFocusError::MethodNotFound => (-32601, "Method not found".to_string()),
            OmniFocusError::ParseError => (-32700, "Parse error".to_string()),
            OmniFocusError::InternalError(msg) => (-32603, msg.to_string()),
            err => (-32603, err.to_string()),
        };

        json!({
            "code": code,
            "message": message,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_message_names_entity_and_identifier() {
        let err = OmniFocusError::NotFound {
            entity: "Project",
            identifier: "Renovation".to_string(),
        };
        assert_eq!(err.to_string(), "Project 'Renovation' not found");
        assert_eq!(err.code_str(), "not_found");
    }

    #[test]
    fn disambiguation_message_reports_count() {
        let err = OmniFocusError::Disambiguation {
            entity: "Task",
            name: "Call mom".to_string(),
            matching_ids: vec!["a1".into(), "b2".into(), "c3".into()],
        };
        assert_eq!(err.to_string(), "Ambiguous task name 'Call mom': found 3 matches");
    }
}
